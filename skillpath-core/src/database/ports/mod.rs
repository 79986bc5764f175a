//! Repository ports (interfaces) for the tracking engine.
//!
//! Services depend only on these traits. Implementations live in
//! `database::postgres` (durable) and `database::memory` (tests, local runs).

pub mod catalog;
pub mod enrollments;
pub mod progress;
