//! # Skillpath Core
//!
//! Enrollment and progress tracking for the Skillpath learning platform.
//!
//! The crate enrolls learners in courses, records per-video watch progress
//! reported by an untrusted playback surface, and derives course completion
//! from the stored rows. Completion is a one-way transition written at most
//! once per enrollment.
//!
//! ## Feature Flags
//!
//! - `database`: PostgreSQL adapters and the embedded [`MIGRATOR`]
//! - `postgres-tests`: adapter integration tests against a live server
//!
//! ## Layout
//!
//! - [`domain`]: identifiers, watch policy, enrollment and progress records
//! - [`database`]: repository ports plus Postgres and in-memory adapters
//! - [`tracking`]: enrollment, progress update and completion services
//! - [`application`]: the unit of work wiring ports into services
//! - [`api`]: route constants and transport types

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod application;
pub mod database;
pub mod domain;
pub mod error;
pub mod tracking;

pub use application::AppUnitOfWork;
pub use error::{Result, TrackingError, ValidationError};
pub use tracking::TrackingEngine;

/// Embedded schema migrations for the tracking and catalog tables.
#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
