//! HTTP surface for the Skillpath tracking engine.
//!
//! The binary in `main.rs` wires configuration, the database pool and the
//! router; everything reachable from tests lives here.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
