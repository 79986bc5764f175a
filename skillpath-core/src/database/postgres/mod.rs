//! PostgreSQL adapters for the repository ports.

mod catalog;
mod database;
mod enrollments;
mod errors;
mod progress;

pub use catalog::PostgresCatalogReader;
pub use database::{PoolSettings, PostgresDatabase};
pub use enrollments::PostgresEnrollmentRepository;
pub use progress::PostgresProgressRepository;
