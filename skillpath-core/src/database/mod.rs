pub mod memory;
pub mod ports;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::{
    InMemoryCatalog, InMemoryEnrollmentRepository, InMemoryProgressRepository,
    InMemoryTrackingStore,
};
#[cfg(feature = "database")]
pub use postgres::{
    PoolSettings, PostgresCatalogReader, PostgresDatabase,
    PostgresEnrollmentRepository, PostgresProgressRepository,
};
