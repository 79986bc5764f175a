use std::fmt;
use std::sync::Arc;

use crate::database::memory::{InMemoryCatalog, InMemoryTrackingStore};
use crate::database::ports::{
    catalog::CatalogReader, enrollments::EnrollmentRepository,
    progress::ProgressRepository,
};
#[cfg(feature = "database")]
use crate::database::postgres::{
    PostgresCatalogReader, PostgresDatabase, PostgresEnrollmentRepository,
    PostgresProgressRepository,
};

/// Aggregates the repository ports used by the tracking services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub catalog: Arc<dyn CatalogReader>,
    backend: &'static str,
}

const BACKEND_MEMORY: &str = "memory";
#[cfg(feature = "database")]
const BACKEND_POSTGRES: &str = "postgres";
const BACKEND_CUSTOM: &str = "custom";

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl AppUnitOfWork {
    /// Wires the in-process adapters over a shared store and catalog.
    pub fn in_memory(
        store: &InMemoryTrackingStore,
        catalog: InMemoryCatalog,
    ) -> Self {
        Self {
            enrollments: Arc::new(store.enrollments()),
            progress: Arc::new(store.progress()),
            catalog: Arc::new(catalog),
            backend: BACKEND_MEMORY,
        }
    }

    /// Storage family the ports were wired from: `memory`, `postgres`, or
    /// `custom` when assembled port by port through the builder.
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

#[derive(Default)]
pub struct AppUnitOfWorkBuilder {
    enrollments: Option<Arc<dyn EnrollmentRepository>>,
    progress: Option<Arc<dyn ProgressRepository>>,
    catalog: Option<Arc<dyn CatalogReader>>,
    backend: Option<&'static str>,
}

impl fmt::Debug for AppUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWorkBuilder")
            .field("enrollments", &self.enrollments.is_some())
            .field("progress", &self.progress.is_some())
            .field("catalog", &self.catalog.is_some())
            .field("backend", &self.backend)
            .finish()
    }
}

impl AppUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enrollments(
        mut self,
        repo: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        self.enrollments = Some(repo);
        self.backend = None;
        self
    }

    pub fn with_progress(mut self, repo: Arc<dyn ProgressRepository>) -> Self {
        self.progress = Some(repo);
        self.backend = None;
        self
    }

    pub fn with_catalog(mut self, reader: Arc<dyn CatalogReader>) -> Self {
        self.catalog = Some(reader);
        self.backend = None;
        self
    }

    pub fn build(self) -> Result<AppUnitOfWork, String> {
        Ok(AppUnitOfWork {
            enrollments: self
                .enrollments
                .ok_or_else(|| "missing EnrollmentRepository".to_string())?,
            progress: self
                .progress
                .ok_or_else(|| "missing ProgressRepository".to_string())?,
            catalog: self
                .catalog
                .ok_or_else(|| "missing CatalogReader".to_string())?,
            backend: self.backend.unwrap_or(BACKEND_CUSTOM),
        })
    }
}

#[cfg(feature = "database")]
impl AppUnitOfWork {
    /// Composes the Postgres-backed adapters into a unit of work.
    pub fn from_postgres(db: &PostgresDatabase) -> Result<Self, String> {
        AppUnitOfWorkBuilder::new().with_postgres(db).build()
    }
}

#[cfg(feature = "database")]
impl AppUnitOfWorkBuilder {
    pub fn with_postgres(mut self, db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();

        let enrollments: Arc<dyn EnrollmentRepository> =
            Arc::new(PostgresEnrollmentRepository::new(pool.clone()));
        self.enrollments = Some(enrollments);

        let progress: Arc<dyn ProgressRepository> =
            Arc::new(PostgresProgressRepository::new(pool.clone()));
        self.progress = Some(progress);

        let catalog: Arc<dyn CatalogReader> =
            Arc::new(PostgresCatalogReader::new(pool));
        self.catalog = Some(catalog);

        self.backend = Some(BACKEND_POSTGRES);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reports_missing_port() {
        let store = InMemoryTrackingStore::new();
        let err = AppUnitOfWorkBuilder::new()
            .with_enrollments(Arc::new(store.enrollments()))
            .with_progress(Arc::new(store.progress()))
            .build()
            .unwrap_err();
        assert_eq!(err, "missing CatalogReader");
    }

    #[test]
    fn debug_reports_backend() {
        let store = InMemoryTrackingStore::new();
        let uow = AppUnitOfWork::in_memory(&store, InMemoryCatalog::new());
        assert_eq!(uow.backend(), "memory");
        assert_eq!(
            format!("{uow:?}"),
            r#"AppUnitOfWork { backend: "memory", .. }"#
        );
    }

    #[test]
    fn hand_wired_ports_are_reported_as_custom() {
        let store = InMemoryTrackingStore::new();
        let uow = AppUnitOfWorkBuilder::new()
            .with_enrollments(Arc::new(store.enrollments()))
            .with_progress(Arc::new(store.progress()))
            .with_catalog(Arc::new(InMemoryCatalog::new()))
            .build()
            .unwrap();
        assert_eq!(uow.backend(), "custom");
        assert!(format!("{uow:?}").contains(r#"backend: "custom""#));
    }
}
