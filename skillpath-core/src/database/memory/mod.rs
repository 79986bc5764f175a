//! In-process adapters.
//!
//! Enrollment and progress repositories share one table set behind a single
//! lock so that enrollment creation and its progress rows land atomically,
//! and every conditional write is evaluated under that lock.

mod catalog;
mod enrollments;
mod progress;

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::domain::{CourseId, Enrollment, LearnerId, Progress, VideoId};

pub use catalog::InMemoryCatalog;
pub use enrollments::InMemoryEnrollmentRepository;
pub use progress::InMemoryProgressRepository;

#[derive(Debug, Default)]
pub(crate) struct TrackingTables {
    pub(crate) enrollments: HashMap<(LearnerId, CourseId), Enrollment>,
    pub(crate) progress: HashMap<(LearnerId, VideoId), Progress>,
}

/// Owner of the shared tables; hands out repository handles.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrackingStore {
    tables: Arc<RwLock<TrackingTables>>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enrollments(&self) -> InMemoryEnrollmentRepository {
        InMemoryEnrollmentRepository::new(self.tables.clone())
    }

    pub fn progress(&self) -> InMemoryProgressRepository {
        InMemoryProgressRepository::new(self.tables.clone())
    }

    pub async fn enrollment_count(&self) -> usize {
        self.tables.read().await.enrollments.len()
    }

    pub async fn progress_count(&self) -> usize {
        self.tables.read().await.progress.len()
    }
}
