use std::{fmt, sync::Arc};

use chrono::Utc;
use tracing::{debug, info};

use super::catalog_failure;
use crate::database::ports::{
    catalog::CatalogReader, enrollments::EnrollmentRepository,
};
use crate::domain::{
    CourseId, EnrollOutcome, Enrollment, EnrollmentFilter, LearnerId, VideoId,
};
use crate::error::Result;

/// Creates enrollments and seeds their per-video progress rows.
#[derive(Clone)]
pub struct EnrollmentService {
    enrollments: Arc<dyn EnrollmentRepository>,
    catalog: Arc<dyn CatalogReader>,
}

impl fmt::Debug for EnrollmentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentService").finish_non_exhaustive()
    }
}

impl EnrollmentService {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Self {
        Self {
            enrollments,
            catalog,
        }
    }

    /// Enrolls the learner, or returns the existing enrollment untouched.
    ///
    /// The catalog is read before anything is written, so a failed lookup
    /// leaves no partial state and the call can simply be retried.
    pub async fn enroll(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<EnrollOutcome> {
        if let Some(enrollment) =
            self.enrollments.find(learner_id, course_id).await?
        {
            debug!(%learner_id, %course_id, "already enrolled");
            return Ok(EnrollOutcome::AlreadyEnrolled { enrollment });
        }

        let videos = self
            .catalog
            .course_videos(course_id)
            .await
            .map_err(catalog_failure)?;
        let video_ids: Vec<VideoId> =
            videos.iter().map(|video| video.video_id).collect();

        let outcome = self
            .enrollments
            .create_with_progress(learner_id, course_id, &video_ids, Utc::now())
            .await?;

        match &outcome {
            EnrollOutcome::Enrolled {
                enrollment,
                progress_initialized,
            } => info!(
                %learner_id,
                %course_id,
                enrollment_id = %enrollment.id,
                progress_initialized,
                "learner enrolled"
            ),
            EnrollOutcome::AlreadyEnrolled { enrollment } => debug!(
                %learner_id,
                %course_id,
                enrollment_id = %enrollment.id,
                "concurrent enroll resolved to existing row"
            ),
        }

        Ok(outcome)
    }

    pub async fn enrollments(
        &self,
        learner_id: LearnerId,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>> {
        self.enrollments.list_for_learner(learner_id, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{InMemoryCatalog, InMemoryTrackingStore};
    use crate::database::ports::catalog::MockCatalogReader;
    use crate::error::TrackingError;

    fn service(
        store: &InMemoryTrackingStore,
        catalog: InMemoryCatalog,
    ) -> EnrollmentService {
        EnrollmentService::new(Arc::new(store.enrollments()), Arc::new(catalog))
    }

    #[tokio::test]
    async fn enroll_seeds_progress_for_every_video() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let course = catalog.add_course("Ownership").await;
        let first = catalog.add_module(course, 0).await.unwrap();
        let second = catalog.add_module(course, 1).await.unwrap();
        catalog.add_video(first, 0).await.unwrap();
        catalog.add_video(first, 1).await.unwrap();
        catalog.add_video(second, 0).await.unwrap();

        let learner = LearnerId::new();
        let outcome = service(&store, catalog)
            .enroll(learner, course)
            .await
            .unwrap();

        match outcome {
            EnrollOutcome::Enrolled {
                enrollment,
                progress_initialized,
            } => {
                assert_eq!(progress_initialized, 3);
                assert_eq!(enrollment.completed_at, None);
            }
            other => panic!("expected a new enrollment, got {other:?}"),
        }
        assert_eq!(store.progress_count().await, 3);
    }

    #[tokio::test]
    async fn second_enroll_returns_same_identifier() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let (course, _, _) =
            catalog.add_single_module_course("Traits", 2).await.unwrap();
        let service = service(&store, catalog);
        let learner = LearnerId::new();

        let first = service.enroll(learner, course).await.unwrap();
        let second = service.enroll(learner, course).await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.enrollment_id(), second.enrollment_id());
        assert_eq!(store.enrollment_count().await, 1);
        assert_eq!(store.progress_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let store = InMemoryTrackingStore::new();
        let err = service(&store, InMemoryCatalog::new())
            .enroll(LearnerId::new(), CourseId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackingError::NotFound(_)));
        assert_eq!(store.enrollment_count().await, 0);
    }

    #[tokio::test]
    async fn catalog_outage_is_retryable_and_writes_nothing() {
        let store = InMemoryTrackingStore::new();
        let mut catalog = MockCatalogReader::new();
        catalog
            .expect_course_videos()
            .times(1)
            .returning(|_| Err(TrackingError::Internal("connection reset".into())));

        let service =
            EnrollmentService::new(Arc::new(store.enrollments()), Arc::new(catalog));
        let err = service
            .enroll(LearnerId::new(), CourseId::new())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(store.enrollment_count().await, 0);
        assert_eq!(store.progress_count().await, 0);
    }

    #[tokio::test]
    async fn listing_filters_by_status() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let (done, _, _) =
            catalog.add_single_module_course("Done", 1).await.unwrap();
        let (open, _, _) =
            catalog.add_single_module_course("Open", 1).await.unwrap();
        let service = service(&store, catalog);
        let learner = LearnerId::new();

        service.enroll(learner, done).await.unwrap();
        service.enroll(learner, open).await.unwrap();
        store
            .enrollments()
            .mark_completed(learner, done, Utc::now())
            .await
            .unwrap();

        let completed = service
            .enrollments(learner, EnrollmentFilter::Completed)
            .await
            .unwrap();
        let in_progress = service
            .enrollments(learner, EnrollmentFilter::InProgress)
            .await
            .unwrap();
        let all = service
            .enrollments(learner, EnrollmentFilter::All)
            .await
            .unwrap();

        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].course_id, done);
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].course_id, open);
        assert_eq!(all.len(), 2);
    }
}
