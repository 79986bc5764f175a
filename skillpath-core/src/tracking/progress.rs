use std::{fmt, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::{CompletionEvaluator, CourseEvaluation, catalog_failure};
use crate::database::ports::{
    catalog::CatalogReader, progress::ProgressRepository,
};
use crate::domain::{
    ConsistencyWarning, CourseId, LearnerId, Progress, VideoId,
    WatchPercentage, WatchPolicy,
};
use crate::error::{Result, TrackingError};

/// State after a playback report, with the evaluation it triggered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub progress: Progress,
    /// Owning course, when the video still resolves to one.
    pub course_id: Option<CourseId>,
    /// Absent when the video is orphaned.
    pub evaluation: Option<CourseEvaluation>,
    /// Conditions observed while recording the sample. Evaluation warnings
    /// stay on `evaluation`.
    pub warnings: Vec<ConsistencyWarning>,
}

/// Applies playback samples and runs completion evaluation before
/// returning.
#[derive(Clone)]
pub struct ProgressUpdateService {
    progress: Arc<dyn ProgressRepository>,
    catalog: Arc<dyn CatalogReader>,
    evaluator: CompletionEvaluator,
    policy: WatchPolicy,
}

impl fmt::Debug for ProgressUpdateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressUpdateService")
            .field("evaluator", &self.evaluator)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ProgressUpdateService {
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        catalog: Arc<dyn CatalogReader>,
        evaluator: CompletionEvaluator,
        policy: WatchPolicy,
    ) -> Self {
        Self {
            progress,
            catalog,
            evaluator,
            policy,
        }
    }

    pub fn policy(&self) -> WatchPolicy {
        self.policy
    }

    /// Records a raw sample from the playback surface.
    ///
    /// Rejects non-finite or out-of-range values before touching the store.
    pub async fn report_progress(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
        watch_percentage: f64,
    ) -> Result<ProgressReport> {
        let sample = WatchPercentage::new(watch_percentage)?;
        self.record(learner_id, video_id, sample).await
    }

    /// Terminal signal from the playback surface; same as reporting 100.
    pub async fn report_video_ended(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
    ) -> Result<ProgressReport> {
        self.record(learner_id, video_id, WatchPercentage::COMPLETE)
            .await
    }

    async fn record(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
        sample: WatchPercentage,
    ) -> Result<ProgressReport> {
        let reached_threshold = self.policy.is_watched(sample);
        let recorded = self
            .progress
            .record_sample(
                learner_id,
                video_id,
                sample,
                reached_threshold,
                Utc::now(),
            )
            .await?;

        debug!(
            %learner_id,
            %video_id,
            sample = sample.value(),
            watched = recorded.progress.watched,
            "recorded watch sample"
        );

        let mut warnings = Vec::new();
        if recorded.created {
            warn!(
                %learner_id,
                %video_id,
                "progress row created outside enrollment"
            );
            warnings.push(ConsistencyWarning::ProgressCreatedOutsideEnrollment {
                video_id,
            });
        }

        let course_id = self
            .catalog
            .course_for_video(video_id)
            .await
            .map_err(catalog_failure)?;

        let Some(course_id) = course_id else {
            warn!(%learner_id, %video_id, "video resolves to no course; skipping completion");
            warnings.push(ConsistencyWarning::OrphanedVideo { video_id });
            return Ok(ProgressReport {
                progress: recorded.progress,
                course_id: None,
                evaluation: None,
                warnings,
            });
        };

        let evaluation = match self.evaluator.evaluate(learner_id, course_id).await
        {
            Ok(evaluation) => Some(evaluation),
            // Course removed between the two catalog reads.
            Err(TrackingError::NotFound(_)) => {
                warn!(%learner_id, %video_id, %course_id, "course vanished; skipping completion");
                warnings.push(ConsistencyWarning::OrphanedVideo { video_id });
                None
            }
            Err(err) => return Err(err),
        };

        Ok(ProgressReport {
            progress: recorded.progress,
            course_id: Some(course_id),
            evaluation,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{InMemoryCatalog, InMemoryTrackingStore};
    use crate::database::ports::catalog::MockCatalogReader;
    use crate::database::ports::enrollments::EnrollmentRepository;
    use crate::error::ValidationError;

    fn service_over(
        store: &InMemoryTrackingStore,
        catalog: Arc<dyn CatalogReader>,
    ) -> ProgressUpdateService {
        let evaluator = CompletionEvaluator::new(
            Arc::new(store.enrollments()),
            Arc::new(store.progress()),
            catalog.clone(),
        );
        ProgressUpdateService::new(
            Arc::new(store.progress()),
            catalog,
            evaluator,
            WatchPolicy::default(),
        )
    }

    #[test]
    fn debug_shows_policy_and_hides_ports() {
        let store = InMemoryTrackingStore::new();
        let service = service_over(&store, Arc::new(InMemoryCatalog::new()));
        let rendered = format!("{service:?}");
        assert!(rendered.starts_with("ProgressUpdateService {"));
        assert!(rendered.contains("CompletionEvaluator { .. }"));
        assert!(rendered.contains("WatchPolicy"));
        assert!(!rendered.contains("dyn "));
    }

    #[tokio::test]
    async fn out_of_range_sample_is_rejected_without_writing() {
        let store = InMemoryTrackingStore::new();
        let service = service_over(&store, Arc::new(InMemoryCatalog::new()));

        let err = service
            .report_progress(LearnerId::new(), VideoId::new(), 140.0)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TrackingError::Validation(ValidationError::PercentageOutOfRange(_))
        ));
        assert_eq!(store.progress_count().await, 0);
    }

    #[tokio::test]
    async fn ratchet_survives_lower_samples() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let (_, _, videos) =
            catalog.add_single_module_course("Seek", 2).await.unwrap();
        let service = service_over(&store, Arc::new(catalog));
        let learner = LearnerId::new();

        let first = service
            .report_progress(learner, videos[0], 95.0)
            .await
            .unwrap();
        let watched_at = first.progress.watched_at;
        assert!(watched_at.is_some());

        service.report_progress(learner, videos[0], 10.0).await.unwrap();
        let last = service
            .report_progress(learner, videos[0], 50.0)
            .await
            .unwrap();

        assert!(last.progress.watched);
        assert_eq!(last.progress.watch_percentage, 50.0);
        assert_eq!(last.progress.watched_at, watched_at);
    }

    #[tokio::test]
    async fn video_end_completes_course() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let (course, _, videos) =
            catalog.add_single_module_course("Ends", 1).await.unwrap();
        let learner = LearnerId::new();
        store
            .enrollments()
            .create_with_progress(learner, course, &videos, Utc::now())
            .await
            .unwrap();
        let service = service_over(&store, Arc::new(catalog));

        let report = service
            .report_video_ended(learner, videos[0])
            .await
            .unwrap();

        assert_eq!(report.course_id, Some(course));
        assert!(report.warnings.is_empty());
        let evaluation = report.evaluation.expect("evaluation ran");
        assert!(evaluation.transitioned());
        assert!(evaluation.progress.is_completed);
    }

    #[tokio::test]
    async fn orphaned_video_still_records_progress() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let (_, _, videos) =
            catalog.add_single_module_course("Orphans", 1).await.unwrap();
        catalog.orphan_video(videos[0]).await;
        let service = service_over(&store, Arc::new(catalog));

        let report = service
            .report_progress(LearnerId::new(), videos[0], 92.0)
            .await
            .unwrap();

        assert!(report.progress.watched);
        assert_eq!(report.course_id, None);
        assert!(report.evaluation.is_none());
        assert!(
            report
                .warnings
                .contains(&ConsistencyWarning::OrphanedVideo { video_id: videos[0] })
        );
    }

    #[tokio::test]
    async fn sample_for_unseeded_video_is_flagged() {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let (_, _, videos) =
            catalog.add_single_module_course("Late", 1).await.unwrap();
        let service = service_over(&store, Arc::new(catalog));

        let report = service
            .report_progress(LearnerId::new(), videos[0], 30.0)
            .await
            .unwrap();

        assert_eq!(
            report.warnings,
            vec![ConsistencyWarning::ProgressCreatedOutsideEnrollment {
                video_id: videos[0]
            }]
        );
    }

    #[tokio::test]
    async fn catalog_outage_after_upsert_is_retryable() {
        let store = InMemoryTrackingStore::new();
        let mut catalog = MockCatalogReader::new();
        catalog
            .expect_course_for_video()
            .returning(|_| Err(TrackingError::Transient("pool timed out".into())));
        let service = service_over(&store, Arc::new(catalog));
        let learner = LearnerId::new();
        let video = VideoId::new();

        let err = service
            .report_progress(learner, video, 95.0)
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let stored = store.progress().get(learner, video).await.unwrap();
        assert!(stored.is_some_and(|row| row.watched));
    }
}
