use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog_failure;
use crate::database::ports::{
    catalog::CatalogReader, enrollments::EnrollmentRepository,
    progress::ProgressRepository,
};
use crate::domain::{
    CompletionCertificate, CompletionTransition, ConsistencyWarning, CourseId,
    CourseProgress, LearnerId, VideoId,
};
use crate::error::{Result, TrackingError};

/// Outcome of a full evaluation, including the completion side effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEvaluation {
    pub progress: CourseProgress,
    /// Stored completion time. Stays set even when `progress` no longer
    /// reports completion after the course grew.
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only when this evaluation attempted the completion write.
    pub transition: Option<CompletionTransition>,
    pub warnings: Vec<ConsistencyWarning>,
}

impl CourseEvaluation {
    /// True only for the single call whose write set `completed_at`.
    pub fn transitioned(&self) -> bool {
        matches!(self.transition, Some(CompletionTransition::Transitioned(_)))
    }
}

struct Measurement {
    progress: CourseProgress,
    uninitialized: usize,
}

/// Recomputes course-level progress and applies the one-way completion
/// transition.
#[derive(Clone)]
pub struct CompletionEvaluator {
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressRepository>,
    catalog: Arc<dyn CatalogReader>,
}

impl fmt::Debug for CompletionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionEvaluator").finish_non_exhaustive()
    }
}

impl CompletionEvaluator {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressRepository>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Self {
        Self {
            enrollments,
            progress,
            catalog,
        }
    }

    async fn measure(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Measurement> {
        let videos = self
            .catalog
            .course_videos(course_id)
            .await
            .map_err(catalog_failure)?;
        let video_ids: Vec<VideoId> =
            videos.iter().map(|video| video.video_id).collect();

        let rows = self
            .progress
            .list_for_videos(learner_id, &video_ids)
            .await?;
        let watched = rows.iter().filter(|row| row.watched).count();

        Ok(Measurement {
            progress: CourseProgress::from_counts(video_ids.len(), watched),
            uninitialized: video_ids.len().saturating_sub(rows.len()),
        })
    }

    /// Read-only aggregate for display. Never writes.
    pub async fn snapshot(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<CourseProgress> {
        Ok(self.measure(learner_id, course_id).await?.progress)
    }

    /// Recomputes the aggregate and, when every video is watched, sets
    /// `completed_at` if it is still absent.
    pub async fn evaluate(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<CourseEvaluation> {
        let Measurement {
            progress,
            uninitialized,
        } = self.measure(learner_id, course_id).await?;
        let mut warnings = Vec::new();

        debug!(
            %learner_id,
            %course_id,
            total_videos = progress.total_videos,
            watched_videos = progress.watched_videos,
            "evaluated course progress"
        );

        if !progress.is_completed {
            let enrollment =
                self.enrollments.find(learner_id, course_id).await?;
            if uninitialized > 0 && enrollment.is_some() {
                warn!(
                    %learner_id,
                    %course_id,
                    count = uninitialized,
                    "course has videos without progress rows"
                );
                warnings.push(ConsistencyWarning::UninitializedVideos {
                    course_id,
                    count: uninitialized,
                });
            }
            return Ok(CourseEvaluation {
                progress,
                completed_at: enrollment.and_then(|e| e.completed_at),
                transition: None,
                warnings,
            });
        }

        let transition = self
            .enrollments
            .mark_completed(learner_id, course_id, Utc::now())
            .await?;

        match transition {
            CompletionTransition::Transitioned(at) => {
                info!(%learner_id, %course_id, completed_at = %at, "course completed");
            }
            CompletionTransition::AlreadyCompleted(at) => {
                debug!(%learner_id, %course_id, completed_at = %at, "course already completed");
            }
            CompletionTransition::NotEnrolled => {
                warn!(
                    %learner_id,
                    %course_id,
                    "all videos watched without an enrollment"
                );
                warnings.push(ConsistencyWarning::CompletedWithoutEnrollment {
                    course_id,
                });
            }
        }

        Ok(CourseEvaluation {
            progress,
            completed_at: transition.completed_at(),
            transition: Some(transition),
            warnings,
        })
    }

    /// Payload for the certificate renderer.
    ///
    /// Fails with `NotFound` without an enrollment and `NotCompleted` while
    /// the enrollment is still open.
    pub async fn certificate(
        &self,
        learner_id: LearnerId,
        learner_display_name: &str,
        course_id: CourseId,
    ) -> Result<CompletionCertificate> {
        let enrollment = self
            .enrollments
            .find(learner_id, course_id)
            .await?
            .ok_or_else(|| {
                TrackingError::NotFound(format!(
                    "enrollment in course {course_id}"
                ))
            })?;
        let completed_at =
            enrollment.completed_at.ok_or(TrackingError::NotCompleted)?;

        let course = self
            .catalog
            .course_summary(course_id)
            .await
            .map_err(catalog_failure)?
            .ok_or_else(|| {
                TrackingError::NotFound(format!("course {course_id}"))
            })?;

        Ok(CompletionCertificate {
            learner_display_name: learner_display_name.to_string(),
            course_id,
            course_title: course.title,
            completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{InMemoryCatalog, InMemoryTrackingStore};
    use crate::domain::WatchPercentage;

    struct Fixture {
        store: InMemoryTrackingStore,
        catalog: InMemoryCatalog,
        evaluator: CompletionEvaluator,
    }

    fn fixture() -> Fixture {
        let store = InMemoryTrackingStore::new();
        let catalog = InMemoryCatalog::new();
        let evaluator = CompletionEvaluator::new(
            Arc::new(store.enrollments()),
            Arc::new(store.progress()),
            Arc::new(catalog.clone()),
        );
        Fixture {
            store,
            catalog,
            evaluator,
        }
    }

    async fn enroll(fx: &Fixture, learner: LearnerId, course: CourseId) {
        let videos = fx.catalog.course_videos(course).await.unwrap();
        let ids: Vec<_> = videos.iter().map(|v| v.video_id).collect();
        fx.store
            .enrollments()
            .create_with_progress(learner, course, &ids, Utc::now())
            .await
            .unwrap();
    }

    async fn watch(fx: &Fixture, learner: LearnerId, video: VideoId) {
        fx.store
            .progress()
            .record_sample(
                learner,
                video,
                WatchPercentage::COMPLETE,
                true,
                Utc::now(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn three_of_four_watched_is_not_complete() {
        let fx = fixture();
        let (course, _, videos) =
            fx.catalog.add_single_module_course("Async", 4).await.unwrap();
        let learner = LearnerId::new();
        enroll(&fx, learner, course).await;
        for video in &videos[..3] {
            watch(&fx, learner, *video).await;
        }

        let evaluation = fx.evaluator.evaluate(learner, course).await.unwrap();
        assert_eq!(evaluation.progress.percent_complete, 75.0);
        assert!(!evaluation.progress.is_completed);
        assert_eq!(evaluation.completed_at, None);
        assert_eq!(evaluation.transition, None);
    }

    #[tokio::test]
    async fn completion_transitions_once() {
        let fx = fixture();
        let (course, _, videos) =
            fx.catalog.add_single_module_course("Macros", 2).await.unwrap();
        let learner = LearnerId::new();
        enroll(&fx, learner, course).await;
        for video in &videos {
            watch(&fx, learner, *video).await;
        }

        let first = fx.evaluator.evaluate(learner, course).await.unwrap();
        let second = fx.evaluator.evaluate(learner, course).await.unwrap();

        assert!(first.transitioned());
        assert!(!second.transitioned());
        assert!(matches!(
            second.transition,
            Some(CompletionTransition::AlreadyCompleted(_))
        ));
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn zero_video_course_never_completes() {
        let fx = fixture();
        let course = fx.catalog.add_course("Empty").await;
        let learner = LearnerId::new();
        enroll(&fx, learner, course).await;

        let evaluation = fx.evaluator.evaluate(learner, course).await.unwrap();
        assert_eq!(evaluation.progress.total_videos, 0);
        assert!(!evaluation.progress.is_completed);
        assert_eq!(evaluation.transition, None);
    }

    #[tokio::test]
    async fn snapshot_does_not_complete() {
        let fx = fixture();
        let (course, _, videos) =
            fx.catalog.add_single_module_course("Lifetimes", 1).await.unwrap();
        let learner = LearnerId::new();
        enroll(&fx, learner, course).await;
        watch(&fx, learner, videos[0]).await;

        let snapshot = fx.evaluator.snapshot(learner, course).await.unwrap();
        assert!(snapshot.is_completed);
        let stored = fx
            .store
            .enrollments()
            .find(learner, course)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.completed_at, None);
    }

    #[tokio::test]
    async fn added_video_is_reported_as_uninitialized() {
        let fx = fixture();
        let (course, module, _) =
            fx.catalog.add_single_module_course("Unsafe", 1).await.unwrap();
        let learner = LearnerId::new();
        enroll(&fx, learner, course).await;
        fx.catalog.add_video(module, 1).await.unwrap();

        let evaluation = fx.evaluator.evaluate(learner, course).await.unwrap();
        assert_eq!(evaluation.progress.total_videos, 2);
        assert_eq!(
            evaluation.warnings,
            vec![ConsistencyWarning::UninitializedVideos {
                course_id: course,
                count: 1
            }]
        );
    }

    #[tokio::test]
    async fn all_watched_without_enrollment_warns() {
        let fx = fixture();
        let (course, _, videos) =
            fx.catalog.add_single_module_course("Drive-by", 1).await.unwrap();
        let learner = LearnerId::new();
        watch(&fx, learner, videos[0]).await;

        let evaluation = fx.evaluator.evaluate(learner, course).await.unwrap();
        assert!(evaluation.progress.is_completed);
        assert_eq!(evaluation.completed_at, None);
        assert_eq!(
            evaluation.warnings,
            vec![ConsistencyWarning::CompletedWithoutEnrollment {
                course_id: course
            }]
        );
    }

    #[tokio::test]
    async fn certificate_requires_completion() {
        let fx = fixture();
        let (course, _, videos) =
            fx.catalog.add_single_module_course("Rust 101", 1).await.unwrap();
        let learner = LearnerId::new();

        let missing = fx
            .evaluator
            .certificate(learner, "Ada", course)
            .await
            .unwrap_err();
        assert!(matches!(missing, TrackingError::NotFound(_)));

        enroll(&fx, learner, course).await;
        let open = fx
            .evaluator
            .certificate(learner, "Ada", course)
            .await
            .unwrap_err();
        assert!(matches!(open, TrackingError::NotCompleted));

        watch(&fx, learner, videos[0]).await;
        let evaluation = fx.evaluator.evaluate(learner, course).await.unwrap();
        let certificate = fx
            .evaluator
            .certificate(learner, "Ada", course)
            .await
            .unwrap();
        assert_eq!(certificate.course_title, "Rust 101");
        assert_eq!(certificate.learner_display_name, "Ada");
        assert_eq!(Some(certificate.completed_at), evaluation.completed_at);
    }
}
