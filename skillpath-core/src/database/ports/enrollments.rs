use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    CompletionTransition, CourseId, EnrollOutcome, Enrollment,
    EnrollmentFilter, LearnerId, VideoId,
};
use crate::error::Result;

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>>;

    /// Creates the enrollment and one unwatched progress row per video in a
    /// single atomic step.
    ///
    /// A concurrent insert for the same (learner, course) resolves to the
    /// stored row and yields [`EnrollOutcome::AlreadyEnrolled`]. Existing
    /// progress rows for a video are left untouched.
    async fn create_with_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        video_ids: &[VideoId],
        now: DateTime<Utc>,
    ) -> Result<EnrollOutcome>;

    /// Sets `completed_at = now` only when it is currently absent.
    async fn mark_completed(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<CompletionTransition>;

    /// Most recent enrollment first.
    async fn list_for_learner(
        &self,
        learner_id: LearnerId,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>>;
}
