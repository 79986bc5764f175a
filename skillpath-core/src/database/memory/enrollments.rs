use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::TrackingTables;
use crate::database::ports::enrollments::EnrollmentRepository;
use crate::domain::{
    CompletionTransition, CourseId, EnrollOutcome, Enrollment,
    EnrollmentFilter, LearnerId, Progress, VideoId,
};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct InMemoryEnrollmentRepository {
    tables: Arc<RwLock<TrackingTables>>,
}

impl InMemoryEnrollmentRepository {
    pub(crate) fn new(tables: Arc<RwLock<TrackingTables>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn find(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>> {
        let tables = self.tables.read().await;
        Ok(tables.enrollments.get(&(learner_id, course_id)).cloned())
    }

    async fn create_with_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        video_ids: &[VideoId],
        now: DateTime<Utc>,
    ) -> Result<EnrollOutcome> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.enrollments.get(&(learner_id, course_id))
        {
            return Ok(EnrollOutcome::AlreadyEnrolled {
                enrollment: existing.clone(),
            });
        }

        let enrollment = Enrollment::new(learner_id, course_id, now);
        tables
            .enrollments
            .insert((learner_id, course_id), enrollment.clone());

        let mut progress_initialized = 0;
        for video_id in video_ids {
            tables
                .progress
                .entry((learner_id, *video_id))
                .or_insert_with(|| {
                    progress_initialized += 1;
                    Progress::unwatched(learner_id, *video_id, now)
                });
        }

        Ok(EnrollOutcome::Enrolled {
            enrollment,
            progress_initialized,
        })
    }

    async fn mark_completed(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<CompletionTransition> {
        let mut tables = self.tables.write().await;
        let Some(enrollment) =
            tables.enrollments.get_mut(&(learner_id, course_id))
        else {
            return Ok(CompletionTransition::NotEnrolled);
        };

        match enrollment.completed_at {
            Some(at) => Ok(CompletionTransition::AlreadyCompleted(at)),
            None => {
                enrollment.completed_at = Some(now);
                Ok(CompletionTransition::Transitioned(now))
            }
        }
    }

    async fn list_for_learner(
        &self,
        learner_id: LearnerId,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>> {
        let tables = self.tables.read().await;
        let mut enrollments: Vec<Enrollment> = tables
            .enrollments
            .values()
            .filter(|enrollment| enrollment.learner_id == learner_id)
            .filter(|enrollment| filter.matches(enrollment))
            .cloned()
            .collect();
        enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(enrollments)
    }
}
