use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::errors::{is_unique_violation, store_error};
use crate::database::ports::enrollments::EnrollmentRepository;
use crate::domain::{
    CompletionTransition, CourseId, EnrollOutcome, Enrollment,
    EnrollmentFilter, EnrollmentId, LearnerId, ProgressId, VideoId,
};
use crate::error::{Result, TrackingError};

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Enrollment {
            id: EnrollmentId(row.id),
            learner_id: LearnerId(row.user_id),
            course_id: CourseId(row.course_id),
            enrolled_at: row.enrolled_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresEnrollmentRepository {
    pool: PgPool,
}

impl PostgresEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn existing(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<EnrollOutcome> {
        let enrollment =
            self.find(learner_id, course_id).await?.ok_or_else(|| {
                TrackingError::Internal(format!(
                    "Enrollment for learner {learner_id} in course {course_id} vanished after conflict"
                ))
            })?;
        Ok(EnrollOutcome::AlreadyEnrolled { enrollment })
    }
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepository {
    async fn find(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT id, user_id, course_id, enrolled_at, completed_at
            FROM enrollments
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(learner_id.to_uuid())
        .bind(course_id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error("Failed to load enrollment"))?;

        Ok(row.map(Enrollment::from))
    }

    async fn create_with_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        video_ids: &[VideoId],
        now: DateTime<Utc>,
    ) -> Result<EnrollOutcome> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(store_error("Failed to begin enrollment transaction"))?;

        // A racing enroll blocks on the unique index until the winner
        // commits, then sees the conflict and returns no row.
        let inserted = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            INSERT INTO enrollments (id, user_id, course_id, enrolled_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING id, user_id, course_id, enrolled_at, completed_at
            "#,
        )
        .bind(EnrollmentId::new().to_uuid())
        .bind(learner_id.to_uuid())
        .bind(course_id.to_uuid())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await;

        let row = match inserted {
            Ok(Some(row)) => row,
            Ok(None) => {
                drop(tx);
                debug!(%learner_id, %course_id, "enrollment already present");
                return self.existing(learner_id, course_id).await;
            }
            Err(err) if is_unique_violation(&err) => {
                drop(tx);
                return self.existing(learner_id, course_id).await;
            }
            Err(err) => {
                return Err(store_error("Failed to create enrollment")(err));
            }
        };

        let progress_ids: Vec<Uuid> =
            video_ids.iter().map(|_| ProgressId::new().to_uuid()).collect();
        let video_uuids: Vec<Uuid> =
            video_ids.iter().map(VideoId::to_uuid).collect();

        let initialized = sqlx::query(
            r#"
            INSERT INTO progress (
                id, user_id, video_id, watched, watch_percentage,
                watched_at, created_at, updated_at
            )
            SELECT seed.id, $2, seed.video_id, FALSE, 0, NULL, $4, $4
            FROM UNNEST($1::uuid[], $3::uuid[]) AS seed(id, video_id)
            ON CONFLICT (user_id, video_id) DO NOTHING
            "#,
        )
        .bind(&progress_ids)
        .bind(learner_id.to_uuid())
        .bind(&video_uuids)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_error("Failed to initialize progress rows"))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(store_error("Failed to commit enrollment"))?;

        Ok(EnrollOutcome::Enrolled {
            enrollment: row.into(),
            progress_initialized: initialized as usize,
        })
    }

    async fn mark_completed(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<CompletionTransition> {
        let updated: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE enrollments
            SET completed_at = $3
            WHERE user_id = $1 AND course_id = $2 AND completed_at IS NULL
            RETURNING completed_at
            "#,
        )
        .bind(learner_id.to_uuid())
        .bind(course_id.to_uuid())
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(store_error("Failed to mark enrollment completed"))?;

        if let Some(at) = updated {
            return Ok(CompletionTransition::Transitioned(at));
        }

        match self.find(learner_id, course_id).await? {
            None => Ok(CompletionTransition::NotEnrolled),
            Some(Enrollment {
                completed_at: Some(at),
                ..
            }) => Ok(CompletionTransition::AlreadyCompleted(at)),
            Some(_) => Err(TrackingError::Internal(format!(
                "Completion write for learner {learner_id} in course {course_id} matched no row"
            ))),
        }
    }

    async fn list_for_learner(
        &self,
        learner_id: LearnerId,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>> {
        let status_clause = match filter {
            EnrollmentFilter::All => "",
            EnrollmentFilter::InProgress => "AND completed_at IS NULL",
            EnrollmentFilter::Completed => "AND completed_at IS NOT NULL",
        };
        let sql = format!(
            r#"
            SELECT id, user_id, course_id, enrolled_at, completed_at
            FROM enrollments
            WHERE user_id = $1 {status_clause}
            ORDER BY enrolled_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(learner_id.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(store_error("Failed to list enrollments"))?;

        Ok(rows.into_iter().map(Enrollment::from).collect())
    }
}
