use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::errors::store_error;
use crate::database::ports::progress::{ProgressRepository, RecordedSample};
use crate::domain::{
    LearnerId, Progress, ProgressId, VideoId, WatchPercentage,
};
use crate::error::Result;

#[derive(Debug, sqlx::FromRow)]
struct ProgressRow {
    id: Uuid,
    user_id: Uuid,
    video_id: Uuid,
    watched: bool,
    watch_percentage: f64,
    watched_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProgressRow> for Progress {
    fn from(row: ProgressRow) -> Self {
        Progress {
            id: ProgressId(row.id),
            learner_id: LearnerId(row.user_id),
            video_id: VideoId(row.video_id),
            watched: row.watched,
            watch_percentage: row.watch_percentage,
            watched_at: row.watched_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertedRow {
    #[sqlx(flatten)]
    progress: ProgressRow,
    inserted: bool,
}

#[derive(Debug, Clone)]
pub struct PostgresProgressRepository {
    pool: PgPool,
}

impl PostgresProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProgressRepository for PostgresProgressRepository {
    async fn record_sample(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
        sample: WatchPercentage,
        reached_threshold: bool,
        now: DateTime<Utc>,
    ) -> Result<RecordedSample> {
        let watched_at = reached_threshold.then_some(now);

        // The ratchet lives in the conflict clause: `watched` is OR-ed and
        // `watched_at` keeps the stored value once set.
        let row = sqlx::query_as::<_, UpsertedRow>(
            r#"
            INSERT INTO progress (
                id, user_id, video_id, watched, watch_percentage,
                watched_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (user_id, video_id) DO UPDATE SET
                watch_percentage = EXCLUDED.watch_percentage,
                watched = progress.watched OR EXCLUDED.watched,
                watched_at = COALESCE(progress.watched_at, EXCLUDED.watched_at),
                updated_at = EXCLUDED.updated_at
            RETURNING
                id, user_id, video_id, watched, watch_percentage,
                watched_at, created_at, updated_at,
                (xmax = 0) AS inserted
            "#,
        )
        .bind(ProgressId::new().to_uuid())
        .bind(learner_id.to_uuid())
        .bind(video_id.to_uuid())
        .bind(reached_threshold)
        .bind(sample.value())
        .bind(watched_at)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(store_error("Failed to record watch progress"))?;

        Ok(RecordedSample {
            progress: row.progress.into(),
            created: row.inserted,
        })
    }

    async fn get(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
    ) -> Result<Option<Progress>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT
                id, user_id, video_id, watched, watch_percentage,
                watched_at, created_at, updated_at
            FROM progress
            WHERE user_id = $1 AND video_id = $2
            "#,
        )
        .bind(learner_id.to_uuid())
        .bind(video_id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error("Failed to load watch progress"))?;

        Ok(row.map(Progress::from))
    }

    async fn list_for_videos(
        &self,
        learner_id: LearnerId,
        video_ids: &[VideoId],
    ) -> Result<Vec<Progress>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let video_uuids: Vec<Uuid> =
            video_ids.iter().map(VideoId::to_uuid).collect();

        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT
                id, user_id, video_id, watched, watch_percentage,
                watched_at, created_at, updated_at
            FROM progress
            WHERE user_id = $1 AND video_id = ANY($2)
            "#,
        )
        .bind(learner_id.to_uuid())
        .bind(&video_uuids)
        .fetch_all(self.pool())
        .await
        .map_err(store_error("Failed to list watch progress"))?;

        Ok(rows.into_iter().map(Progress::from).collect())
    }
}
