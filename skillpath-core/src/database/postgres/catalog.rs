use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::errors::store_error;
use crate::database::ports::catalog::CatalogReader;
use crate::domain::{
    CatalogVideo, CourseId, CourseSummary, ModuleId, VideoId,
};
use crate::error::{Result, TrackingError};

#[derive(Debug, sqlx::FromRow)]
struct CatalogVideoRow {
    video_id: Uuid,
    module_id: Uuid,
    module_order: i32,
    video_order: i32,
}

/// Reads the catalog tables maintained by course authoring.
#[derive(Debug, Clone)]
pub struct PostgresCatalogReader {
    pool: PgPool,
}

impl PostgresCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalogReader {
    async fn course_videos(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CatalogVideo>> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM courses WHERE id = $1)",
        )
        .bind(course_id.to_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(store_error("Failed to look up course"))?;

        if !exists {
            return Err(TrackingError::NotFound(format!("course {course_id}")));
        }

        let rows = sqlx::query_as::<_, CatalogVideoRow>(
            r#"
            SELECT
                v.id AS video_id,
                v.module_id,
                m.order_index AS module_order,
                v.order_index AS video_order
            FROM videos v
            JOIN modules m ON m.id = v.module_id
            WHERE m.course_id = $1
            ORDER BY m.order_index, v.order_index, v.id
            "#,
        )
        .bind(course_id.to_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(store_error("Failed to load course videos"))?;

        Ok(rows
            .into_iter()
            .map(|row| CatalogVideo {
                video_id: VideoId(row.video_id),
                module_id: ModuleId(row.module_id),
                module_order: row.module_order,
                video_order: row.video_order,
            })
            .collect())
    }

    async fn course_for_video(
        &self,
        video_id: VideoId,
    ) -> Result<Option<CourseId>> {
        let course: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT m.course_id
            FROM videos v
            JOIN modules m ON m.id = v.module_id
            WHERE v.id = $1
            "#,
        )
        .bind(video_id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error("Failed to resolve video course"))?;

        Ok(course.map(CourseId))
    }

    async fn course_summary(
        &self,
        course_id: CourseId,
    ) -> Result<Option<CourseSummary>> {
        let title: Option<String> =
            sqlx::query_scalar("SELECT title FROM courses WHERE id = $1")
                .bind(course_id.to_uuid())
                .fetch_optional(self.pool())
                .await
                .map_err(store_error("Failed to load course summary"))?;

        Ok(title.map(|title| CourseSummary {
            id: course_id,
            title,
        }))
    }
}
