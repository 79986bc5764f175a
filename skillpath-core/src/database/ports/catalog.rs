use async_trait::async_trait;

use crate::domain::{CatalogVideo, CourseId, CourseSummary, VideoId};
use crate::error::Result;

/// Read-only view of the course → module → video structure.
///
/// Reflects the catalog at call time; no snapshot is implied across calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Videos across all modules, ordered by module then video position.
    ///
    /// Fails with `TrackingError::NotFound` when the course does not exist.
    async fn course_videos(&self, course_id: CourseId)
    -> Result<Vec<CatalogVideo>>;

    async fn course_for_video(
        &self,
        video_id: VideoId,
    ) -> Result<Option<CourseId>>;

    async fn course_summary(
        &self,
        course_id: CourseId,
    ) -> Result<Option<CourseSummary>>;
}
