use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::ports::catalog::CatalogReader;
use crate::domain::{
    CatalogVideo, CourseId, CourseSummary, ModuleId, VideoId,
    order_course_videos,
};
use crate::error::{Result, TrackingError};

#[derive(Debug, Default)]
struct CatalogTables {
    courses: HashMap<CourseId, String>,
    modules: HashMap<ModuleId, (CourseId, i32)>,
    videos: HashMap<VideoId, (ModuleId, i32)>,
}

/// Mutable catalog fixture.
///
/// Authoring lives outside the engine; these builder methods stand in for
/// the admin side so tests and local runs can shape courses, including
/// growing a course after learners enrolled.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tables: Arc<RwLock<CatalogTables>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_course(&self, title: impl Into<String>) -> CourseId {
        let id = CourseId::new();
        self.tables.write().await.courses.insert(id, title.into());
        id
    }

    pub async fn add_module(
        &self,
        course_id: CourseId,
        order_index: i32,
    ) -> Result<ModuleId> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&course_id) {
            return Err(TrackingError::NotFound(format!("course {course_id}")));
        }
        let id = ModuleId::new();
        tables.modules.insert(id, (course_id, order_index));
        Ok(id)
    }

    pub async fn add_video(
        &self,
        module_id: ModuleId,
        order_index: i32,
    ) -> Result<VideoId> {
        let mut tables = self.tables.write().await;
        if !tables.modules.contains_key(&module_id) {
            return Err(TrackingError::NotFound(format!("module {module_id}")));
        }
        let id = VideoId::new();
        tables.videos.insert(id, (module_id, order_index));
        Ok(id)
    }

    /// Course with a single module holding `video_count` videos.
    pub async fn add_single_module_course(
        &self,
        title: impl Into<String>,
        video_count: usize,
    ) -> Result<(CourseId, ModuleId, Vec<VideoId>)> {
        let course_id = self.add_course(title).await;
        let module_id = self.add_module(course_id, 0).await?;
        let mut videos = Vec::with_capacity(video_count);
        for order in 0..video_count {
            videos.push(self.add_video(module_id, order as i32).await?);
        }
        Ok((course_id, module_id, videos))
    }

    /// Detaches a video from its module, as an admin deleting a module would
    /// leave behind when progress rows outlive the catalog entry.
    pub async fn orphan_video(&self, video_id: VideoId) {
        let mut tables = self.tables.write().await;
        if let Some(entry) = tables.videos.get_mut(&video_id) {
            entry.0 = ModuleId::new();
        }
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn course_videos(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CatalogVideo>> {
        let tables = self.tables.read().await;
        if !tables.courses.contains_key(&course_id) {
            return Err(TrackingError::NotFound(format!("course {course_id}")));
        }

        let mut videos: Vec<CatalogVideo> = tables
            .videos
            .iter()
            .filter_map(|(video_id, (module_id, video_order))| {
                let (owner, module_order) = tables.modules.get(module_id)?;
                (*owner == course_id).then_some(CatalogVideo {
                    video_id: *video_id,
                    module_id: *module_id,
                    module_order: *module_order,
                    video_order: *video_order,
                })
            })
            .collect();
        order_course_videos(&mut videos);
        Ok(videos)
    }

    async fn course_for_video(
        &self,
        video_id: VideoId,
    ) -> Result<Option<CourseId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .videos
            .get(&video_id)
            .and_then(|(module_id, _)| tables.modules.get(module_id))
            .map(|(course_id, _)| *course_id))
    }

    async fn course_summary(
        &self,
        course_id: CourseId,
    ) -> Result<Option<CourseSummary>> {
        let tables = self.tables.read().await;
        Ok(tables.courses.get(&course_id).map(|title| CourseSummary {
            id: course_id,
            title: title.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn course_videos_flatten_modules_in_order() {
        let catalog = InMemoryCatalog::new();
        let course = catalog.add_course("Rust Basics").await;
        let second = catalog.add_module(course, 1).await.unwrap();
        let first = catalog.add_module(course, 0).await.unwrap();
        let late = catalog.add_video(second, 0).await.unwrap();
        let early = catalog.add_video(first, 0).await.unwrap();

        let videos = catalog.course_videos(course).await.unwrap();
        let ids: Vec<_> = videos.iter().map(|v| v.video_id).collect();
        assert_eq!(ids, vec![early, late]);
        assert_eq!(catalog.course_for_video(late).await.unwrap(), Some(course));
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let err = catalog.course_videos(CourseId::new()).await.unwrap_err();
        assert!(matches!(err, TrackingError::NotFound(_)));
    }

    #[tokio::test]
    async fn orphaned_video_has_no_course() {
        let catalog = InMemoryCatalog::new();
        let (_, _, videos) =
            catalog.add_single_module_course("Intro", 1).await.unwrap();
        catalog.orphan_video(videos[0]).await;
        assert_eq!(catalog.course_for_video(videos[0]).await.unwrap(), None);
    }
}
