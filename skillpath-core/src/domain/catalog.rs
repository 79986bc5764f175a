use serde::{Deserialize, Serialize};

use super::ids::{CourseId, ModuleId, VideoId};

/// A video as seen through the catalog: its owning module and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVideo {
    pub video_id: VideoId,
    pub module_id: ModuleId,
    pub module_order: i32,
    pub video_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
}

/// Flattens module/video ordering into the sequence the learner follows.
pub fn order_course_videos(videos: &mut [CatalogVideo]) {
    videos.sort_by_key(|video| (video.module_order, video.video_order));
}
