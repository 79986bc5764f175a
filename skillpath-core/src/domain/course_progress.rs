use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CourseId, VideoId};

/// Course-level aggregate derived from per-video progress.
///
/// Always recomputed from stored rows; there is no cached counter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub total_videos: usize,
    pub watched_videos: usize,
    pub percent_complete: f64,
    pub is_completed: bool,
}

impl CourseProgress {
    pub fn from_counts(total_videos: usize, watched_videos: usize) -> Self {
        let percent_complete = if total_videos > 0 {
            watched_videos as f64 / total_videos as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_videos,
            watched_videos,
            percent_complete,
            is_completed: total_videos > 0 && watched_videos == total_videos,
        }
    }

    pub fn empty() -> Self {
        Self::from_counts(0, 0)
    }
}

/// Payload handed to the certificate renderer once a course is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCertificate {
    pub learner_display_name: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub completed_at: DateTime<Utc>,
}

/// Non-fatal condition observed while tracking progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    /// The video does not resolve to any course; completion was skipped.
    OrphanedVideo { video_id: VideoId },
    /// A progress row had to be created on report rather than at enrollment,
    /// usually because the video was added to the course afterwards.
    ProgressCreatedOutsideEnrollment { video_id: VideoId },
    /// Videos in the course with no progress row for this learner.
    UninitializedVideos { course_id: CourseId, count: usize },
    /// Every video is watched but the learner never enrolled.
    CompletedWithoutEnrollment { course_id: CourseId },
}
