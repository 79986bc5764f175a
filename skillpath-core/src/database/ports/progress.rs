use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{LearnerId, Progress, VideoId, WatchPercentage};
use crate::error::Result;

/// Row state after a sample was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSample {
    pub progress: Progress,
    /// The row did not exist before this sample.
    pub created: bool,
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Upserts the (learner, video) row.
    ///
    /// `watch_percentage` is last-writer-wins. `watched` only moves to true
    /// (when `reached_threshold`) and `watched_at` is only set while absent;
    /// both must hold under concurrent calls for the same pair.
    async fn record_sample(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
        sample: WatchPercentage,
        reached_threshold: bool,
        now: DateTime<Utc>,
    ) -> Result<RecordedSample>;

    async fn get(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
    ) -> Result<Option<Progress>>;

    /// Rows for the given videos; videos without a row are simply absent.
    async fn list_for_videos(
        &self,
        learner_id: LearnerId,
        video_ids: &[VideoId],
    ) -> Result<Vec<Progress>>;
}
