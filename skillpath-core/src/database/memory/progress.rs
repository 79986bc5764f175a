use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::TrackingTables;
use crate::database::ports::progress::{ProgressRepository, RecordedSample};
use crate::domain::{LearnerId, Progress, VideoId, WatchPercentage};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct InMemoryProgressRepository {
    tables: Arc<RwLock<TrackingTables>>,
}

impl InMemoryProgressRepository {
    pub(crate) fn new(tables: Arc<RwLock<TrackingTables>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn record_sample(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
        sample: WatchPercentage,
        reached_threshold: bool,
        now: DateTime<Utc>,
    ) -> Result<RecordedSample> {
        let mut tables = self.tables.write().await;
        let mut created = false;
        let progress = tables
            .progress
            .entry((learner_id, video_id))
            .or_insert_with(|| {
                created = true;
                Progress::unwatched(learner_id, video_id, now)
            });
        progress.apply_sample(sample, reached_threshold, now);

        Ok(RecordedSample {
            progress: progress.clone(),
            created,
        })
    }

    async fn get(
        &self,
        learner_id: LearnerId,
        video_id: VideoId,
    ) -> Result<Option<Progress>> {
        let tables = self.tables.read().await;
        Ok(tables.progress.get(&(learner_id, video_id)).cloned())
    }

    async fn list_for_videos(
        &self,
        learner_id: LearnerId,
        video_ids: &[VideoId],
    ) -> Result<Vec<Progress>> {
        let tables = self.tables.read().await;
        Ok(video_ids
            .iter()
            .filter_map(|video_id| tables.progress.get(&(learner_id, *video_id)))
            .cloned()
            .collect())
    }
}
