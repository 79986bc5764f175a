//! Per-video watch state.
//!
//! A video counts as watched once a reported sample reaches the
//! [`WatchPolicy`] threshold. The `watched` flag and `watched_at` timestamp
//! form a one-way ratchet: later, lower samples (a seek backwards, a replay)
//! overwrite `watch_percentage` but never clear the flag or move the
//! timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{LearnerId, ProgressId, VideoId};
use crate::error::ValidationError;

/// Default share of a video that must be played before it counts as watched.
pub const DEFAULT_WATCHED_THRESHOLD: f64 = 90.0;

/// A validated watch-percentage sample in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct WatchPercentage(f64);

impl WatchPercentage {
    pub const ZERO: WatchPercentage = WatchPercentage(0.0);
    /// Reported when the playback surface signals the end of a video.
    pub const COMPLETE: WatchPercentage = WatchPercentage(100.0);

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::PercentageNotFinite);
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::PercentageOutOfRange(value));
        }
        Ok(WatchPercentage(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for WatchPercentage {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        WatchPercentage::new(value)
    }
}

impl<'de> Deserialize<'de> for WatchPercentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        WatchPercentage::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Decides when a sample marks a video as watched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchPolicy {
    watched_threshold: f64,
}

impl WatchPolicy {
    pub fn new(watched_threshold: f64) -> Result<Self, ValidationError> {
        let threshold = WatchPercentage::new(watched_threshold)?;
        Ok(Self {
            watched_threshold: threshold.value(),
        })
    }

    pub fn watched_threshold(&self) -> f64 {
        self.watched_threshold
    }

    pub fn is_watched(&self, sample: WatchPercentage) -> bool {
        sample.value() >= self.watched_threshold
    }
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            watched_threshold: DEFAULT_WATCHED_THRESHOLD,
        }
    }
}

/// Stored watch state for one (learner, video) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub id: ProgressId,
    pub learner_id: LearnerId,
    pub video_id: VideoId,
    pub watched: bool,
    /// Last accepted sample, not the maximum.
    pub watch_percentage: f64,
    /// First time `watched` became true.
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Fresh, unwatched record as materialized at enrollment time.
    pub fn unwatched(
        learner_id: LearnerId,
        video_id: VideoId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProgressId::new(),
            learner_id,
            video_id,
            watched: false,
            watch_percentage: 0.0,
            watched_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a sample in place using the watched ratchet.
    ///
    /// Store adapters that cannot express the ratchet as a single
    /// conditional statement call this while holding their row lock.
    pub fn apply_sample(
        &mut self,
        sample: WatchPercentage,
        reached_threshold: bool,
        now: DateTime<Utc>,
    ) {
        self.watch_percentage = sample.value();
        if reached_threshold && !self.watched {
            self.watched = true;
        }
        if self.watched && self.watched_at.is_none() {
            self.watched_at = Some(now);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn percentage_accepts_bounds() {
        assert_eq!(WatchPercentage::new(0.0).unwrap().value(), 0.0);
        assert_eq!(WatchPercentage::new(100.0).unwrap().value(), 100.0);
    }

    #[test]
    fn percentage_rejects_out_of_range_and_nan() {
        assert_eq!(
            WatchPercentage::new(100.5),
            Err(ValidationError::PercentageOutOfRange(100.5))
        );
        assert_eq!(
            WatchPercentage::new(-1.0),
            Err(ValidationError::PercentageOutOfRange(-1.0))
        );
        assert_eq!(
            WatchPercentage::new(f64::NAN),
            Err(ValidationError::PercentageNotFinite)
        );
    }

    #[test]
    fn percentage_deserialization_validates() {
        let ok: WatchPercentage = serde_json::from_str("42.5").unwrap();
        assert_eq!(ok.value(), 42.5);
        assert!(serde_json::from_str::<WatchPercentage>("250").is_err());
    }

    #[test]
    fn default_policy_uses_ninety_percent() {
        let policy = WatchPolicy::default();
        assert!(!policy.is_watched(WatchPercentage::new(89.9).unwrap()));
        assert!(policy.is_watched(WatchPercentage::new(90.0).unwrap()));
        assert!(policy.is_watched(WatchPercentage::COMPLETE));
    }

    #[test]
    fn policy_rejects_invalid_threshold() {
        assert!(WatchPolicy::new(120.0).is_err());
        assert_eq!(WatchPolicy::new(75.0).unwrap().watched_threshold(), 75.0);
    }

    #[test]
    fn ratchet_keeps_first_watched_timestamp() {
        let start = Utc::now();
        let mut progress =
            Progress::unwatched(LearnerId::new(), VideoId::new(), start);

        let first = start + Duration::seconds(5);
        progress.apply_sample(WatchPercentage::new(95.0).unwrap(), true, first);
        assert!(progress.watched);
        assert_eq!(progress.watched_at, Some(first));

        let later = start + Duration::seconds(60);
        progress.apply_sample(WatchPercentage::new(10.0).unwrap(), false, later);
        assert!(progress.watched);
        assert_eq!(progress.watch_percentage, 10.0);
        assert_eq!(progress.watched_at, Some(first));
        assert_eq!(progress.updated_at, later);
    }
}
