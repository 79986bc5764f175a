use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CourseId, EnrollmentId, LearnerId};

/// Link between a learner and a course.
///
/// `enrolled_at` is fixed at creation. `completed_at` moves from `None` to
/// `Some` exactly once and is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new(
        learner_id: LearnerId,
        course_id: CourseId,
        enrolled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EnrollmentId::new(),
            learner_id,
            course_id,
            enrolled_at,
            completed_at: None,
        }
    }

    pub fn status(&self) -> EnrollmentStatus {
        match self.completed_at {
            Some(_) => EnrollmentStatus::Completed,
            None => EnrollmentStatus::Enrolled,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    Completed,
}

/// Listing filter for a learner's enrollments.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentFilter {
    #[default]
    All,
    InProgress,
    Completed,
}

impl EnrollmentFilter {
    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        match self {
            EnrollmentFilter::All => true,
            EnrollmentFilter::InProgress => !enrollment.is_completed(),
            EnrollmentFilter::Completed => enrollment.is_completed(),
        }
    }
}

/// Result of an enroll call. A repeated call is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EnrollOutcome {
    Enrolled {
        enrollment: Enrollment,
        /// Progress rows materialized for the course's videos.
        progress_initialized: usize,
    },
    AlreadyEnrolled { enrollment: Enrollment },
}

impl EnrollOutcome {
    pub fn enrollment(&self) -> &Enrollment {
        match self {
            EnrollOutcome::Enrolled { enrollment, .. }
            | EnrollOutcome::AlreadyEnrolled { enrollment } => enrollment,
        }
    }

    pub fn enrollment_id(&self) -> EnrollmentId {
        self.enrollment().id
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EnrollOutcome::Enrolled { .. })
    }
}

/// Result of the conditional `completed_at IS NULL` write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", content = "completed_at", rename_all = "snake_case")]
pub enum CompletionTransition {
    /// This call set `completed_at`.
    Transitioned(DateTime<Utc>),
    /// Another call already won; carries the stored timestamp.
    AlreadyCompleted(DateTime<Utc>),
    /// No enrollment row exists for the pair.
    NotEnrolled,
}

impl CompletionTransition {
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            CompletionTransition::Transitioned(at)
            | CompletionTransition::AlreadyCompleted(at) => Some(*at),
            CompletionTransition::NotEnrolled => None,
        }
    }
}
