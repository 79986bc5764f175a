use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CourseId, Enrollment, EnrollmentFilter, EnrollmentId, EnrollmentStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
            message: None,
        }
    }
}

/// Body of a playback progress report.
///
/// Kept as a raw number so range checks produce a validation error rather
/// than a deserialization failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportProgressRequest {
    pub watch_percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnrollmentsQuery {
    #[serde(default)]
    pub status: EnrollmentFilter,
}

/// Profile-page listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentSummary {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentSummary {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            id: enrollment.id,
            course_id: enrollment.course_id,
            status: enrollment.status(),
            enrolled_at: enrollment.enrolled_at,
            completed_at: enrollment.completed_at,
        }
    }
}
