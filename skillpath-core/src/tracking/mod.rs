//! Tracking services: enrollment, progress reporting and completion.
//!
//! Services hold no aggregate state of their own. Every course-level figure
//! is recomputed from the stores on each call.

pub mod completion;
pub mod engine;
pub mod enrollment;
pub mod progress;

pub use completion::{CompletionEvaluator, CourseEvaluation};
pub use engine::TrackingEngine;
pub use enrollment::EnrollmentService;
pub use progress::{ProgressReport, ProgressUpdateService};

use crate::error::TrackingError;

/// The catalog is an external collaborator: anything other than a missing
/// course is reported as retryable.
pub(crate) fn catalog_failure(err: TrackingError) -> TrackingError {
    match err {
        TrackingError::Internal(message) => TrackingError::Transient(format!(
            "catalog unavailable: {message}"
        )),
        other => other,
    }
}
