//! Domain types for enrollment and progress tracking.

pub mod catalog;
pub mod course_progress;
pub mod enrollment;
pub mod ids;
pub mod watch;

pub use catalog::{CatalogVideo, CourseSummary, order_course_videos};
pub use course_progress::{
    CompletionCertificate, ConsistencyWarning, CourseProgress,
};
pub use enrollment::{
    CompletionTransition, EnrollOutcome, Enrollment, EnrollmentFilter,
    EnrollmentStatus,
};
pub use ids::{
    CourseId, EnrollmentId, LearnerId, ModuleId, ProgressId, VideoId,
};
pub use watch::{
    DEFAULT_WATCHED_THRESHOLD, Progress, WatchPercentage, WatchPolicy,
};
