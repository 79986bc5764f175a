pub mod course_handlers;
pub mod health_handlers;
pub mod progress_handlers;
