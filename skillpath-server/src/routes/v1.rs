use axum::{
    Router, middleware,
    routing::{get, post},
};
use skillpath_core::api::routes::v1;

use crate::{
    handlers::{course_handlers, health_handlers, progress_handlers},
    infra::{app_state::AppState, identity::identity_middleware},
};

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .merge(create_learner_routes())
        // Public liveness check
        .route(v1::HEALTH, get(health_handlers::health_handler))
}

/// Routes that act on behalf of the learner named in the identity headers.
fn create_learner_routes() -> Router<AppState> {
    Router::new()
        .route(
            v1::courses::ENROLL,
            post(course_handlers::enroll_handler),
        )
        .route(
            v1::courses::PROGRESS,
            get(course_handlers::course_progress_handler),
        )
        .route(
            v1::courses::EVALUATE,
            post(course_handlers::evaluate_course_handler),
        )
        .route(
            v1::courses::CERTIFICATE,
            get(course_handlers::certificate_handler),
        )
        .route(
            v1::enrollments::COLLECTION,
            get(course_handlers::list_enrollments_handler),
        )
        .route(
            v1::videos::PROGRESS,
            post(progress_handlers::report_progress_handler),
        )
        .route(
            v1::videos::ENDED,
            post(progress_handlers::video_ended_handler),
        )
        .layer(middleware::from_fn(identity_middleware))
}
