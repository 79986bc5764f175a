use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use skillpath_core::{
    api::types::{ApiResponse, EnrollmentSummary, EnrollmentsQuery},
    domain::{CompletionCertificate, CourseId, CourseProgress, EnrollOutcome},
    tracking::CourseEvaluation,
};

use crate::infra::{app_state::AppState, errors::AppResult, identity::LearnerIdentity};

/// Enroll the calling learner in a course
///
/// # Response
///
/// - `201 Created` with the new enrollment and the number of progress rows
///   seeded for the course's current videos
/// - `200 OK` with the existing enrollment when already enrolled
/// - `404 Not Found` if the catalog does not know the course
/// - `503 Service Unavailable` if the catalog or store timed out; nothing
///   was written and the request can be retried
pub async fn enroll_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Path(course_id): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<EnrollOutcome>>)> {
    let course_id: CourseId = course_id.parse()?;
    let outcome = state
        .engine()
        .enrollment()
        .enroll(identity.learner_id, course_id)
        .await?;

    let status = if outcome.is_new() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(outcome))))
}

/// Read-only course progress for display.
pub async fn course_progress_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Path(course_id): Path<String>,
) -> AppResult<Json<ApiResponse<CourseProgress>>> {
    let course_id: CourseId = course_id.parse()?;
    let progress = state
        .engine()
        .completion()
        .snapshot(identity.learner_id, course_id)
        .await?;

    Ok(Json(ApiResponse::success(progress)))
}

/// Recompute progress and record completion if every video is watched.
///
/// Safe to call repeatedly; `completed_at` is only ever set once.
pub async fn evaluate_course_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Path(course_id): Path<String>,
) -> AppResult<Json<ApiResponse<CourseEvaluation>>> {
    let course_id: CourseId = course_id.parse()?;
    let evaluation = state
        .engine()
        .completion()
        .evaluate(identity.learner_id, course_id)
        .await?;

    Ok(Json(ApiResponse::success(evaluation)))
}

/// Certificate payload for a completed enrollment
///
/// # Response
///
/// - `200 OK` with learner name, course title and completion time
/// - `404 Not Found` without an enrollment
/// - `409 Conflict` while the enrollment is still in progress
pub async fn certificate_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Path(course_id): Path<String>,
) -> AppResult<Json<ApiResponse<CompletionCertificate>>> {
    let course_id: CourseId = course_id.parse()?;
    let certificate = state
        .engine()
        .completion()
        .certificate(identity.learner_id, &identity.display_name(), course_id)
        .await?;

    Ok(Json(ApiResponse::success(certificate)))
}

/// The caller's enrollments, newest first, optionally filtered by
/// `?status=in_progress|completed`.
pub async fn list_enrollments_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Query(query): Query<EnrollmentsQuery>,
) -> AppResult<Json<ApiResponse<Vec<EnrollmentSummary>>>> {
    let enrollments = state
        .engine()
        .enrollment()
        .enrollments(identity.learner_id, query.status)
        .await?;

    let summaries = enrollments.iter().map(EnrollmentSummary::from).collect();
    Ok(Json(ApiResponse::success(summaries)))
}
