use axum::{
    Extension, Json,
    extract::{Path, State},
};
use skillpath_core::{
    api::types::{ApiResponse, ReportProgressRequest},
    domain::VideoId,
    tracking::ProgressReport,
};

use crate::infra::{app_state::AppState, errors::AppResult, identity::LearnerIdentity};

/// Report playback progress for a video
///
/// Sent periodically by the player while a video plays.
///
/// # Request
///
/// ```json
/// { "watch_percentage": 42.5 }
/// ```
///
/// # Response
///
/// - `200 OK` with the stored progress and the course evaluation it
///   triggered
/// - `400 Bad Request` if the percentage is outside 0..=100
///
/// # Behavior
///
/// - The latest report wins for `watch_percentage`
/// - Reaching the watched threshold marks the video watched; later lower
///   reports never clear it
/// - Completion is evaluated before the response is sent
pub async fn report_progress_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Path(video_id): Path<String>,
    Json(request): Json<ReportProgressRequest>,
) -> AppResult<Json<ApiResponse<ProgressReport>>> {
    let video_id: VideoId = video_id.parse()?;
    let report = state
        .engine()
        .progress()
        .report_progress(identity.learner_id, video_id, request.watch_percentage)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

/// Playback reached the end of the video; recorded as 100%.
pub async fn video_ended_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<LearnerIdentity>,
    Path(video_id): Path<String>,
) -> AppResult<Json<ApiResponse<ProgressReport>>> {
    let video_id: VideoId = video_id.parse()?;
    let report = state
        .engine()
        .progress()
        .report_video_ended(identity.learner_id, video_id)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}
