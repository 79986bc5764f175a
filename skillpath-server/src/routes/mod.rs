pub mod v1;

use axum::Router;

use crate::infra::app_state::AppState;

/// Create the API router with all versioned routes.
///
/// Route constants carry the full `/api/v1` prefix, so the versioned router
/// is merged rather than nested.
pub fn create_api_router() -> Router<AppState> {
    Router::new().merge(v1::create_v1_router())
}
