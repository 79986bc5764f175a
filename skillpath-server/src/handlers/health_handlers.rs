use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<Value>) {
    let mut health_status = json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {}
    });

    let mut is_unhealthy = false;

    match state.postgres.as_ref() {
        Some(postgres) => match postgres.health_check().await {
            Ok(()) => {
                health_status["checks"]["database"] = json!({
                    "status": "healthy",
                    "type": "postgres"
                });
            }
            Err(e) => {
                health_status["checks"]["database"] = json!({
                    "status": "unhealthy",
                    "error": e.to_string()
                });
                is_unhealthy = true;
            }
        },
        None => {
            health_status["checks"]["database"] = json!({
                "status": "healthy",
                "type": "memory"
            });
        }
    }

    health_status["mode"] = json!(if state.config().dev_mode {
        "development"
    } else {
        "production"
    });

    health_status["checks"]["tracking"] = json!({
        "watched_threshold": state.engine().policy().watched_threshold()
    });

    if is_unhealthy {
        health_status["status"] = json!("unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, Json(health_status))
    } else {
        (StatusCode::OK, Json(health_status))
    }
}
