use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: String,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
struct HealthChecks {
    database: &'static str,
    ai_service: &'static str,
}

/// Liveness/readiness. Always 200; degradation is reported in the body so
/// operators and the UI can distinguish "up" from "fully able".
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "healthy",
        Err(err) => {
            warn!("health check: database unhealthy: {err}");
            "unhealthy"
        }
    };
    let ai_service = if state.llm.is_some() {
        "configured"
    } else {
        "not_configured"
    };
    let status = if database == "healthy" && ai_service == "configured" {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        service: "shoreplan",
        timestamp: Utc::now().to_rfc3339(),
        checks: HealthChecks {
            database,
            ai_service,
        },
    })
}
