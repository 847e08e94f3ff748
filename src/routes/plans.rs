use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    device::DeviceScope,
    error::AppError,
    models::plan::DayPlan,
    plan::orchestrator::{self, GeneratePlanRequest},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans/generate", post(generate_plan))
        .route("/plans", get(list_plans))
        .route("/plans/:plan_id", get(get_plan).delete(delete_plan))
}

/// Triggers the generation pipeline and returns the persisted plan —
/// success or failed shape — synchronously. A failed generation is a 200
/// with `status: "failed"` and a structured error body, not a 5xx.
///
/// The pipeline runs in its own task: a client that disconnects mid-call
/// does not abort the provider request, and the result is persisted for
/// polling either way.
async fn generate_plan(
    State(state): State<AppState>,
    device: DeviceScope,
    Json(request): Json<GeneratePlanRequest>,
) -> Result<Json<DayPlan>, AppError> {
    let device_id = device.require()?.to_string();
    let task = tokio::spawn(async move {
        orchestrator::generate(&state, &device_id, request).await
    });
    let plan = task
        .await
        .map_err(|err| AppError::Other(anyhow::anyhow!("generation task failed: {err}")))??;
    Ok(Json(plan))
}

#[derive(Debug, Default, Deserialize)]
struct PlanFilter {
    trip_id: Option<String>,
    port_id: Option<String>,
}

async fn list_plans(
    State(state): State<AppState>,
    device: DeviceScope,
    Query(filter): Query<PlanFilter>,
) -> Result<Json<Vec<DayPlan>>, AppError> {
    let Some(device_id) = device.existing() else {
        return Ok(Json(Vec::new()));
    };
    let plans = state
        .store
        .list_plans(device_id, filter.trip_id.as_deref(), filter.port_id.as_deref())
        .await?;
    Ok(Json(plans))
}

async fn get_plan(
    State(state): State<AppState>,
    device: DeviceScope,
    Path(plan_id): Path<String>,
) -> Result<Json<DayPlan>, AppError> {
    let device_id = device.require()?;
    let plan = state
        .store
        .get_plan(&plan_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(plan))
}

async fn delete_plan(
    State(state): State<AppState>,
    device: DeviceScope,
    Path(plan_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let device_id = device.require()?;
    if !state.store.delete_plan(&plan_id, device_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "message": "plan deleted", "plan_id": plan_id })))
}
