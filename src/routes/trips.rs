use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    device::{redact, DeviceScope, DEVICE_HEADER},
    error::AppError,
    models::{
        port::{CreatePortRequest, UpdatePortRequest},
        trip::{CreateTripRequest, Trip, TripWithPorts, UpdateTripRequest},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route(
            "/trips/:trip_id",
            get(get_trip).patch(update_trip).delete(delete_trip),
        )
        .route("/trips/:trip_id/ports", post(create_port))
        .route(
            "/trips/:trip_id/ports/:port_id",
            patch(update_port).delete(delete_port),
        )
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "Pagination::default_limit")]
    pub limit: u32,
}

impl Pagination {
    fn default_limit() -> u32 {
        100
    }
}

async fn create_trip(
    State(state): State<AppState>,
    device: DeviceScope,
    Json(request): Json<CreateTripRequest>,
) -> Result<Response, AppError> {
    request.validate()?;
    let resolved = device.resolve_or_mint();
    let trip = Trip::new(&resolved.id, request.ship_name.trim(), request.cruise_line);
    state.store.create_trip(&trip).await?;
    info!(device = %redact(&resolved.id), trip_id = %trip.id, "created trip");

    // A minted id must reach the client so it can scope future requests.
    Ok(([(DEVICE_HEADER, resolved.id)], Json(trip)).into_response())
}

async fn list_trips(
    State(state): State<AppState>,
    device: DeviceScope,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let Some(device_id) = device.existing() else {
        return Ok(Json(Vec::new()));
    };
    let trips = state.store.list_trips(device_id, page.skip, page.limit).await?;
    Ok(Json(trips))
}

async fn get_trip(
    State(state): State<AppState>,
    device: DeviceScope,
    Path(trip_id): Path<String>,
) -> Result<Json<TripWithPorts>, AppError> {
    let device_id = device.require()?;
    let trip = state
        .store
        .get_trip(&trip_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut ports = state.store.list_ports(&trip_id, device_id).await?;
    ports.sort_by_key(|port| port.arrival_time);
    Ok(Json(TripWithPorts { trip, ports }))
}

async fn update_trip(
    State(state): State<AppState>,
    device: DeviceScope,
    Path(trip_id): Path<String>,
    Json(request): Json<UpdateTripRequest>,
) -> Result<Json<Trip>, AppError> {
    request.validate()?;
    let device_id = device.require()?;
    let mut trip = state
        .store
        .get_trip(&trip_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if let Some(ship_name) = request.ship_name {
        trip.ship_name = ship_name.trim().to_string();
    }
    if let Some(cruise_line) = request.cruise_line {
        trip.cruise_line = Some(cruise_line);
    }
    trip.updated_at = Utc::now();
    state.store.update_trip(&trip).await?;
    Ok(Json(trip))
}

async fn delete_trip(
    State(state): State<AppState>,
    device: DeviceScope,
    Path(trip_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let device_id = device.require()?;
    if !state.store.delete_trip(&trip_id, device_id).await? {
        return Err(AppError::NotFound);
    }
    info!(device = %redact(device_id), trip_id = %trip_id, "deleted trip");
    Ok(Json(json!({ "message": "trip deleted", "trip_id": trip_id })))
}

async fn create_port(
    State(state): State<AppState>,
    device: DeviceScope,
    Path(trip_id): Path<String>,
    Json(request): Json<CreatePortRequest>,
) -> Result<Json<crate::models::port::Port>, AppError> {
    request.validate()?;
    let device_id = device.require()?;
    // The port can only hang off a trip this device owns.
    state
        .store
        .get_trip(&trip_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let port = request.into_port(&trip_id);
    state.store.put_port(&port, device_id).await?;
    Ok(Json(port))
}

async fn update_port(
    State(state): State<AppState>,
    device: DeviceScope,
    Path((trip_id, port_id)): Path<(String, String)>,
    Json(request): Json<UpdatePortRequest>,
) -> Result<Json<crate::models::port::Port>, AppError> {
    let device_id = device.require()?;
    let mut port = state
        .store
        .get_port(&trip_id, &port_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;
    request.apply(&mut port)?;
    state.store.put_port(&port, device_id).await?;
    Ok(Json(port))
}

async fn delete_port(
    State(state): State<AppState>,
    device: DeviceScope,
    Path((trip_id, port_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let device_id = device.require()?;
    if !state.store.delete_port(&trip_id, &port_id, device_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "message": "port deleted", "port_id": port_id })))
}
