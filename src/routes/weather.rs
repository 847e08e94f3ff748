use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::weather::WeatherSnapshot, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/weather", get(get_weather))
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct WeatherResponse {
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<WeatherSnapshot>,
}

/// Thin proxy to the forecast collaborator. A date beyond the provider's
/// horizon is a normal `available: false`, never an error.
async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherResponse>, AppError> {
    if !(-90.0..=90.0).contains(&params.latitude)
        || !(-180.0..=180.0).contains(&params.longitude)
    {
        return Err(AppError::Validation(
            "latitude/longitude out of range".into(),
        ));
    }

    let forecast = state
        .weather
        .forecast(params.latitude, params.longitude, params.date)
        .await?;
    Ok(Json(WeatherResponse {
        available: forecast.is_some(),
        forecast,
    }))
}
