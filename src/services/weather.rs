use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::{config::AppConfig, error::AppError, models::weather::WeatherSnapshot};

/// Forecasts further out than this are simply not available yet; asking for
/// them is a normal outcome, not an error.
pub const FORECAST_HORIZON_DAYS: i64 = 16;

/// Open-Meteo daily forecast client. Keyless and read-only; every failure
/// path degrades to "no snapshot".
#[derive(Clone)]
pub struct WeatherService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<NaiveDate>,
    weather_code: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_probability_max: Vec<Option<u8>>,
}

impl WeatherService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.weather_base_url.clone(),
        }
    }

    pub fn beyond_horizon(date: NaiveDate) -> bool {
        let today = Utc::now().date_naive();
        (date - today).num_days() > FORECAST_HORIZON_DAYS
    }

    /// Fetches the daily forecast for one date. `Ok(None)` covers both the
    /// beyond-horizon case and an upstream without data for that day.
    pub async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Option<WeatherSnapshot>, AppError> {
        if Self::beyond_horizon(date) {
            debug!(%date, "forecast date beyond provider horizon");
            return Ok(None);
        }

        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "daily",
                    "weather_code,temperature_2m_max,temperature_2m_min,\
                     precipitation_probability_max"
                        .to_string(),
                ),
                ("timezone", "UTC".to_string()),
                ("start_date", date.to_string()),
                ("end_date", date.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let forecast: ForecastResponse = response.json().await?;
        let daily = forecast.daily;
        let Some(index) = daily.time.iter().position(|day| *day == date) else {
            debug!(%date, "provider returned no data for date");
            return Ok(None);
        };

        let weather_code = *daily.weather_code.get(index).unwrap_or(&0);
        Ok(Some(WeatherSnapshot {
            date,
            temperature_min: *daily.temperature_2m_min.get(index).unwrap_or(&0.0),
            temperature_max: *daily.temperature_2m_max.get(index).unwrap_or(&0.0),
            precipitation_chance: daily
                .precipitation_probability_max
                .get(index)
                .copied()
                .flatten(),
            weather_code,
            summary: describe_weather_code(weather_code).to_string(),
        }))
    }
}

/// WMO weather interpretation codes, reduced to the buckets a day planner
/// cares about.
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "clear sky",
        1..=3 => "partly cloudy",
        45 | 48 => "fog",
        51..=57 => "drizzle",
        61..=67 => "rain",
        71..=77 => "snow",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95..=99 => "thunderstorm",
        _ => "mixed conditions",
    }
}
