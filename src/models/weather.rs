use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily forecast for a port call, captured at generation time. Best-effort:
/// a plan without one is still complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub date: NaiveDate,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub precipitation_chance: Option<u8>,
    pub weather_code: i32,
    pub summary: String,
}
