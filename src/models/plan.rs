use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{preferences::Preferences, weather::WeatherSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One stop in a day plan. `order` is 1-based and contiguous; the validator
/// guarantees that before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub order: u32,
    pub name: String,
    pub description: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cost_estimate: String,
    pub booking_url: Option<String>,
    pub tips: Option<String>,
    pub transport_to_next: Option<String>,
    pub travel_time_to_next: Option<u32>,
}

/// Structured failure detail persisted with a failed plan, mirroring the
/// wire error shape so clients can poll and display it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanErrorDetail {
    pub error: String,
    pub message: String,
    pub troubleshooting: String,
    pub retry_after: Option<u64>,
}

/// A generated itinerary for one port call. Replaced wholesale on
/// regeneration, never mutated field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub id: String,
    pub trip_id: String,
    pub port_id: String,
    pub device_id: String,
    pub preferences: Preferences,
    pub generated_at: DateTime<Utc>,
    pub status: PlanStatus,
    pub activities: Vec<Activity>,
    pub weather: Option<WeatherSnapshot>,
    pub error: Option<PlanErrorDetail>,
}

impl DayPlan {
    pub fn succeeded(
        trip_id: impl Into<String>,
        port_id: impl Into<String>,
        device_id: impl Into<String>,
        preferences: Preferences,
        activities: Vec<Activity>,
        weather: Option<WeatherSnapshot>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.into(),
            port_id: port_id.into(),
            device_id: device_id.into(),
            preferences,
            generated_at: Utc::now(),
            status: PlanStatus::Succeeded,
            activities,
            weather,
            error: None,
        }
    }

    pub fn failed(
        trip_id: impl Into<String>,
        port_id: impl Into<String>,
        device_id: impl Into<String>,
        preferences: Preferences,
        weather: Option<WeatherSnapshot>,
        error: PlanErrorDetail,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.into(),
            port_id: port_id.into(),
            device_id: device_id.into(),
            preferences,
            generated_at: Utc::now(),
            status: PlanStatus::Failed,
            activities: Vec::new(),
            weather,
            error: Some(error),
        }
    }
}
