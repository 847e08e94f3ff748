use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A port call within a trip. Times are local to the port and naive; the
/// visit window [arrival_time, departure_time] bounds every generated
/// activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreatePortRequest {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
}

impl CreatePortRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        validate_coordinates(self.latitude, self.longitude)?;
        validate_window(self.arrival_time, self.departure_time)
    }

    pub fn into_port(self, trip_id: impl Into<String>) -> Port {
        Port {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.into(),
            name: self.name,
            country: self.country,
            latitude: self.latitude,
            longitude: self.longitude,
            arrival_time: self.arrival_time,
            departure_time: self.departure_time,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePortRequest {
    pub name: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub arrival_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
}

impl UpdatePortRequest {
    /// Applies the partial update, re-checking invariants on the merged
    /// result so a PATCH cannot produce an inverted visit window.
    pub fn apply(self, port: &mut Port) -> Result<(), AppError> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("name must not be empty".into()));
            }
            port.name = name;
        }
        if let Some(country) = self.country {
            port.country = country;
        }
        if let Some(latitude) = self.latitude {
            port.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            port.longitude = longitude;
        }
        if let Some(arrival) = self.arrival_time {
            port.arrival_time = arrival;
        }
        if let Some(departure) = self.departure_time {
            port.departure_time = departure;
        }
        validate_coordinates(port.latitude, port.longitude)?;
        validate_window(port.arrival_time, port.departure_time)
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::Validation(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Validation(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(())
}

fn validate_window(arrival: NaiveDateTime, departure: NaiveDateTime) -> Result<(), AppError> {
    if arrival >= departure {
        return Err(AppError::Validation(
            "arrival_time must be before departure_time".into(),
        ));
    }
    Ok(())
}
