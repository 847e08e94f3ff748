use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::port::Port};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub device_id: String,
    pub ship_name: String,
    pub cruise_line: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(
        device_id: impl Into<String>,
        ship_name: impl Into<String>,
        cruise_line: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.into(),
            ship_name: ship_name.into(),
            cruise_line,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub ship_name: String,
    pub cruise_line: Option<String>,
}

impl CreateTripRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.ship_name.trim().is_empty() {
            return Err(AppError::Validation("ship_name must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTripRequest {
    pub ship_name: Option<String>,
    pub cruise_line: Option<String>,
}

impl UpdateTripRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.ship_name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("ship_name must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Single-trip reads embed the trip's ports, sorted by arrival time.
#[derive(Debug, Serialize)]
pub struct TripWithPorts {
    #[serde(flatten)]
    pub trip: Trip,
    pub ports: Vec<Port>,
}
