use serde::{de::DeserializeOwned, Serialize};
use sqlx::Row;

use crate::{
    db::DbPool,
    error::AppError,
    models::{plan::DayPlan, port::Port, trip::Trip},
};

const ENTITY_TRIP: &str = "trip";
const ENTITY_PORT: &str = "port";
const ENTITY_PLAN: &str = "plan";

const TRIP_SK: &str = "METADATA";

fn trip_pk(trip_id: &str) -> String {
    format!("TRIP#{trip_id}")
}

fn port_sk(port_id: &str) -> String {
    format!("PORT#{port_id}")
}

/// Plans sort under PLAN#{port_id}, not a plan id of their own: the
/// one-plan-per-(trip, port) invariant becomes a primary-key fact and a
/// regeneration is a plain key overwrite.
fn plan_sk(port_id: &str) -> String {
    format!("PLAN#{port_id}")
}

fn device_gsi(device_id: &str) -> String {
    format!("DEVICE#{device_id}")
}

/// Single-table data access layer. Every entity lives in `records` as one
/// JSON document under a composite (pk, sk) key; (gsi1pk, entity_type,
/// gsi1sk) is the secondary index for device-scoped listing. Cross-device
/// reads are indistinguishable from misses.
#[derive(Clone)]
pub struct StoreService {
    pool: DbPool,
}

impl StoreService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn put_record<T: Serialize>(
        &self,
        pk: &str,
        sk: &str,
        entity_type: &str,
        device_id: &str,
        gsi1sk: &str,
        entity: &T,
    ) -> Result<(), AppError> {
        let document =
            serde_json::to_string(entity).map_err(|err| AppError::Other(err.into()))?;
        sqlx::query(
            "INSERT OR REPLACE INTO records \
             (pk, sk, entity_type, device_id, gsi1pk, gsi1sk, document) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(pk)
        .bind(sk)
        .bind(entity_type)
        .bind(device_id)
        .bind(device_gsi(device_id))
        .bind(gsi1sk)
        .bind(document)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_record<T: DeserializeOwned>(
        &self,
        pk: &str,
        sk: &str,
        device_id: &str,
    ) -> Result<Option<T>, AppError> {
        let row = sqlx::query(
            "SELECT document FROM records WHERE pk = ? AND sk = ? AND device_id = ?",
        )
        .bind(pk)
        .bind(sk)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            let document: String = row.get("document");
            serde_json::from_str(&document).map_err(|err| AppError::Other(err.into()))
        })
        .transpose()
    }

    // --- Trips ---

    pub async fn create_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.put_record(
            &trip_pk(&trip.id),
            TRIP_SK,
            ENTITY_TRIP,
            &trip.device_id,
            &trip.created_at.to_rfc3339(),
            trip,
        )
        .await
    }

    pub async fn get_trip(&self, trip_id: &str, device_id: &str) -> Result<Option<Trip>, AppError> {
        self.get_record(&trip_pk(trip_id), TRIP_SK, device_id).await
    }

    pub async fn list_trips(
        &self,
        device_id: &str,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Trip>, AppError> {
        let rows = sqlx::query(
            "SELECT document FROM records \
             WHERE gsi1pk = ? AND entity_type = ? \
             ORDER BY gsi1sk DESC LIMIT ? OFFSET ?",
        )
        .bind(device_gsi(device_id))
        .bind(ENTITY_TRIP)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let document: String = row.get("document");
                serde_json::from_str(&document).map_err(|err| AppError::Other(err.into()))
            })
            .collect()
    }

    pub async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.create_trip(trip).await
    }

    /// Deletes the trip and, because ports and plans share its partition,
    /// every child record in one statement.
    pub async fn delete_trip(&self, trip_id: &str, device_id: &str) -> Result<bool, AppError> {
        if self.get_trip(trip_id, device_id).await?.is_none() {
            return Ok(false);
        }
        sqlx::query("DELETE FROM records WHERE pk = ?")
            .bind(trip_pk(trip_id))
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    // --- Ports ---

    pub async fn put_port(&self, port: &Port, device_id: &str) -> Result<(), AppError> {
        self.put_record(
            &trip_pk(&port.trip_id),
            &port_sk(&port.id),
            ENTITY_PORT,
            device_id,
            &port.arrival_time.to_string(),
            port,
        )
        .await
    }

    pub async fn get_port(
        &self,
        trip_id: &str,
        port_id: &str,
        device_id: &str,
    ) -> Result<Option<Port>, AppError> {
        self.get_record(&trip_pk(trip_id), &port_sk(port_id), device_id)
            .await
    }

    pub async fn list_ports(&self, trip_id: &str, device_id: &str) -> Result<Vec<Port>, AppError> {
        let rows = sqlx::query(
            "SELECT document FROM records \
             WHERE pk = ? AND entity_type = ? AND device_id = ? \
             ORDER BY gsi1sk ASC",
        )
        .bind(trip_pk(trip_id))
        .bind(ENTITY_PORT)
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let document: String = row.get("document");
                serde_json::from_str(&document).map_err(|err| AppError::Other(err.into()))
            })
            .collect()
    }

    /// Removes a port and any plan generated for it.
    pub async fn delete_port(
        &self,
        trip_id: &str,
        port_id: &str,
        device_id: &str,
    ) -> Result<bool, AppError> {
        if self.get_port(trip_id, port_id, device_id).await?.is_none() {
            return Ok(false);
        }
        sqlx::query("DELETE FROM records WHERE pk = ? AND sk IN (?, ?)")
            .bind(trip_pk(trip_id))
            .bind(port_sk(port_id))
            .bind(plan_sk(port_id))
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    // --- Plans ---

    /// Last write wins: a regeneration replaces whatever plan the key held,
    /// regardless of its status.
    pub async fn upsert_plan(&self, plan: &DayPlan) -> Result<(), AppError> {
        self.put_record(
            &trip_pk(&plan.trip_id),
            &plan_sk(&plan.port_id),
            ENTITY_PLAN,
            &plan.device_id,
            &plan.generated_at.to_rfc3339(),
            plan,
        )
        .await
    }

    pub async fn get_plan_for_port(
        &self,
        trip_id: &str,
        port_id: &str,
        device_id: &str,
    ) -> Result<Option<DayPlan>, AppError> {
        self.get_record(&trip_pk(trip_id), &plan_sk(port_id), device_id)
            .await
    }

    pub async fn get_plan(
        &self,
        plan_id: &str,
        device_id: &str,
    ) -> Result<Option<DayPlan>, AppError> {
        let row = sqlx::query(
            "SELECT document FROM records \
             WHERE entity_type = ? AND device_id = ? \
             AND json_extract(document, '$.id') = ?",
        )
        .bind(ENTITY_PLAN)
        .bind(device_id)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            let document: String = row.get("document");
            serde_json::from_str(&document).map_err(|err| AppError::Other(err.into()))
        })
        .transpose()
    }

    pub async fn list_plans(
        &self,
        device_id: &str,
        trip_id: Option<&str>,
        port_id: Option<&str>,
    ) -> Result<Vec<DayPlan>, AppError> {
        let mut sql = String::from(
            "SELECT document FROM records WHERE gsi1pk = ? AND entity_type = ?",
        );
        if trip_id.is_some() {
            sql.push_str(" AND pk = ?");
        }
        if port_id.is_some() {
            sql.push_str(" AND sk = ?");
        }
        sql.push_str(" ORDER BY gsi1sk DESC");

        let mut query = sqlx::query(&sql)
            .bind(device_gsi(device_id))
            .bind(ENTITY_PLAN);
        if let Some(trip_id) = trip_id {
            query = query.bind(trip_pk(trip_id));
        }
        if let Some(port_id) = port_id {
            query = query.bind(plan_sk(port_id));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let document: String = row.get("document");
                serde_json::from_str(&document).map_err(|err| AppError::Other(err.into()))
            })
            .collect()
    }

    pub async fn delete_plan(&self, plan_id: &str, device_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM records \
             WHERE entity_type = ? AND device_id = ? \
             AND json_extract(document, '$.id') = ?",
        )
        .bind(ENTITY_PLAN)
        .bind(device_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        plan::{DayPlan, PlanStatus},
        port::CreatePortRequest,
        preferences::{ActivityLevel, Budget, PartyType, Preferences, TransportMode},
        trip::Trip,
    };
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> StoreService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        StoreService::new(pool)
    }

    fn preferences() -> Preferences {
        Preferences {
            party_type: PartyType::Couple,
            activity_level: ActivityLevel::Moderate,
            transport_mode: TransportMode::Mixed,
            budget: Budget::Medium,
            currency: "EUR".into(),
        }
    }

    fn barcelona(trip_id: &str) -> crate::models::port::Port {
        let day = NaiveDate::from_ymd_opt(2026, 5, 14).unwrap();
        CreatePortRequest {
            name: "Barcelona".into(),
            country: "Spain".into(),
            latitude: 41.38,
            longitude: 2.18,
            arrival_time: day.and_hms_opt(8, 0, 0).unwrap(),
            departure_time: day.and_hms_opt(18, 0, 0).unwrap(),
        }
        .into_port(trip_id)
    }

    #[tokio::test]
    async fn trips_are_invisible_across_devices() {
        let store = store().await;
        let trip = Trip::new("device-a", "Symphony", None);
        store.create_trip(&trip).await.unwrap();

        assert!(store.get_trip(&trip.id, "device-a").await.unwrap().is_some());
        assert!(store.get_trip(&trip.id, "device-b").await.unwrap().is_none());
        assert!(store.list_trips("device-b", 0, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_trips_is_newest_first_and_paginated() {
        let store = store().await;
        let mut ids = Vec::new();
        for n in 0..3 {
            let mut trip = Trip::new("device-a", format!("Ship {n}"), None);
            trip.created_at = trip.created_at + chrono::Duration::seconds(n);
            store.create_trip(&trip).await.unwrap();
            ids.push(trip.id);
        }
        let listed = store.list_trips("device-a", 0, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, ids[2]);

        let rest = store.list_trips("device-a", 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);
    }

    #[tokio::test]
    async fn plan_upsert_keeps_exactly_one_plan_per_port() {
        let store = store().await;
        let trip = Trip::new("device-a", "Symphony", None);
        store.create_trip(&trip).await.unwrap();
        let port = barcelona(&trip.id);
        store.put_port(&port, "device-a").await.unwrap();

        let first = DayPlan::succeeded(&trip.id, &port.id, "device-a", preferences(), vec![], None);
        store.upsert_plan(&first).await.unwrap();
        let second = DayPlan::failed(
            &trip.id,
            &port.id,
            "device-a",
            preferences(),
            None,
            crate::models::plan::PlanErrorDetail {
                error: "ai_service_timeout".into(),
                message: "timed out".into(),
                troubleshooting: "retry".into(),
                retry_after: None,
            },
        );
        store.upsert_plan(&second).await.unwrap();

        let plans = store.list_plans("device-a", Some(&trip.id), None).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, second.id);
        assert_eq!(plans[0].status, PlanStatus::Failed);
    }

    #[tokio::test]
    async fn deleting_a_trip_cascades_to_ports_and_plans() {
        let store = store().await;
        let trip = Trip::new("device-a", "Symphony", None);
        store.create_trip(&trip).await.unwrap();
        let port = barcelona(&trip.id);
        store.put_port(&port, "device-a").await.unwrap();
        let plan = DayPlan::succeeded(&trip.id, &port.id, "device-a", preferences(), vec![], None);
        store.upsert_plan(&plan).await.unwrap();

        assert!(store.delete_trip(&trip.id, "device-a").await.unwrap());
        assert!(store.get_port(&trip.id, &port.id, "device-a").await.unwrap().is_none());
        assert!(store
            .get_plan_for_port(&trip.id, &port.id, "device-a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn deleting_a_port_removes_its_plan() {
        let store = store().await;
        let trip = Trip::new("device-a", "Symphony", None);
        store.create_trip(&trip).await.unwrap();
        let port = barcelona(&trip.id);
        store.put_port(&port, "device-a").await.unwrap();
        let plan = DayPlan::succeeded(&trip.id, &port.id, "device-a", preferences(), vec![], None);
        store.upsert_plan(&plan).await.unwrap();

        assert!(store.delete_port(&trip.id, &port.id, "device-a").await.unwrap());
        assert!(store
            .get_plan_for_port(&trip.id, &port.id, "device-a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn plan_lookup_by_id_is_device_scoped() {
        let store = store().await;
        let trip = Trip::new("device-a", "Symphony", None);
        store.create_trip(&trip).await.unwrap();
        let port = barcelona(&trip.id);
        store.put_port(&port, "device-a").await.unwrap();
        let plan = DayPlan::succeeded(&trip.id, &port.id, "device-a", preferences(), vec![], None);
        store.upsert_plan(&plan).await.unwrap();

        assert!(store.get_plan(&plan.id, "device-a").await.unwrap().is_some());
        assert!(store.get_plan(&plan.id, "device-b").await.unwrap().is_none());
        assert!(!store.delete_plan(&plan.id, "device-b").await.unwrap());
        assert!(store.delete_plan(&plan.id, "device-a").await.unwrap());
    }
}
