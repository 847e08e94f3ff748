use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{llm::LlmBackend, store::StoreService, weather::WeatherService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub store: StoreService,
    pub weather: WeatherService,
    /// Absent when no credential is configured; generation requests then
    /// persist an `ai_service_not_configured` failure.
    pub llm: Option<Arc<dyn LlmBackend>>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, llm: Option<Arc<dyn LlmBackend>>) -> Self {
        let store = StoreService::new(db.clone());
        let weather = WeatherService::new(&config);
        Self {
            config,
            db,
            store,
            weather,
            llm,
        }
    }
}
