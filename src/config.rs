use std::{env, net::SocketAddr, time::Duration};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub llm_timeout: Duration,
    pub invalid_response_retries: u32,
    pub weather_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://shoreplan.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let groq_api_key = env::var("GROQ_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let groq_model =
            env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());

        let llm_timeout_secs: u64 = env::var("LLM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid LLM_TIMEOUT_SECS: {err}")))?;

        // Policy knob for re-querying the model once when its output fails
        // validation. 0 (the default) surfaces the failure immediately.
        let invalid_response_retries: u32 = env::var("LLM_INVALID_RESPONSE_RETRIES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|err| {
                AppError::Config(format!("invalid LLM_INVALID_RESPONSE_RETRIES: {err}"))
            })?;

        let weather_base_url = env::var("WEATHER_BASE_URL")
            .unwrap_or_else(|_| "https://api.open-meteo.com".to_string());

        Ok(Self {
            database_url,
            listen_addr,
            allowed_origins,
            groq_api_key,
            groq_model,
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            invalid_response_retries: invalid_response_retries.min(1),
            weather_base_url,
        })
    }
}
