use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    device::redact,
    error::AppError,
    models::{
        plan::{Activity, DayPlan, PlanErrorDetail},
        port::Port,
        preferences::Preferences,
        weather::WeatherSnapshot,
    },
    plan::{prompt, validator},
    services::{affiliate, llm::LlmBackend, llm::LlmError, weather::WeatherService},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub trip_id: String,
    pub port_id: String,
    pub preferences: Preferences,
}

/// Runs one generation request end to end: ownership checks, prompt
/// construction, the provider call (with the weather lookup alongside),
/// validation, and persistence. Failures from the provider or the
/// validator are recovered into a persisted `failed` plan so the client
/// always has something to poll; only a missing trip/port surfaces as an
/// error response.
pub async fn generate(
    state: &AppState,
    device_id: &str,
    request: GeneratePlanRequest,
) -> Result<DayPlan, AppError> {
    let trip = state
        .store
        .get_trip(&request.trip_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let port = state
        .store
        .get_port(&request.trip_id, &request.port_id, device_id)
        .await?
        .ok_or(AppError::NotFound)?;

    debug!(device = %redact(device_id), port = %port.name, "building prompt");
    let rendered = prompt::render(&trip, &port, &request.preferences, None);

    // The forecast and the generation call are independent; run them
    // together and only persist once both have settled.
    let (weather, outcome) = tokio::join!(
        fetch_weather(&state.weather, &port),
        run_generation(state, &port, &rendered),
    );

    let plan = match outcome {
        Ok(mut activities) => {
            affiliate::rewrite_booking_urls(&mut activities);
            info!(
                device = %redact(device_id),
                port = %port.name,
                activities = activities.len(),
                "day plan generated"
            );
            DayPlan::succeeded(
                &request.trip_id,
                &request.port_id,
                device_id,
                request.preferences,
                activities,
                weather,
            )
        }
        Err(detail) => {
            warn!(
                device = %redact(device_id),
                port = %port.name,
                kind = %detail.error,
                "day plan generation failed"
            );
            DayPlan::failed(
                &request.trip_id,
                &request.port_id,
                device_id,
                request.preferences,
                weather,
                detail,
            )
        }
    };

    state.store.upsert_plan(&plan).await?;
    Ok(plan)
}

/// Provider call plus validation, with the configured (0 or 1) retry on an
/// invalid response. Quota, timeout and upstream failures are never
/// retried here — re-spending budget on those is the client's call.
async fn run_generation(
    state: &AppState,
    port: &Port,
    rendered_prompt: &str,
) -> Result<Vec<Activity>, PlanErrorDetail> {
    let Some(llm) = state.llm.as_deref() else {
        return Err(classify_llm_error(&LlmError::NotConfigured));
    };

    let attempts = 1 + state.config.invalid_response_retries;
    let mut last_error = None;
    for attempt in 0..attempts {
        let raw = llm
            .complete(prompt::SYSTEM_INSTRUCTION, rendered_prompt)
            .await
            .map_err(|err| classify_llm_error(&err))?;

        match validator::parse_plan(&raw, port.arrival_time, port.departure_time) {
            Ok(activities) => return Ok(activities),
            Err(err) => {
                warn!(attempt, error = %err, "model response failed validation");
                last_error = Some(err);
            }
        }
    }

    let reason = last_error.expect("at least one attempt was made");
    Err(PlanErrorDetail {
        error: "ai_service_invalid_response".to_string(),
        message: "The AI service returned a plan that could not be understood. \
                  Trying again may help, but is not guaranteed to."
            .to_string(),
        troubleshooting: format!("Validator rejected the model output: {reason}"),
        retry_after: None,
    })
}

async fn fetch_weather(weather: &WeatherService, port: &Port) -> Option<WeatherSnapshot> {
    match weather
        .forecast(port.latitude, port.longitude, port.arrival_time.date())
        .await
    {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!("weather lookup failed: {err}");
            None
        }
    }
}

fn classify_llm_error(err: &LlmError) -> PlanErrorDetail {
    match err {
        LlmError::NotConfigured => PlanErrorDetail {
            error: "ai_service_not_configured".to_string(),
            message: "AI service is not configured. Please contact your administrator."
                .to_string(),
            troubleshooting: "Administrators: set the GROQ_API_KEY environment variable \
                              with a valid Groq API key."
                .to_string(),
            retry_after: None,
        },
        LlmError::QuotaExceeded { retry_after } => PlanErrorDetail {
            error: "ai_service_quota_exceeded".to_string(),
            message: "The AI service has reached its usage quota. This is temporary - \
                      please try again in a few minutes."
                .to_string(),
            troubleshooting: "Administrators: check the provider console for API quotas."
                .to_string(),
            retry_after: *retry_after,
        },
        LlmError::Timeout(budget) => PlanErrorDetail {
            error: "ai_service_timeout".to_string(),
            message: "The AI service did not answer in time. It is safe to retry once."
                .to_string(),
            troubleshooting: format!(
                "No response within {}s; consider raising LLM_TIMEOUT_SECS.",
                budget.as_secs()
            ),
            retry_after: None,
        },
        LlmError::Upstream { message } => PlanErrorDetail {
            error: "ai_service_unavailable".to_string(),
            message: "The AI service is temporarily unavailable. Please try again in a \
                      few moments."
                .to_string(),
            troubleshooting: message.clone(),
            retry_after: None,
        },
    }
}
