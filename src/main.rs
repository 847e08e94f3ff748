use std::sync::Arc;

use shoreplan::config::AppConfig;
use shoreplan::db::init_pool;
use shoreplan::error::AppError;
use shoreplan::routes::create_router;
use shoreplan::services::llm::{GroqClient, LlmBackend};
use shoreplan::state::AppState;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;

    if let Err(err) = sqlx::migrate!("./migrations").run(&db).await {
        error!("migration failed: {err:?}");
        return Err(AppError::Other(err.into()));
    }

    let llm: Option<Arc<dyn LlmBackend>> = match GroqClient::from_config(&config) {
        Some(client) => {
            info!(model = %config.groq_model, "generation provider configured");
            Some(Arc::new(client))
        }
        None => {
            warn!("GROQ_API_KEY not set; plan generation will report not_configured");
            None
        }
    };

    let state = AppState::new(config.clone(), db, llm);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,shoreplan=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
