use std::error::Error;
use std::sync::Arc;

use ai_llm_service::telemetry;
use contextor::{Contextor, ContextorConfig};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file; a missing file is fine.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .init();

    let cfg = ContextorConfig::from_env()?;
    info!(
        backend = ?cfg.backend,
        data_directory = %cfg.rag.data_directory.display(),
        vector_store = %cfg.rag.vector_store_uri,
        "starting doc-chat-backend"
    );

    let contextor = Contextor::bootstrap(cfg).await?;
    let state = Arc::new(api::AppState::new(&contextor));

    api::start(state).await?;

    Ok(())
}
