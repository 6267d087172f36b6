mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use aivis_analyzer::{Extractor, ModelExtractor};
use aivis_providers::{ModelConfig, Provider, ProviderClient, ProviderCredentials};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(aivis_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;
    aivis_db::run_migrations(&pool).await?;

    let credentials = ProviderCredentials {
        openai_api_key: config.openai_api_key.clone(),
        anthropic_api_key: config.anthropic_api_key.clone(),
    };
    let models = ModelConfig {
        openai: config.openai_model.clone(),
        anthropic: config.anthropic_model.clone(),
    };
    let client = Arc::new(ProviderClient::new(
        credentials.clone(),
        models.clone(),
        config.provider_timeout_secs,
    )?);

    let extraction_provider: Provider = config
        .extraction_provider
        .parse()
        .with_context(|| format!("AIVIS_EXTRACTION_PROVIDER={}", config.extraction_provider))?;
    let extraction_client =
        ProviderClient::new(credentials, models, config.provider_timeout_secs)?;
    let extractor: Arc<dyn Extractor> =
        Arc::new(ModelExtractor::new(extraction_client, extraction_provider));

    let state = AppState {
        pool: pool.clone(),
        client: Arc::clone(&client),
        extractor: Arc::clone(&extractor),
        monitor: aivis_monitor::MonitorConfig::from_app_config(&config),
    };

    let _scheduler =
        scheduler::build_scheduler(pool, Arc::clone(&config), client, extractor).await?;

    let auth = AuthState::from_env(matches!(config.env, aivis_core::Environment::Development))?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
