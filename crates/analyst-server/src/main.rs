//! crypto-analyst HTTP Server
//!
//! Axum-based REST API over the tiered crypto analyst. Conversations live
//! in memory for the lifetime of the process.

mod handlers;
mod state;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{GenerationOptions, LlmProvider};
use agent_runtime::{OpenAiConfig, OpenAiProvider};
use crypto_analyst::persona::{CharacterDirectory, StaticCharacterDirectory};
use crypto_analyst::{
    AnalystConfig, ApiProbe, CapabilityMonitor, CoinGeckoClient, MarketDataProvider, MarketMode,
    MockMarketData,
};

use crate::handlers::{
    cancel_in_flight, create_conversation, delete_conversation, get_conversation, health_check,
    model_status, quick_action, refresh_capabilities, send_message,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/capabilities/refresh", post(refresh_capabilities))
        .route("/api/model", get(model_status))
        .route("/api/conversations", post(create_conversation))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/{id}/messages", post(send_message))
        .route("/api/conversations/{id}/quick", post(quick_action))
        .route("/api/conversations/{id}/in-flight", delete(cancel_in_flight))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AnalystConfig::from_env();

    // Language model: only wired up when a usable credential exists
    let openai = OpenAiConfig::from_env();
    let generation = GenerationOptions::default().with_model(openai.model.clone());
    let llm: Option<Arc<dyn LlmProvider>> = if openai.is_configured() {
        tracing::info!(
            model = %openai.model,
            endpoint = %openai.base_url,
            project_key = openai.is_project_key(),
            "✓ Language model configured"
        );
        Some(Arc::new(OpenAiProvider::from_config(openai)?))
    } else {
        tracing::warn!("⚠ OPENAI_API_KEY missing or malformed - language model tier disabled");
        None
    };

    if let Some(provider) = &llm {
        match provider.list_models().await {
            Ok(models) => tracing::info!(count = models.len(), "✓ Language model reachable"),
            Err(e) => tracing::warn!("⚠ Could not list models: {}", e),
        }
    }

    let market: Arc<dyn MarketDataProvider> = match config.market_mode {
        MarketMode::Live => Arc::new(CoinGeckoClient::new(config.market.clone())?),
        MarketMode::Mock => Arc::new(MockMarketData::new()),
    };
    tracing::info!(provider = market.name(), "Market data source selected");

    let characters: Arc<dyn CharacterDirectory> = Arc::new(StaticCharacterDirectory::default());
    characters
        .character(&config.default_character)
        .with_context(|| format!("default character '{}' not found", config.default_character))?;

    let probe = ApiProbe::new(llm.clone(), Arc::clone(&market), config.probe_timeout);
    let monitor = Arc::new(CapabilityMonitor::new(probe));
    monitor.refresh().await;

    let shutdown = CancellationToken::new();
    let probe_task = config
        .probe_interval
        .map(|interval| Arc::clone(&monitor).spawn_periodic(interval, shutdown.clone()));

    let state = AppState {
        llm,
        generation,
        market,
        monitor,
        characters,
        config: Arc::new(config),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto-analyst server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                              - Health check");
    tracing::info!("  POST   /api/capabilities/refresh            - Re-probe providers");
    tracing::info!("  GET    /api/model                           - Language model status");
    tracing::info!("  POST   /api/conversations                   - Open conversation");
    tracing::info!("  GET    /api/conversations/{{id}}              - Transcript");
    tracing::info!("  DELETE /api/conversations/{{id}}              - Close conversation");
    tracing::info!("  POST   /api/conversations/{{id}}/messages     - Send message");
    tracing::info!("  POST   /api/conversations/{{id}}/quick        - Quick action");
    tracing::info!("  DELETE /api/conversations/{{id}}/in-flight    - Cancel pending reply");

    let stop = shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
            stop.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(task) = probe_task {
        task.await.ok();
    }

    Ok(())
}
