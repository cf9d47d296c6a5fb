//! dedupe-server — standalone REST server for the semantic claim dedupe
//! engine.
//!
//! Reads config from env vars (see `dedupe_server::config::Config`):
//!   DATABASE_URL              — Postgres connection string (required)
//!   EMBEDDINGS_PROVIDER        — "stub" or "openai" (default: stub)
//!   EMBEDDINGS_MODEL           — model identifier override
//!   OPENAI_API_KEY             — required when provider is openai
//!   DUPLICATE_THRESHOLD        — T_dup (default 0.95)
//!   NEAR_DUPLICATE_THRESHOLD   — T_near (default 0.85)
//!   PORT                       — listen port (default 8081)

use std::sync::Arc;

use dedupe_core::embedding::{EmbeddingProvider, OpenAiEmbeddingProvider, StubEmbeddingProvider};
use dedupe_core::ports::ClaimStore;
use dedupe_core::Coordinator;
use dedupe_postgres::PgClaimStore;
use dedupe_server::config::{Config, EmbeddingsProviderKind};
use dedupe_server::router::build_router;
use dedupe_server::state::AppState;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    // RUST_LOG takes priority if set (standard tracing-subscriber convention);
    // otherwise fall back to the simpler LOG_LEVEL knob from §6, then to a
    // sane default.
    let filter = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| "info,dedupe_server=debug".into());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = Config::from_env();

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings_provider {
        EmbeddingsProviderKind::Stub => Arc::new(StubEmbeddingProvider::new()),
        EmbeddingsProviderKind::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .expect("OPENAI_API_KEY must be set when EMBEDDINGS_PROVIDER=openai");
            let provider = match &config.embeddings_model {
                Some(model) => OpenAiEmbeddingProvider::with_model(api_key, model.clone(), 3072)
                    .expect("failed to build OpenAI embedding provider"),
                None => OpenAiEmbeddingProvider::new(api_key)
                    .expect("failed to build OpenAI embedding provider"),
            };
            Arc::new(provider)
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("connected to database");

    let store = PgClaimStore::connect(pool, embedder.dimensions())
        .await
        .expect("failed to bootstrap claim store schema");
    tracing::info!(backend = ?store.backend(), "claim store ready");

    let claim_store: Arc<dyn ClaimStore> = Arc::new(store);
    let coordinator = Arc::new(Coordinator::new(claim_store, embedder, config.thresholds));

    let app = build_router(AppState { coordinator });

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {bind_addr}: {e}"));
    tracing::info!("dedupe-server listening on {bind_addr}");

    axum::serve(listener, app).await.expect("server error");
}
