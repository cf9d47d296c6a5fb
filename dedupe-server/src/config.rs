//! Environment-driven configuration (§6 CONFIGURATION), read once at
//! startup — `dotenvy::dotenv().ok()` first so a local `.env` is picked up
//! in dev without affecting a real deployment, then `std::env::var` reads
//! with `.expect(...)` on the required keys, the same fail-fast style as
//! `sem_os_server::main`.

use dedupe_core::classifier::Thresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub embeddings_provider: EmbeddingsProviderKind,
    pub embeddings_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub thresholds: Thresholds,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingsProviderKind {
    Stub,
    OpenAi,
}

impl Config {
    /// Load from the process environment. Panics (fail fast, per §9) on a
    /// missing `DATABASE_URL` or an `EMBEDDINGS_PROVIDER=openai` without a
    /// paired `OPENAI_API_KEY` — both are misconfigurations no request
    /// should be served under.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let embeddings_provider = match std::env::var("EMBEDDINGS_PROVIDER")
            .unwrap_or_else(|_| "stub".to_string())
            .as_str()
        {
            "stub" => EmbeddingsProviderKind::Stub,
            "openai" => EmbeddingsProviderKind::OpenAi,
            other => panic!("invalid EMBEDDINGS_PROVIDER={other}"),
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        if embeddings_provider == EmbeddingsProviderKind::OpenAi && openai_api_key.is_none() {
            panic!("OPENAI_API_KEY must be set when EMBEDDINGS_PROVIDER=openai");
        }

        let embeddings_model = std::env::var("EMBEDDINGS_MODEL").ok();

        let duplicate = parse_f64_env("DUPLICATE_THRESHOLD", 0.95);
        let near_duplicate = parse_f64_env("NEAR_DUPLICATE_THRESHOLD", 0.85);

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8081);

        Self {
            database_url,
            embeddings_provider,
            embeddings_model,
            openai_api_key,
            thresholds: Thresholds::new(duplicate, near_duplicate),
            port,
        }
    }
}

fn parse_f64_env(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
