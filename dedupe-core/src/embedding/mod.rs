//! Embedding providers (component B, §9.5 — supplemented from the
//! original implementation's `embedding/` package).
//!
//! One trait, two implementations: a deterministic stub for tests and
//! local development, and an OpenAI-backed provider for production. Both
//! are constructed once at startup and shared behind an `Arc`, so there
//! is no lazy re-init race the way a per-request client would have.

mod openai;
mod stub;

pub use openai::OpenAiEmbeddingProvider;
pub use stub::StubEmbeddingProvider;

use async_trait::async_trait;

use crate::error::Result;

/// A computed embedding together with the identity of what produced it.
/// `model` and `provider` are echoed back in `CheckDuplicateResponse` so
/// callers can tell which backend served a given claim (§6).
#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: String,
    pub provider: &'static str,
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute an embedding for `text`. Implementations never return an
    /// empty vector or one of the wrong dimension — any such condition is
    /// surfaced as `DedupeError::EmbeddingFailure` instead.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// The fixed dimensionality this provider produces, used by the
    /// storage layer to size the vector column / validate fallback JSON.
    fn dimensions(&self) -> usize;

    /// Model identifier, reported on every response even when this
    /// request's claim already existed and `embed` was not called.
    fn model_name(&self) -> &str;

    /// Provider identifier ("stub", "openai", ...), same caveat as above.
    fn provider_name(&self) -> &'static str;
}
