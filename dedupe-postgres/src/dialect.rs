//! Backend detection: does this Postgres instance have `pgvector` installed?
//!
//! Decided once per `PgClaimStore::connect` call, the way `sem_os_server`
//! decides its JWT config once at startup rather than re-deriving it per
//! request — the result is cheap to carry around (`Copy`) and never changes
//! for the lifetime of a pool.

use sqlx::PgPool;

/// Which shape the `claim_embedding.embedding` column takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    /// Native `vector(D)` column; cosine distance pushed to the engine via
    /// the `<=>` operator (production path).
    Native,
    /// JSON-encoded `float` array in a `TEXT` column; cosine computed
    /// in-process after fetching all candidates (test-only path, §4.E).
    JsonFallback,
}

impl VectorBackend {
    /// Inspect `pg_extension` for a registered `vector` extension. Errors
    /// from the probe query itself (not "extension missing", an actual
    /// connectivity failure) propagate rather than silently assuming a
    /// fallback — a mis-probed backend would otherwise corrupt every
    /// subsequent read.
    pub async fn detect(pool: &PgPool) -> anyhow::Result<Self> {
        let installed: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_extension WHERE extname = 'vector')",
        )
        .fetch_one(pool)
        .await?;
        Ok(if installed {
            VectorBackend::Native
        } else {
            VectorBackend::JsonFallback
        })
    }
}
