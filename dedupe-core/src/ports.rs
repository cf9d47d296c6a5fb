//! Storage port trait — implemented by `dedupe-postgres`.
//!
//! The core logic (hashing, similarity, classification, coordinator)
//! depends only on this trait, never on `sqlx` directly. This is the
//! "backend duality modeled as a capability, not a branch at every query
//! site" design noted in §9 of the original spec: the native-vector vs.
//! serialized-JSON split lives entirely inside the one `ClaimStore`
//! implementation that inspects the bound dialect at construction time.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ClaimRecord, NeighborMatch};

#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Look up a claim by its content hash (§4.D step 2).
    async fn find_claim_by_hash(&self, content_hash: &str) -> Result<Option<ClaimRecord>>;

    /// Insert a brand-new claim row together with its embedding, as one
    /// atomic transaction (§5 "Transactional discipline": "the embedding
    /// call must be inside the Claim-insert transaction so that an
    /// embedding failure does not leave an orphaned Claim" — §9). The
    /// embedder itself has already run by the time this is called (its
    /// failure is handled by the caller before any row is touched); this
    /// method's job is only to make the claim row and its embedding row
    /// appear together or not at all.
    ///
    /// Returns `Err(DedupeError::RaceLost)` if another request won the
    /// unique-violation race on `content_hash` in the meantime — the
    /// caller re-reads via `find_claim_by_hash` rather than treating this
    /// as fatal.
    async fn insert_claim_with_embedding(
        &self,
        claim_text: &str,
        content_hash: &str,
        embedding_model: &str,
        embedding: &[f32],
    ) -> Result<i64>;

    /// Read back a claim's embedding. Missing is an invariant violation
    /// (§3 invariant 1: every Claim has exactly one ClaimEmbedding) —
    /// implementations return `Err(DedupeError::Invariant)`, never `Ok(None)`.
    async fn fetch_embedding(&self, claim_id: i64) -> Result<Vec<f32>>;

    /// Top-k nearest stored claims to `embedding`, excluding `claim_id`
    /// itself (§4.E). `1 <= k <= 50` is validated by the caller; ties are
    /// broken by ascending `claim_id`.
    async fn top_k_neighbors(
        &self,
        claim_id: i64,
        embedding: &[f32],
        k: u32,
    ) -> Result<Vec<NeighborMatch>>;

    /// Read back a claim's text. Missing is an invariant violation (the
    /// caller always holds a `claim_id` obtained from this same store).
    async fn fetch_claim_text(&self, claim_id: i64) -> Result<String>;

    /// The cluster `claim_id` currently belongs to, if any (§4.G rule 1).
    async fn existing_cluster_of(&self, claim_id: i64) -> Result<Option<i64>>;

    /// The canonical claim id for a cluster. Missing is an invariant
    /// violation (§3 invariant 4).
    async fn canonical_of(&self, cluster_id: i64) -> Result<i64>;

    /// Ensure a cluster exists whose canonical is `canonical_claim_id`,
    /// creating one (and admitting the canonical as its own member with
    /// similarity 1.0) if none exists yet. Returns the cluster id.
    /// Idempotent under concurrent callers (§4.G concurrency).
    async fn ensure_cluster_with_canonical(&self, canonical_claim_id: i64) -> Result<i64>;

    /// Insert `(cluster_id, claim_id, similarity)` using
    /// ignore-on-conflict semantics, so a racing caller that already won
    /// membership for this claim is a silent no-op rather than an error
    /// (§4.G concurrency, §9 design notes: exploit `ON CONFLICT DO NOTHING`).
    async fn add_cluster_member(&self, cluster_id: i64, claim_id: i64, similarity: f64)
        -> Result<()>;
}
