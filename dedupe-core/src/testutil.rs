//! In-memory `ClaimStore` fake used by unit tests in this crate. Lets
//! `cluster.rs` and `coordinator.rs` be exercised without a database,
//! mirroring the teacher workspace's preference for a fake adapter over
//! mocking the port trait itself.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embedding::{EmbeddingProvider, StubEmbeddingProvider};
use crate::error::{DedupeError, Result};
use crate::hashing::content_hash;
use crate::ports::ClaimStore;
use crate::similarity::cosine_similarity;
use crate::types::{ClaimRecord, NeighborMatch};

struct ClaimRow {
    text: String,
    hash: String,
    embedding: Vec<f32>,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Default)]
struct State {
    claims: HashMap<i64, ClaimRow>,
    next_claim_id: i64,
    clusters: HashMap<i64, i64>, // cluster_id -> canonical_claim_id
    next_cluster_id: i64,
    membership: HashMap<i64, i64>, // claim_id -> cluster_id
}

pub struct InMemoryClaimStore {
    state: Mutex<State>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Insert a claim directly (bypassing `upsertClaim`'s race-retry
    /// plumbing) with a stub-provider embedding, for test setup.
    pub async fn seed_claim(&self, text: &str) -> i64 {
        let embedding = StubEmbeddingProvider::new().embed(text).await.unwrap().vector;
        let hash = content_hash(text);
        let mut state = self.state.lock().unwrap();
        state.next_claim_id += 1;
        let claim_id = state.next_claim_id;
        state.claims.insert(
            claim_id,
            ClaimRow {
                text: text.to_string(),
                hash,
                embedding,
                created_at: chrono::Utc::now(),
            },
        );
        claim_id
    }
}

impl Default for InMemoryClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn find_claim_by_hash(&self, content_hash: &str) -> Result<Option<ClaimRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .claims
            .iter()
            .find(|(_, row)| row.hash == content_hash)
            .map(|(&claim_id, row)| ClaimRecord {
                claim_id,
                claim_text: row.text.clone(),
                content_hash: row.hash.clone(),
                created_at: row.created_at,
            }))
    }

    async fn insert_claim_with_embedding(
        &self,
        claim_text: &str,
        content_hash: &str,
        _embedding_model: &str,
        embedding: &[f32],
    ) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if state.claims.values().any(|row| row.hash == content_hash) {
            return Err(DedupeError::RaceLost(content_hash.to_string()));
        }
        state.next_claim_id += 1;
        let claim_id = state.next_claim_id;
        state.claims.insert(
            claim_id,
            ClaimRow {
                text: claim_text.to_string(),
                hash: content_hash.to_string(),
                embedding: embedding.to_vec(),
                created_at: chrono::Utc::now(),
            },
        );
        Ok(claim_id)
    }

    async fn fetch_embedding(&self, claim_id: i64) -> Result<Vec<f32>> {
        let state = self.state.lock().unwrap();
        state
            .claims
            .get(&claim_id)
            .map(|row| row.embedding.clone())
            .ok_or_else(|| DedupeError::Invariant(format!("no embedding for claim {claim_id}")))
    }

    async fn top_k_neighbors(
        &self,
        claim_id: i64,
        embedding: &[f32],
        k: u32,
    ) -> Result<Vec<NeighborMatch>> {
        let state = self.state.lock().unwrap();
        let mut scored: Vec<NeighborMatch> = Vec::new();
        for (&other_id, row) in state.claims.iter() {
            if other_id == claim_id {
                continue;
            }
            let similarity = cosine_similarity(embedding, &row.embedding)?;
            scored.push(NeighborMatch {
                claim_id: other_id,
                text: row.text.clone(),
                similarity,
            });
        }
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap()
                .then_with(|| a.claim_id.cmp(&b.claim_id))
        });
        scored.truncate(k as usize);
        Ok(scored)
    }

    async fn fetch_claim_text(&self, claim_id: i64) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .claims
            .get(&claim_id)
            .map(|row| row.text.clone())
            .ok_or_else(|| DedupeError::Invariant(format!("no such claim {claim_id}")))
    }

    async fn existing_cluster_of(&self, claim_id: i64) -> Result<Option<i64>> {
        let state = self.state.lock().unwrap();
        Ok(state.membership.get(&claim_id).copied())
    }

    async fn canonical_of(&self, cluster_id: i64) -> Result<i64> {
        let state = self.state.lock().unwrap();
        state
            .clusters
            .get(&cluster_id)
            .copied()
            .ok_or_else(|| DedupeError::Invariant(format!("no such cluster {cluster_id}")))
    }

    async fn ensure_cluster_with_canonical(&self, canonical_claim_id: i64) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(cluster_id) = state.membership.get(&canonical_claim_id).copied() {
            return Ok(cluster_id);
        }
        state.next_cluster_id += 1;
        let cluster_id = state.next_cluster_id;
        state.clusters.insert(cluster_id, canonical_claim_id);
        state.membership.insert(canonical_claim_id, cluster_id);
        Ok(cluster_id)
    }

    async fn add_cluster_member(
        &self,
        cluster_id: i64,
        claim_id: i64,
        _similarity: f64,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.membership.entry(claim_id).or_insert(cluster_id);
        Ok(())
    }
}
