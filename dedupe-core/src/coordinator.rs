//! Dedupe Coordinator (component H) — the single entry point that wires
//! the claim store, embedder, classifier, and cluster assigner into the
//! `checkDuplicate` operation.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::classifier::Thresholds;
use crate::cluster;
use crate::embedding::EmbeddingProvider;
use crate::error::{DedupeError, Result};
use crate::hashing::content_hash;
use crate::ports::ClaimStore;
use crate::types::{CanonicalClaim, CheckDuplicateResponse, UpsertOutcome};

/// Number of times `upsertClaim` re-reads after losing the unique-violation
/// race on `content_hash` before giving up. A loss means another request
/// committed the same hash between our lookup and our insert; one retry
/// is enough to observe it, but we allow a couple more for paranoia under
/// heavy contention.
const MAX_UPSERT_RETRIES: u32 = 3;

pub struct Coordinator {
    store: Arc<dyn ClaimStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    thresholds: Thresholds,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            store,
            embedder,
            thresholds,
        }
    }

    /// `checkDuplicate(text, top_k) -> response` (§4.H).
    pub async fn check_duplicate(&self, text: &str, top_k: u32) -> Result<CheckDuplicateResponse> {
        if text.trim().is_empty() {
            return Err(DedupeError::InvalidInput("claim_text must not be empty".into()));
        }
        if !(1..=50).contains(&top_k) {
            return Err(DedupeError::InvalidInput(format!(
                "top_k must be in 1..=50, got {top_k}"
            )));
        }

        let started = Instant::now();

        let UpsertOutcome { claim_id, created } = self.upsert_claim(text).await?;
        let neighbors = {
            let embedding = self.store.fetch_embedding(claim_id).await?;
            self.store
                .top_k_neighbors(claim_id, &embedding, top_k)
                .await?
        };

        let max_similarity = neighbors.first().map(|n| n.similarity).unwrap_or(0.0);
        let best_match = neighbors.first().map(|n| (n.claim_id, n.similarity));
        let classification = self.thresholds.classify(max_similarity);

        let assignment = cluster::assign(
            self.store.as_ref(),
            claim_id,
            best_match,
            self.thresholds.join_threshold(),
        )
        .await?;

        let canonical_text = self.store.fetch_claim_text(assignment.canonical_claim_id).await?;

        Ok(CheckDuplicateResponse {
            hash: content_hash(text),
            claim_id,
            created,
            embedding_model: self.embedder.model_name().to_string(),
            provider: self.embedder.provider_name().to_string(),
            classification,
            max_similarity,
            similar: neighbors,
            cluster_id: assignment.cluster_id,
            canonical_claim: CanonicalClaim {
                claim_id: assignment.canonical_claim_id,
                text: canonical_text,
            },
            timing_ms: started.elapsed().as_millis(),
        })
    }

    /// Batch variant: steps 1-6 applied independently per element,
    /// sequentially (embedding calls are not parallelized within a
    /// request — §5 suspension points), preserving input order.
    pub async fn check_duplicate_batch(
        &self,
        texts: &[String],
        top_k: u32,
    ) -> Result<Vec<CheckDuplicateResponse>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.check_duplicate(text, top_k).await?);
        }
        Ok(results)
    }

    /// `upsertClaim(text) -> UpsertOutcome` (§4.D), with unique-violation
    /// retry: a racing loser re-reads by hash rather than propagating the
    /// race as an error.
    async fn upsert_claim(&self, text: &str) -> Result<UpsertOutcome> {
        let hash = content_hash(text);

        if let Some(existing) = self.store.find_claim_by_hash(&hash).await? {
            return Ok(UpsertOutcome {
                claim_id: existing.claim_id,
                created: false,
            });
        }

        let embedding = self.embedder.embed(text).await.map_err(|e| {
            warn!(%hash, error = %e, "embedding failed, claim will not be created");
            DedupeError::EmbeddingFailure(e.to_string())
        })?;

        for attempt in 0..=MAX_UPSERT_RETRIES {
            match self
                .store
                .insert_claim_with_embedding(text, &hash, &embedding.model, &embedding.vector)
                .await
            {
                Ok(claim_id) => {
                    info!(claim_id, %hash, "claim created");
                    return Ok(UpsertOutcome {
                        claim_id,
                        created: true,
                    });
                }
                Err(DedupeError::RaceLost(_)) => {
                    warn!(attempt, %hash, "lost race inserting claim, re-reading");
                    if let Some(existing) = self.store.find_claim_by_hash(&hash).await? {
                        info!(claim_id = existing.claim_id, "race loser observed winner's claim");
                        return Ok(UpsertOutcome {
                            claim_id: existing.claim_id,
                            created: false,
                        });
                    }
                }
                Err(other) => return Err(other),
            }
        }

        Err(DedupeError::Invariant(format!(
            "gave up after {MAX_UPSERT_RETRIES} retries racing to insert claim with hash {hash}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use crate::embedding::StubEmbeddingProvider;
    use crate::testutil::InMemoryClaimStore;

    fn coordinator() -> Coordinator {
        Coordinator::new(
            Arc::new(InMemoryClaimStore::new()),
            Arc::new(StubEmbeddingProvider::new()),
            Thresholds::default(),
        )
    }

    #[tokio::test]
    async fn first_submission_is_created_and_new() {
        let c = coordinator();
        let resp = c.check_duplicate("the earth orbits the sun", 5).await.unwrap();
        assert!(resp.created);
        assert_eq!(resp.classification, Classification::New);
        assert_eq!(resp.canonical_claim.claim_id, resp.claim_id);
        assert!(resp.similar.is_empty());
    }

    #[tokio::test]
    async fn resubmitting_identical_text_is_a_duplicate_and_not_created() {
        let c = coordinator();
        let first = c.check_duplicate("the earth orbits the sun", 5).await.unwrap();
        let second = c.check_duplicate("the earth orbits the sun", 5).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.claim_id, first.claim_id);
        assert_eq!(second.hash, first.hash);
        assert_eq!(second.classification, Classification::Duplicate);
        assert_eq!(second.max_similarity, 1.0);
    }

    #[tokio::test]
    async fn whitespace_and_case_variants_are_exact_duplicates() {
        let c = coordinator();
        let first = c.check_duplicate("Nuclear Energy Is Safe.", 5).await.unwrap();
        let second = c.check_duplicate("  nuclear energy is safe  ", 5).await.unwrap();
        assert_eq!(first.claim_id, second.claim_id);
        assert!(!second.created);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let c = coordinator();
        let err = c.check_duplicate("   ", 5).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn out_of_range_top_k_is_rejected() {
        let c = coordinator();
        assert!(c.check_duplicate("a claim", 0).await.is_err());
        assert!(c.check_duplicate("a claim", 51).await.is_err());
    }

    #[tokio::test]
    async fn batch_preserves_order_and_each_entrys_identity() {
        let c = coordinator();
        let inputs = vec![
            "claim one".to_string(),
            "claim two".to_string(),
            "claim one".to_string(),
        ];
        let results = c.check_duplicate_batch(&inputs, 5).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].claim_id, results[2].claim_id);
        assert!(results[0].created);
        assert!(!results[2].created);
        assert_ne!(results[0].claim_id, results[1].claim_id);
    }
}
