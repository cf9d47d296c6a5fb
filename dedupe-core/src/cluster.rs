//! Cluster Assigner — Semantic Clustering / Canonical Claim Selection
//! (component G).
//!
//! Canonicals are fixed at cluster creation and never re-elected:
//! clusters never merge, never split. Insertion order decides which
//! equivalent claim becomes canonical.

use tracing::info;

use crate::error::Result;
use crate::ports::ClaimStore;
use crate::types::ClusterAssignment;

/// Assign `claim_id` to a cluster, per the three ordered rules.
///
/// `best_match` is `None` when the neighbor search returned nothing
/// (the store held only the query claim). `join_threshold` is supplied
/// by the caller — the coordinator fixes it at `T_near`.
pub async fn assign(
    store: &dyn ClaimStore,
    claim_id: i64,
    best_match: Option<(i64, f64)>,
    join_threshold: f64,
) -> Result<ClusterAssignment> {
    // Rule 1: idempotence.
    if let Some(existing_cluster_id) = store.existing_cluster_of(claim_id).await? {
        let canonical_claim_id = store.canonical_of(existing_cluster_id).await?;
        return Ok(ClusterAssignment {
            cluster_id: existing_cluster_id,
            canonical_claim_id,
            assigned: false,
        });
    }

    // Rule 2: join an existing (or newly-minted) cluster around the best match.
    if let Some((best_match_id, best_match_similarity)) = best_match {
        if best_match_similarity >= join_threshold {
            let cluster_id = match store.existing_cluster_of(best_match_id).await? {
                Some(cluster_id) => cluster_id,
                None => store.ensure_cluster_with_canonical(best_match_id).await?,
            };
            store
                .add_cluster_member(cluster_id, claim_id, best_match_similarity)
                .await?;
            let canonical_claim_id = store.canonical_of(cluster_id).await?;
            info!(
                claim_id,
                cluster_id, canonical_claim_id, similarity = best_match_similarity, "cluster joined"
            );
            return Ok(ClusterAssignment {
                cluster_id,
                canonical_claim_id,
                assigned: true,
            });
        }
    }

    // Rule 3: no qualifying match — this claim becomes its own canonical.
    let cluster_id = store.ensure_cluster_with_canonical(claim_id).await?;
    info!(claim_id, cluster_id, "cluster created");
    Ok(ClusterAssignment {
        cluster_id,
        canonical_claim_id: claim_id,
        assigned: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::InMemoryClaimStore;

    #[tokio::test]
    async fn first_claim_becomes_its_own_canonical() {
        let store = InMemoryClaimStore::new();
        let claim_id = store.seed_claim("the earth orbits the sun").await;

        let result = assign(&store, claim_id, None, 0.85).await.unwrap();
        assert_eq!(result.canonical_claim_id, claim_id);
        assert!(result.assigned);
    }

    #[tokio::test]
    async fn join_adds_to_best_matchs_cluster() {
        let store = InMemoryClaimStore::new();
        let canonical_id = store.seed_claim("claim a").await;
        assign(&store, canonical_id, None, 0.85).await.unwrap();

        let new_id = store.seed_claim("claim a, restated").await;
        let result = assign(&store, new_id, Some((canonical_id, 0.90)), 0.85)
            .await
            .unwrap();

        assert_eq!(result.canonical_claim_id, canonical_id);
        assert!(result.assigned);
        assert_eq!(
            store.existing_cluster_of(new_id).await.unwrap(),
            store.existing_cluster_of(canonical_id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn below_threshold_creates_a_fresh_cluster() {
        let store = InMemoryClaimStore::new();
        let other_id = store.seed_claim("unrelated claim").await;
        assign(&store, other_id, None, 0.85).await.unwrap();

        let new_id = store.seed_claim("a completely different claim").await;
        let result = assign(&store, new_id, Some((other_id, 0.50)), 0.85)
            .await
            .unwrap();

        assert_eq!(result.canonical_claim_id, new_id);
        assert_ne!(
            result.cluster_id,
            store.existing_cluster_of(other_id).await.unwrap().unwrap()
        );
    }

    #[tokio::test]
    async fn repeated_assignment_is_idempotent_and_does_not_write() {
        let store = InMemoryClaimStore::new();
        let claim_id = store.seed_claim("claim").await;
        let first = assign(&store, claim_id, None, 0.85).await.unwrap();
        let second = assign(&store, claim_id, None, 0.85).await.unwrap();

        assert_eq!(first.cluster_id, second.cluster_id);
        assert_eq!(first.canonical_claim_id, second.canonical_claim_id);
        assert!(!second.assigned);
    }

    #[tokio::test]
    async fn joining_an_unclustered_best_match_mints_it_as_canonical() {
        let store = InMemoryClaimStore::new();
        // best_match exists as a claim but was never run through assign(),
        // so it is not yet a ClusterMember of anything (§4.G rule 2 edge case).
        let best_match_id = store.seed_claim("stored but unassigned").await;
        let new_id = store.seed_claim("a close paraphrase").await;

        let result = assign(&store, new_id, Some((best_match_id, 0.92)), 0.85)
            .await
            .unwrap();

        assert_eq!(result.canonical_claim_id, best_match_id);
        assert_eq!(
            store.existing_cluster_of(best_match_id).await.unwrap(),
            Some(result.cluster_id)
        );
    }
}
