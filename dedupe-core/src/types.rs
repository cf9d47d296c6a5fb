//! Shared domain types (§3 DATA MODEL) used across the port traits,
//! the coordinator, and the HTTP response schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Classification;

/// A stored claim row, as read back from the `ClaimStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    pub claim_id: i64,
    pub claim_text: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A single neighbor returned by top-k search, ordered by similarity
/// descending with ties broken by ascending `claim_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborMatch {
    pub claim_id: i64,
    pub text: String,
    pub similarity: f64,
}

/// Outcome of `ClusterAssigner::assign` (§4.G).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub cluster_id: i64,
    pub canonical_claim_id: i64,
    pub assigned: bool,
}

/// The canonical claim embedded in the coordinator's response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalClaim {
    pub claim_id: i64,
    pub text: String,
}

/// The full response of `checkDuplicate` (§4.H / §6 response schema).
/// Field order and names are part of the stable external contract.
#[derive(Debug, Clone, Serialize)]
pub struct CheckDuplicateResponse {
    pub hash: String,
    pub claim_id: i64,
    pub created: bool,
    pub embedding_model: String,
    pub provider: String,
    pub classification: Classification,
    pub max_similarity: f64,
    pub similar: Vec<NeighborMatch>,
    pub cluster_id: i64,
    pub canonical_claim: CanonicalClaim,
    pub timing_ms: u128,
}

/// Outcome of `ClaimStore::upsert_claim` (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub claim_id: i64,
    pub created: bool,
}
