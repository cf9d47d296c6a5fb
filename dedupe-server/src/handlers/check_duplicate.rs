//! `POST /claims/check-duplicate` and `POST /claims/check-duplicate-batch`
//! (§6 HTTP surface / §4.H dedupe coordinator).

use axum::{extract::State, Json};
use dedupe_core::error::DedupeError;
use dedupe_core::types::CheckDuplicateResponse;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_TOP_K: u32 = 5;
const MAX_BATCH_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CheckDuplicateRequest {
    pub claim_text: String,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

#[derive(Debug, Deserialize)]
pub struct CheckDuplicateBatchRequest {
    pub claims: Vec<String>,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

#[derive(Debug, Serialize)]
pub struct CheckDuplicateBatchResponse {
    pub results: Vec<CheckDuplicateResponse>,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

pub async fn check_duplicate(
    State(state): State<AppState>,
    Json(req): Json<CheckDuplicateRequest>,
) -> Result<Json<CheckDuplicateResponse>, AppError> {
    let resp = state
        .coordinator
        .check_duplicate(&req.claim_text, req.top_k)
        .await?;
    Ok(Json(resp))
}

pub async fn check_duplicate_batch(
    State(state): State<AppState>,
    Json(req): Json<CheckDuplicateBatchRequest>,
) -> Result<Json<CheckDuplicateBatchResponse>, AppError> {
    if req.claims.is_empty() || req.claims.len() > MAX_BATCH_SIZE {
        return Err(AppError::from(DedupeError::InvalidInput(format!(
            "claims must contain 1..={MAX_BATCH_SIZE} entries, got {}",
            req.claims.len()
        ))));
    }

    let results = state
        .coordinator
        .check_duplicate_batch(&req.claims, req.top_k)
        .await?;
    Ok(Json(CheckDuplicateBatchResponse { results }))
}
