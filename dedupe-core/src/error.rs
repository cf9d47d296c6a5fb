//! Error taxonomy for the dedupe engine.
//!
//! Mirrors the shape of `SemOsError` in the teacher workspace: one
//! `thiserror`-derived enum, presentation-agnostic (no axum dependency
//! here — the HTTP mapping lives in `dedupe-server::error`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DedupeError>;

#[derive(Debug, Error)]
pub enum DedupeError {
    /// Malformed request: missing text, out-of-range `top_k`, mismatched
    /// vector lengths passed to the similarity kernel. No DB writes occur.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding provider failed: timeout, empty vector, wrong
    /// dimension, or a provider-side error. The calling transaction must
    /// not persist a Claim row in this case.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// A unique-violation the caller is expected to recover from by
    /// re-reading and retrying. Never bubbles past the core — the
    /// upsert/assign retry loops catch this variant locally.
    #[error("lost race on {0}, retry by re-reading")]
    RaceLost(String),

    /// A stored invariant was found broken: a cluster missing its
    /// canonical, a claim missing its embedding. Never silently papered
    /// over — surfaced as a 5xx with diagnostic detail.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Database connectivity or any constraint violation other than the
    /// expected unique-violation races.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DedupeError {
    /// HTTP status code this error class maps to. Duplicated here (rather
    /// than only in `dedupe-server::error`) so non-HTTP callers (tests,
    /// batch jobs) can reason about severity without an axum dependency.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::EmbeddingFailure(_) => 500,
            Self::RaceLost(_) => 500, // should never escape the core; 5xx if it does
            Self::Invariant(_) => 500,
            Self::Storage(_) => 500,
        }
    }
}
