//! Classifier (component F).

use serde::{Deserialize, Serialize};

/// Classification band derived from the max neighbor similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Duplicate,
    NearDuplicate,
    New,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::NearDuplicate => "near_duplicate",
            Self::New => "new",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Duplicate/near-duplicate similarity thresholds.
///
/// `near <= dup` is an invariant: if constructed with the raw values in
/// the wrong order, they are silently swapped rather than rejected,
/// matching the defensive ordering in the original configuration.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub duplicate: f64,
    pub near_duplicate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(0.95, 0.85)
    }
}

impl Thresholds {
    pub fn new(duplicate: f64, near_duplicate: f64) -> Self {
        if near_duplicate > duplicate {
            Self {
                duplicate: near_duplicate,
                near_duplicate: duplicate,
            }
        } else {
            Self {
                duplicate,
                near_duplicate,
            }
        }
    }

    /// The join threshold the coordinator feeds to the cluster assigner.
    /// Fixed at `near_duplicate` per the coordinator's documented policy
    /// (see §4.G/§4.H): near-duplicates cluster together.
    pub fn join_threshold(&self) -> f64 {
        self.near_duplicate
    }

    pub fn classify(&self, max_sim: f64) -> Classification {
        if max_sim >= self.duplicate {
            Classification::Duplicate
        } else if max_sim >= self.near_duplicate {
            Classification::NearDuplicate
        } else {
            Classification::New
        }
    }
}
