//! The persisted validation result row (spec.md §3/§6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of comparing one L1 block's derived L2 outcome against the reference
/// feed. Primary key is `l1_block`; re-running validation is idempotent
/// (invariant 6, "`find_or_initialize_by`").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The L1 block number this result is keyed by
    pub l1_block: u64,
    /// Whether the derived outcome matched the reference feed
    pub success: bool,
    /// Structured mismatch descriptions, empty when `success`
    pub error_details: Vec<String>,
    /// Arbitrary comparison statistics, stored verbatim
    pub validation_stats: Value,
    /// When this result was (re)computed
    pub validated_at: i64,
    /// First time a row existed for this `l1_block`
    pub created_at: i64,
    /// Last time this row was updated
    pub updated_at: i64,
}

impl ValidationResult {
    /// Builds a fresh success/failure result for `l1_block` at `now` (unix seconds).
    pub fn new(l1_block: u64, success: bool, error_details: Vec<String>, stats: Value, now: i64) -> Self {
        Self {
            l1_block,
            success,
            error_details,
            validation_stats: stats,
            validated_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}
