//! The validation engine (component G, spec.md §4.G).
//!
//! New relative to the teacher — magi has no reference-feed comparison at
//! all. Grounded on the retry/backoff idiom already in the dependency table
//! (the `again` crate magi pulls in for its L1 chain-watcher retries) and on
//! the `ValidationResult` upsert semantics in spec.md §6. Persisted via
//! [`store::SqliteValidationStore`].

pub mod store;

use std::time::Duration;

use alloy_primitives::B256;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::ValidationResult;

pub use store::SqliteValidationStore;

/// Errors the validation engine can hit (spec.md §7).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A transient failure (reference feed unreachable, timeout). Not persisted; retried.
    #[error("transient validation error: {0}")]
    Transient(String),
    /// A substantive mismatch or unexpected failure. Persisted as `success=false`, then re-raised.
    #[error("validation failed: {0}")]
    Failed(String),
}

/// One L1 block's worth of derived L2 outcome to check against the reference feed.
#[derive(Debug, Clone)]
pub struct ValidationJob {
    /// The L1 block number being validated
    pub l1_block: u64,
    /// The L2 block hash(es) derived from it, in order
    pub l2_block_hashes: Vec<B256>,
}

/// The result of comparing one job's derived outcome against the reference feed.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Whether the derived outcome matched
    pub success: bool,
    /// Human-readable mismatch descriptions, empty when `success`
    pub errors: Vec<String>,
    /// Arbitrary comparison statistics to persist alongside the result
    pub stats: Value,
}

/// Durable storage for [ValidationResult] rows (spec.md §6 "Persisted state").
#[async_trait]
pub trait ValidationStore: Send + Sync + std::fmt::Debug {
    /// Inserts or updates the row for `result.l1_block`.
    async fn upsert(&self, result: ValidationResult) -> eyre::Result<()>;
    /// Looks up the row for `l1_block`, if any.
    async fn get(&self, l1_block: u64) -> eyre::Result<Option<ValidationResult>>;
    /// The earliest `l1_block <= l1_block` with a persisted failure, if any.
    async fn first_failure_at_or_before(&self, l1_block: u64) -> eyre::Result<Option<u64>>;
    /// Every block number in `[start, end]` with no persisted row.
    async fn missing_in_range(&self, start: u64, end: u64) -> eyre::Result<Vec<u64>>;
    /// The highest `l1_block` with a persisted row, if any.
    async fn last_validated(&self) -> eyre::Result<Option<u64>>;
}

/// Compares one job's derived outcome against the reference feed (spec.md §4.G).
#[async_trait]
pub trait BlockValidator: Send + Sync {
    /// Validates `job`, returning a transient error on feed unavailability.
    async fn validate_l1_block(&self, job: &ValidationJob) -> Result<ValidationOutcome, ValidationError>;
}

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Runs [BlockValidator] against a [ValidationStore], applying spec.md §4.G's
/// retry policy: up to 3 attempts with a fixed 5-second delay. A transient
/// error is not persisted and simply retried; any other error is persisted
/// as `success=false` and then re-raised to trigger the retry. Exhausting
/// all attempts propagates the last error.
#[derive(Debug)]
pub struct ValidationEngine<S, V> {
    store: S,
    validator: V,
}

impl<S: ValidationStore, V: BlockValidator> ValidationEngine<S, V> {
    /// Builds an engine persisting through `store` and checking via `validator`.
    pub fn new(store: S, validator: V) -> Self {
        Self { store, validator }
    }

    /// Runs `job` to completion (or exhaustion of the retry budget).
    pub async fn run(&self, job: ValidationJob, now: i64) -> eyre::Result<ValidationOutcome> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.validator.validate_l1_block(&job).await {
                Ok(outcome) => {
                    self.store
                        .upsert(ValidationResult::new(
                            job.l1_block,
                            outcome.success,
                            outcome.errors.clone(),
                            outcome.stats.clone(),
                            now,
                        ))
                        .await?;
                    return Ok(outcome);
                }
                Err(ValidationError::Transient(msg)) => {
                    last_err = Some(ValidationError::Transient(msg));
                }
                Err(ValidationError::Failed(msg)) => {
                    self.store
                        .upsert(ValidationResult::new(job.l1_block, false, vec![msg.clone()], Value::Null, now))
                        .await?;
                    last_err = Some(ValidationError::Failed(msg));
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
        Err(eyre::eyre!(last_err.unwrap()))
    }
}

/// Detects gaps in persisted validation coverage (spec.md §4.G
/// `GapDetectionJob`): `[max(last_validated - 100, current_l1 - 1000), current_l1]`.
#[derive(Debug)]
pub struct GapDetector<S> {
    store: S,
}

impl<S: ValidationStore> GapDetector<S> {
    /// Wraps `store` for gap detection.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns every L1 block number in the current window with no persisted row.
    pub async fn detect(&self, current_l1: u64) -> eyre::Result<Vec<u64>> {
        let last_validated = self.store.last_validated().await?.unwrap_or(current_l1);
        let start = last_validated.saturating_sub(100).max(current_l1.saturating_sub(1000));
        self.store.missing_in_range(start, current_l1).await
    }
}
