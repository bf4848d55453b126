//! The block importer (component F, spec.md §4.F).
//!
//! Grounded on magi's `driver::node_driver::NodeDriver` (startup recovery,
//! the advance loop, safe/finalized promotion) and `derive::state::State`
//! (bounded caches with a `prune` step keyed off a window size). The
//! `retry_offset`/epoch-walk-back recovery procedure here is this system's
//! analogue of magi's `get_l1_start_block` + `l2_refs` backfill.

pub mod block_importer;

pub use block_importer::BlockImporter;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::engine::EngineError;
use crate::l1::{PrefetchError, PrefetchedBlock, Prefetcher};

/// Errors from the main import loop (spec.md §7).
#[derive(Debug, Error)]
pub enum ImporterError {
    /// The cached parent hash doesn't match the newly fetched block's parent —
    /// fatal, propagates out of the main loop and stops the process.
    #[error("reorg detected at L1 block {0}")]
    Reorg(u64),
    /// A persisted validation failure halts further import — fatal.
    #[error("validation previously failed for L1 block {0}")]
    ValidationFailure(u64),
    /// The requested block isn't ready yet; the caller should sleep and retry.
    #[error("block {0} not ready")]
    NotReady(u64),
    /// The prefetcher reported a fetch failure.
    #[error(transparent)]
    Prefetch(#[from] PrefetchError),
    /// The execution engine reported an error.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Any other, non-specific failure (store I/O, etc).
    #[error(transparent)]
    Other(#[from] eyre::Report),
}

/// The block-fetching surface the importer drives — abstracts over
/// [Prefetcher] so [BlockImporter] can be exercised against a fake in tests.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Awaits the result of block `n`, scheduling it first if needed.
    async fn fetch(&self, n: u64) -> Result<Arc<PrefetchedBlock>, PrefetchError>;
    /// Schedules fetches for `[from, from + ahead)` that aren't already in flight.
    fn ensure_prefetched(&self, from: u64);
    /// Evicts cached slots strictly older than `n`.
    fn clear_older_than(&self, n: u64);
    /// The L1 chain's current tip, for startup recovery's age check.
    async fn l1_tip(&self) -> eyre::Result<u64>;
}

#[async_trait]
impl BlockSource for Prefetcher {
    async fn fetch(&self, n: u64) -> Result<Arc<PrefetchedBlock>, PrefetchError> {
        Prefetcher::fetch(self, n).await
    }

    fn ensure_prefetched(&self, from: u64) {
        Prefetcher::ensure_prefetched(self, from)
    }

    fn clear_older_than(&self, n: u64) {
        Prefetcher::clear_older_than(self, n)
    }

    async fn l1_tip(&self) -> eyre::Result<u64> {
        Prefetcher::l1_tip(self).await
    }
}
