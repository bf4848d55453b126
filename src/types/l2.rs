//! L2 ("EthscriptionsBlock") data model (spec.md §3).

use alloy_primitives::{Bloom, B256};
use serde::{Deserialize, Serialize};

use crate::common::Epoch;

/// The L2 block the execution engine produces in response to a `proposeBlock`
/// call. Carries both its own execution fields and the L1-attributes epoch it
/// was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthscriptionsBlock {
    /// The L2 block number
    pub number: u64,
    /// The L2 block hash
    pub block_hash: B256,
    /// The L2 parent block hash
    pub parent_hash: B256,
    /// The L2 block timestamp
    pub timestamp: u64,
    /// Post-execution state root
    pub state_root: B256,
    /// Receipts root
    pub receipts_root: B256,
    /// Gas used by this block's deposits
    pub gas_used: u64,
    /// The configured gas limit
    pub gas_limit: u64,
    /// Mixed-in L1 randomness
    pub prev_randao: B256,
    /// Logs bloom filter
    pub logs_bloom: Bloom,
    /// The L1 epoch this block belongs to
    pub epoch: Epoch,
    /// `0` at epoch start, incrementing for additional L2 blocks within the epoch
    pub sequence_number: u64,
}

impl EthscriptionsBlock {
    /// Invariant 1: `sequence_number == 0` iff this block starts a new L1 epoch.
    pub fn starts_epoch(&self) -> bool {
        self.sequence_number == 0
    }

    /// Invariant 2: the 12-second L2 slot cadence within one epoch.
    pub fn expected_timestamp(epoch_start_timestamp: u64, sequence_number: u64) -> u64 {
        epoch_start_timestamp + 12 * sequence_number
    }
}
