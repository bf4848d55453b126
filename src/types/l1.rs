//! L1 chain data model (spec.md §3 `L1Block`/`L1Transaction`).

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// A fetched L1 block header, the unit the prefetcher hands to the importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Block {
    /// The block number
    pub number: u64,
    /// The block hash
    pub block_hash: B256,
    /// The parent block hash
    pub parent_hash: B256,
    /// The block timestamp
    pub timestamp: u64,
    /// The base fee per gas, in wei
    pub base_fee: u64,
    /// The beacon-chain randomness value mixed into this block
    pub mix_hash: B256,
    /// Present only after the Cancun upgrade
    pub parent_beacon_block_root: Option<B256>,
}

/// A single log entry attached to an [L1Transaction], ordered by `log_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Log {
    /// The contract address that emitted this log
    pub address: Address,
    /// The topics, `topics[0]` is the event signature hash when present
    pub topics: Vec<B256>,
    /// The non-indexed log data
    pub data: Bytes,
    /// The log's position within the block
    pub log_index: u64,
    /// True if this log was reverted out by a reorg the RPC node already knows about
    pub removed: bool,
}

/// A fetched L1 transaction plus its receipt's logs, the unit §4.C operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Transaction {
    /// Hash of the block this transaction is included in
    pub block_hash: B256,
    /// Number of the block this transaction is included in
    pub block_number: u64,
    /// Timestamp of the block this transaction is included in
    pub block_timestamp: u64,
    /// The transaction hash
    pub tx_hash: B256,
    /// Position of this transaction within its block
    pub transaction_index: u64,
    /// The raw calldata
    pub input: Bytes,
    /// The chain the transaction was submitted against, if present
    pub chain_id: Option<u64>,
    /// The sender
    pub from_address: Address,
    /// The recipient; `None` for contract creation
    pub to_address: Option<Address>,
    /// `1` for success, `0` for a reverted transaction
    pub status: u64,
    /// Logs emitted by this transaction, ordered by `log_index` ascending
    pub logs: Vec<L1Log>,
}

impl L1Transaction {
    /// Per spec.md §4.C: "Failed tx (status != 1) => empty operation list."
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}
