//! The ordered operation list produced by the ethscription detector (§4.C).

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Where an operation was observed: the transaction's own input, or an event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationSource {
    /// Decoded from the transaction's `input` field
    Input,
    /// Decoded from one of the transaction's receipt logs
    Event,
}

/// One detected ethscription operation, tagged by kind.
///
/// Every address and hash carried here is already normalised to lowercase hex
/// by the detector (spec.md §4.C "Normalisation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// A new ethscription, from either an input data URI or an ESIP-3 event
    Create {
        /// Hash of the transaction that created this ethscription
        tx_hash: B256,
        /// The account that submitted the creating transaction
        creator: Address,
        /// The account the ethscription is minted to
        initial_owner: Address,
        /// The raw content URI (before codec parsing)
        content_uri: String,
        /// The declared MIME type, empty string if absent
        mimetype: String,
        /// ESIP-6 duplicate-content-tolerance flag
        esip6: bool,
        /// Where this create was observed
        source: OperationSource,
        /// Log index, only set when `source == Event`
        event_log_index: Option<u64>,
    },
    /// A plain transfer, from an input multi-transfer or an ESIP-1 event
    Transfer {
        /// The 32 byte ethscription id being transferred
        ethscription_id: B256,
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Position within an input-based multi-transfer, if that's the source
        transfer_index: Option<u64>,
        /// Log index, only set when from an ESIP-1 event
        event_log_index: Option<u64>,
    },
    /// An ESIP-2 transfer that also asserts the previous owner
    TransferWithPreviousOwner {
        /// The 32 byte ethscription id being transferred
        ethscription_id: B256,
        /// Sender (the log's emitting contract address)
        from: Address,
        /// Recipient
        to: Address,
        /// The previous owner asserted by the event
        previous_owner: Address,
        /// Log index this operation was decoded from
        event_log_index: Option<u64>,
    },
}

impl Operation {
    /// The transaction-local position this operation should sort by, used together
    /// with `tx.transaction_index` to establish the block-wide deposit order
    /// (spec.md §5 "Within a transaction" ordering rule).
    pub fn emission_key(&self) -> (u8, u64) {
        match self {
            // input-create always sorts first
            Operation::Create {
                source: OperationSource::Input,
                ..
            } => (0, 0),
            Operation::Transfer {
                transfer_index: Some(i),
                ..
            } => (1, *i),
            Operation::Create {
                source: OperationSource::Event,
                event_log_index: Some(i),
                ..
            } => (2, *i),
            Operation::Transfer {
                event_log_index: Some(i),
                ..
            } => (2, *i),
            Operation::TransferWithPreviousOwner {
                event_log_index: Some(i),
                ..
            } => (2, *i),
            _ => (2, 0),
        }
    }
}
