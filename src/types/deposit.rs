//! The deposit transaction envelope (spec.md §3/§4.D), OP-Stack shaped.

use alloy_primitives::{Address, Bytes, B256};
use alloy_rlp::RlpEncodable;
use serde::{Deserialize, Serialize};

/// OP-Stack deposit transaction type byte. Resolved in favor of the OP-Stack
/// convention over the source's `0x7D` — see DESIGN.md open question #1.
pub const DEPOSIT_TX_TYPE: u8 = 0x7E;

/// Fixed gas limit for an operation deposit (create/transfer/transfer-for-previous-owner).
pub const OPERATION_GAS_LIMIT: u64 = 1_000_000_000;

/// Fixed gas limit for the per-block L1-attributes deposit.
pub const L1_ATTRIBUTES_GAS_LIMIT: u64 = 1_000_000;

/// Deposit receipt version carried in the envelope's trailing field.
pub const DEPOSIT_RECEIPT_VERSION: u8 = 0x01;

/// A system-deposit transaction: the unit the execution engine consumes.
///
/// RLP-encoded as `[source_hash, from, to, mint, value, gas_limit, is_system_tx, input]`
/// and prepended with [DEPOSIT_TX_TYPE], mirroring magi's
/// `derive::stages::attributes::DepositedTransaction` envelope shape.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, Serialize, Deserialize)]
pub struct DepositTransaction {
    /// Deterministic per-operation (or per-epoch) source hash
    pub source_hash: B256,
    /// The depositing account
    pub from: Address,
    /// The predeployed contract this deposit calls into
    pub to: Address,
    /// ETH minted to `from`; always 0 for this system
    pub mint: u128,
    /// ETH value sent with the call; always 0
    pub value: u128,
    /// Gas limit granted to the deposit's execution
    pub gas_limit: u64,
    /// Reserved envelope slot, always empty — spec.md §4.D RLP-encodes a literal `""` here
    pub is_system_tx: Bytes,
    /// The ABI-encoded calldata
    pub input: Bytes,
}

impl DepositTransaction {
    /// RLP-encodes the envelope and prepends the OP-Stack deposit tx-type byte,
    /// producing the bytes the execution engine's `proposeBlock` expects.
    pub fn encode_envelope(&self) -> Vec<u8> {
        let mut out = alloy_rlp::encode(self);
        let mut framed = Vec::with_capacity(out.len() + 1);
        framed.push(DEPOSIT_TX_TYPE);
        framed.append(&mut out);
        framed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DepositTransaction {
        DepositTransaction {
            source_hash: B256::repeat_byte(0x11),
            from: Address::repeat_byte(0x22),
            to: Address::repeat_byte(0x33),
            mint: 0,
            value: 0,
            gas_limit: OPERATION_GAS_LIMIT,
            is_system_tx: Bytes::new(),
            input: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        }
    }

    #[test]
    fn envelope_is_prefixed_with_deposit_tx_type() {
        let tx = sample();
        let encoded = tx.encode_envelope();
        assert_eq!(encoded[0], DEPOSIT_TX_TYPE);
    }

    #[test]
    fn envelope_encoding_is_deterministic() {
        let tx = sample();
        assert_eq!(tx.encode_envelope(), tx.encode_envelope());
    }
}
