//! Deterministic source-hash computation (spec.md §3 invariant 5).
//!
//! Same nested-keccak256 composition magi's `AttributesDeposited`/`UserDeposited`
//! `From` impls use to build OP-Stack deposit source hashes: an outer hash of
//! a big-endian domain tag concatenated with an inner hash of the operation's
//! identifying data.

use alloy_primitives::{keccak256, B256};

/// Domain tag for operation deposits (create/transfer/transfer-for-previous-owner).
const DOMAIN_OPERATION: u64 = 0;
/// Domain tag for the per-block L1-attributes deposit.
const DOMAIN_L1_ATTRIBUTES: u64 = 1;

fn big_endian_32(n: u64) -> [u8; 32] {
    let mut buf = [0u8; 32];
    buf[24..].copy_from_slice(&n.to_be_bytes());
    buf
}

/// `keccak256(be32(DOMAIN_OPERATION) || keccak256(tx_hash || be32(operation_index)))`
pub fn operation_source_hash(tx_hash: B256, operation_index: u64) -> B256 {
    let mut inner = Vec::with_capacity(64);
    inner.extend_from_slice(tx_hash.as_slice());
    inner.extend_from_slice(&big_endian_32(operation_index));
    let inner_hash = keccak256(inner);

    let mut outer = Vec::with_capacity(64);
    outer.extend_from_slice(&big_endian_32(DOMAIN_OPERATION));
    outer.extend_from_slice(inner_hash.as_slice());
    keccak256(outer)
}

/// `keccak256(be32(DOMAIN_L1_ATTRIBUTES) || keccak256(l1_block_hash || be32(sequence_number)))`
pub fn l1_attributes_source_hash(l1_block_hash: B256, sequence_number: u64) -> B256 {
    let mut inner = Vec::with_capacity(64);
    inner.extend_from_slice(l1_block_hash.as_slice());
    inner.extend_from_slice(&big_endian_32(sequence_number));
    let inner_hash = keccak256(inner);

    let mut outer = Vec::with_capacity(64);
    outer.extend_from_slice(&big_endian_32(DOMAIN_L1_ATTRIBUTES));
    outer.extend_from_slice(inner_hash.as_slice());
    keccak256(outer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_operation_indices_yield_distinct_hashes() {
        let tx_hash = B256::repeat_byte(0xab);
        let h0 = operation_source_hash(tx_hash, 0);
        let h1 = operation_source_hash(tx_hash, 1);
        assert_ne!(h0, h1);
    }

    #[test]
    fn deterministic_across_calls() {
        let tx_hash = B256::repeat_byte(0xcd);
        assert_eq!(
            operation_source_hash(tx_hash, 7),
            operation_source_hash(tx_hash, 7)
        );
    }

    #[test]
    fn operation_and_l1_attributes_domains_differ() {
        let hash = B256::repeat_byte(0x01);
        assert_ne!(
            operation_source_hash(hash, 0),
            l1_attributes_source_hash(hash, 0)
        );
    }
}
