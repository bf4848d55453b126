//! Ethscription detector (component C, spec.md §4.C).
//!
//! Turns one successful L1 transaction into an ordered list of [Operation]s,
//! honoring the precedence and ESIP gating the spec fixes: input-create,
//! then input-transfers, then event-ordered operations (creates and
//! transfers interleaved by ascending `log_index`).

pub mod esips;

use std::collections::HashSet;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, Address, B256};
use once_cell::sync::Lazy;

use crate::codec;
use crate::types::{l1::L1Transaction, Operation, OperationSource};

pub use esips::EsipConfig;

static CREATE_TOPIC: Lazy<B256> =
    Lazy::new(|| keccak256("ethscriptions_protocol_CreateEthscription(address,string)"));
static TRANSFER_TOPIC: Lazy<B256> =
    Lazy::new(|| keccak256("ethscriptions_protocol_TransferEthscription(address,bytes32)"));
static TRANSFER_FOR_PREVIOUS_OWNER_TOPIC: Lazy<B256> = Lazy::new(|| {
    keccak256("ethscriptions_protocol_TransferEthscriptionForPreviousOwner(address,address,bytes32)")
});

const MULTI_TRANSFER_CHUNK: usize = 64;

/// Detects every operation carried by `tx` at `block_number`, honoring `esips`
/// activation. Returns an empty list for a reverted transaction.
pub fn detect(tx: &L1Transaction, block_number: u64, esips: &EsipConfig) -> Vec<Operation> {
    if !tx.succeeded() {
        return Vec::new();
    }

    let mut ops = Vec::new();
    let mut seen_creates: HashSet<B256> = HashSet::new();

    if let Some(create) = detect_input_create(tx, block_number, esips) {
        seen_creates.insert(tx.tx_hash);
        ops.push(create);
    }

    ops.extend(detect_input_transfers(tx, esips));

    for log in sorted_logs(tx) {
        if log.removed {
            continue;
        }
        if esips.esip3(block_number) && !seen_creates.contains(&tx.tx_hash) {
            if let Some(create) = decode_event_create(tx, log) {
                seen_creates.insert(tx.tx_hash);
                ops.push(create);
                continue;
            }
        }
        if esips.esip1(block_number) {
            if let Some(transfer) = decode_event_transfer(log) {
                ops.push(transfer);
                continue;
            }
        }
        if esips.esip2(block_number) {
            if let Some(transfer) = decode_event_transfer_for_previous_owner(log) {
                ops.push(transfer);
            }
        }
    }

    ops
}

fn sorted_logs(tx: &L1Transaction) -> Vec<&crate::types::L1Log> {
    let mut logs: Vec<&crate::types::L1Log> = tx.logs.iter().collect();
    logs.sort_by_key(|l| l.log_index);
    logs
}

fn detect_input_create(tx: &L1Transaction, block_number: u64, esips: &EsipConfig) -> Option<Operation> {
    let to = tx.to_address?;
    let decoded = codec::bytes_to_utf8(&tx.input, esips.esip7(block_number))?;
    if !codec::data_uri::valid(&decoded) {
        return None;
    }
    let parsed = codec::parse(&decoded)?;
    Some(Operation::Create {
        tx_hash: tx.tx_hash,
        creator: tx.from_address,
        initial_owner: to,
        content_uri: decoded.clone(),
        mimetype: parsed.mimetype,
        esip6: codec::data_uri::esip6(&decoded),
        source: OperationSource::Input,
        event_log_index: None,
    })
}

fn detect_input_transfers(tx: &L1Transaction, esips: &EsipConfig) -> Vec<Operation> {
    if tx.to_address.is_none() {
        return Vec::new();
    }
    let input_hex = hex::encode(&tx.input);
    let len = input_hex.len();

    let valid_len = if esips.esip5(tx.block_number) {
        len > 0 && len % MULTI_TRANSFER_CHUNK == 0
    } else {
        len == MULTI_TRANSFER_CHUNK
    };
    if !valid_len {
        return Vec::new();
    }

    input_hex
        .as_bytes()
        .chunks(MULTI_TRANSFER_CHUNK)
        .enumerate()
        .filter_map(|(i, chunk)| {
            let chunk = std::str::from_utf8(chunk).ok()?;
            let bytes = hex::decode(chunk).ok()?;
            Some(Operation::Transfer {
                ethscription_id: B256::from_slice(&bytes),
                from: tx.from_address,
                to: tx.to_address.unwrap(),
                transfer_index: Some(i as u64),
                event_log_index: None,
            })
        })
        .collect()
}

fn decode_event_create(tx: &L1Transaction, log: &crate::types::L1Log) -> Option<Operation> {
    if log.topics.first()? != &*CREATE_TOPIC || log.topics.len() != 2 {
        return None;
    }
    let initial_owner = Address::from_word(log.topics[1]);
    let content_uri = match DynSolType::String.abi_decode(&log.data).ok()? {
        DynSolValue::String(s) => s,
        _ => return None,
    };
    Some(Operation::Create {
        tx_hash: tx.tx_hash,
        creator: log.address,
        initial_owner,
        content_uri,
        mimetype: String::new(),
        esip6: false,
        source: OperationSource::Event,
        event_log_index: Some(log.log_index),
    })
}

fn decode_event_transfer(log: &crate::types::L1Log) -> Option<Operation> {
    if log.topics.first()? != &*TRANSFER_TOPIC || log.topics.len() != 3 {
        return None;
    }
    Some(Operation::Transfer {
        ethscription_id: log.topics[2],
        from: log.address,
        to: Address::from_word(log.topics[1]),
        transfer_index: None,
        event_log_index: Some(log.log_index),
    })
}

fn decode_event_transfer_for_previous_owner(log: &crate::types::L1Log) -> Option<Operation> {
    if log.topics.first()? != &*TRANSFER_FOR_PREVIOUS_OWNER_TOPIC || log.topics.len() != 4 {
        return None;
    }
    Some(Operation::TransferWithPreviousOwner {
        ethscription_id: log.topics[3],
        from: log.address,
        to: Address::from_word(log.topics[2]),
        previous_owner: Address::from_word(log.topics[1]),
        event_log_index: Some(log.log_index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::l1::L1Log;
    use alloy_primitives::Bytes;

    fn base_tx() -> L1Transaction {
        L1Transaction {
            block_hash: B256::ZERO,
            block_number: 1,
            block_timestamp: 0,
            tx_hash: B256::repeat_byte(1),
            transaction_index: 0,
            input: Bytes::new(),
            chain_id: None,
            from_address: Address::repeat_byte(0x11),
            to_address: Some(Address::repeat_byte(0xee)),
            status: 1,
            logs: Vec::new(),
        }
    }

    #[test]
    fn input_create_plain_text() {
        let mut tx = base_tx();
        tx.input = Bytes::from(b"data:,hello world".to_vec());
        let ops = detect(&tx, 1, &EsipConfig::default());
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            Operation::Create {
                creator,
                initial_owner,
                mimetype,
                esip6,
                source,
                ..
            } => {
                assert_eq!(*creator, tx.from_address);
                assert_eq!(*initial_owner, tx.to_address.unwrap());
                assert_eq!(mimetype, "");
                assert!(!esip6);
                assert_eq!(*source, OperationSource::Input);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn failed_transaction_yields_no_operations() {
        let mut tx = base_tx();
        tx.status = 0;
        tx.input = Bytes::from(b"data:,hello".to_vec());
        assert!(detect(&tx, 1, &EsipConfig::default()).is_empty());
    }

    #[test]
    fn multi_transfer_input_three_chunks() {
        let mut tx = base_tx();
        let mut input = Vec::new();
        for _ in 0..3 {
            input.extend_from_slice(&[0xab; 32]);
        }
        tx.input = Bytes::from(input);
        let esips = EsipConfig {
            esip5_block: Some(0),
            ..Default::default()
        };
        let ops = detect(&tx, 1, &esips);
        assert_eq!(ops.len(), 3);
        for (i, op) in ops.iter().enumerate() {
            match op {
                Operation::Transfer { transfer_index, .. } => {
                    assert_eq!(*transfer_index, Some(i as u64));
                }
                other => panic!("expected transfer, got {other:?}"),
            }
        }
    }

    #[test]
    fn event_transfer_esip1() {
        let mut tx = base_tx();
        tx.to_address = None;
        let to = Address::repeat_byte(0xab);
        let ethscription_id = B256::repeat_byte(0xde);
        tx.logs.push(L1Log {
            address: Address::repeat_byte(0xc0),
            topics: vec![*TRANSFER_TOPIC, to.into_word(), ethscription_id],
            data: Bytes::new(),
            log_index: 3,
            removed: false,
        });
        let esips = EsipConfig {
            esip1_block: Some(0),
            ..Default::default()
        };
        let ops = detect(&tx, 1, &esips);
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            Operation::Transfer {
                ethscription_id: id,
                from,
                to: decoded_to,
                event_log_index,
                ..
            } => {
                assert_eq!(*id, ethscription_id);
                assert_eq!(*from, Address::repeat_byte(0xc0));
                assert_eq!(*decoded_to, to);
                assert_eq!(*event_log_index, Some(3));
            }
            other => panic!("expected transfer, got {other:?}"),
        }
    }

    #[test]
    fn create_dedup_input_wins_over_event() {
        let mut tx = base_tx();
        tx.input = Bytes::from(b"data:,hello".to_vec());
        let content = DynSolValue::String("data:,from event".to_string()).abi_encode();
        tx.logs.push(L1Log {
            address: Address::repeat_byte(0x99),
            topics: vec![*CREATE_TOPIC, Address::repeat_byte(0x55).into_word()],
            data: Bytes::from(content),
            log_index: 0,
            removed: false,
        });
        let esips = EsipConfig {
            esip3_block: Some(0),
            ..Default::default()
        };
        let ops = detect(&tx, 1, &esips);
        let creates: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, Operation::Create { .. }))
            .collect();
        assert_eq!(creates.len(), 1);
    }

    #[test]
    fn topic_length_mismatch_is_skipped() {
        let mut tx = base_tx();
        tx.to_address = None;
        tx.logs.push(L1Log {
            address: Address::repeat_byte(0xc0),
            topics: vec![*TRANSFER_TOPIC, Address::repeat_byte(0xab).into_word()],
            data: Bytes::new(),
            log_index: 0,
            removed: false,
        });
        let esips = EsipConfig {
            esip1_block: Some(0),
            ..Default::default()
        };
        assert!(detect(&tx, 1, &esips).is_empty());
    }
}
