//! Deposit transaction builder (component D, spec.md §4.D).

pub mod selectors;
pub mod source_hash;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256};
use sha2::{Digest, Sha256};

use crate::codec;
use crate::common::Epoch;
use crate::protocol::{self, token};
use crate::types::deposit::{
    DepositTransaction, L1_ATTRIBUTES_GAS_LIMIT, OPERATION_GAS_LIMIT,
};
use crate::types::Operation;

/// The predeployed contracts a deposit's calldata targets.
#[derive(Debug, Clone, Copy)]
pub struct Predeploys {
    /// The Ethscriptions NFT/registry predeploy — target of every operation deposit
    pub ethscriptions: Address,
    /// The L1 attributes predeploy — target of the per-block epoch deposit
    pub l1_block: Address,
    /// The account that signs the L1-attributes deposit
    pub attributes_depositor: Address,
}

/// Builds [DepositTransaction]s from detected [Operation]s and L1 epoch data.
#[derive(Debug)]
pub struct DepositBuilder {
    predeploys: Predeploys,
}

impl DepositBuilder {
    /// Constructs a builder targeting the given predeploy addresses.
    pub fn new(predeploys: Predeploys) -> Self {
        Self { predeploys }
    }

    /// Builds the deposit for one operation at `operation_index` within the
    /// L1 transaction `tx_hash`.
    pub fn build_operation(&self, tx_hash: B256, operation_index: u64, op: &Operation) -> DepositTransaction {
        let (from, input) = match op {
            Operation::Create {
                creator,
                initial_owner,
                content_uri,
                tx_hash: create_tx_hash,
                mimetype,
                esip6,
                ..
            } => (*creator, self.create_calldata(*create_tx_hash, content_uri, mimetype, *initial_owner, *esip6)),
            Operation::Transfer {
                from,
                to,
                ethscription_id,
                ..
            } => (*from, transfer_calldata(*to, *ethscription_id)),
            Operation::TransferWithPreviousOwner {
                from,
                to,
                ethscription_id,
                previous_owner,
                ..
            } => (*from, transfer_for_previous_owner_calldata(*to, *ethscription_id, *previous_owner)),
        };

        DepositTransaction {
            source_hash: source_hash::operation_source_hash(tx_hash, operation_index),
            from,
            to: self.predeploys.ethscriptions,
            mint: 0,
            value: 0,
            gas_limit: OPERATION_GAS_LIMIT,
            is_system_tx: Bytes::new(),
            input: Bytes::from(input),
        }
    }

    fn create_calldata(
        &self,
        tx_hash: B256,
        content_uri: &str,
        _mimetype: &str,
        initial_owner: Address,
        esip6: bool,
    ) -> Vec<u8> {
        let parsed = codec::parse(content_uri);
        let (media_type, mime_subtype, was_base64, decoded_data) = match &parsed {
            Some(p) => (
                p.media_type.clone(),
                p.mime_subtype.clone(),
                p.is_base64,
                p.decoded_data.clone(),
            ),
            None => (String::new(), String::new(), false, Vec::new()),
        };
        let mimetype = parsed.as_ref().map(|p| p.mimetype.clone()).unwrap_or_default();

        let content_hash = B256::from_slice(&Sha256::digest(content_uri.as_bytes()));

        let payload = String::from_utf8(decoded_data.clone()).unwrap_or_default();
        let extraction = protocol::extract(&payload);
        let token_tuple = if extraction.protocol == "erc-20" {
            token::extract(&payload)
                .map(|t| t.params_tuple)
                .unwrap_or_else(token::zero_params_tuple)
        } else {
            token::zero_params_tuple()
        };

        let tuple = DynSolValue::Tuple(vec![
            DynSolValue::FixedBytes(tx_hash, 32),
            DynSolValue::FixedBytes(content_hash, 32),
            DynSolValue::Address(initial_owner),
            DynSolValue::Bytes(decoded_data),
            DynSolValue::String(mimetype),
            DynSolValue::String(media_type),
            DynSolValue::String(mime_subtype),
            DynSolValue::Bool(was_base64),
            DynSolValue::Bool(esip6),
            token_tuple,
        ]);

        let mut out = selectors::CREATE_ETHSCRIPTION.to_vec();
        out.extend(tuple.abi_encode_params());
        out
    }

    /// Builds the single L1-attributes deposit every L2 block's first
    /// transaction is (spec.md §4.D).
    pub fn build_l1_attributes(&self, epoch: &Epoch, sequence_number: u64) -> DepositTransaction {
        let mut input = selectors::SET_L1_BLOCK_VALUES.to_vec();
        input.extend_from_slice(&sequence_number.to_be_bytes());
        input.extend_from_slice(&epoch.number.to_be_bytes());
        input.extend_from_slice(&epoch.timestamp.to_be_bytes());
        input.extend_from_slice(&epoch.base_fee.to_be_bytes());
        input.extend_from_slice(epoch.hash.as_slice());

        DepositTransaction {
            source_hash: source_hash::l1_attributes_source_hash(epoch.hash, sequence_number),
            from: self.predeploys.attributes_depositor,
            to: self.predeploys.l1_block,
            mint: 0,
            value: 0,
            gas_limit: L1_ATTRIBUTES_GAS_LIMIT,
            is_system_tx: Bytes::new(),
            input: Bytes::from(input),
        }
    }
}

fn transfer_calldata(to: Address, ethscription_id: B256) -> Vec<u8> {
    let tuple = DynSolValue::Tuple(vec![
        DynSolValue::Address(to),
        DynSolValue::FixedBytes(ethscription_id, 32),
    ]);
    let mut out = selectors::TRANSFER_ETHSCRIPTION.to_vec();
    out.extend(tuple.abi_encode_params());
    out
}

fn transfer_for_previous_owner_calldata(to: Address, ethscription_id: B256, previous_owner: Address) -> Vec<u8> {
    let tuple = DynSolValue::Tuple(vec![
        DynSolValue::Address(to),
        DynSolValue::FixedBytes(ethscription_id, 32),
        DynSolValue::Address(previous_owner),
    ]);
    let mut out = selectors::TRANSFER_ETHSCRIPTION_FOR_PREVIOUS_OWNER.to_vec();
    out.extend(tuple.abi_encode_params());
    out
}

/// Orders operations the way deposits must appear within a block: by
/// `(tx.transaction_index, operation emission order)` (spec.md §5).
pub fn sort_key(tx_index: u64, op: &Operation) -> (u64, u8, u64) {
    let (tier, index) = op.emission_key();
    (tx_index, tier, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::operation::OperationSource;

    fn predeploys() -> Predeploys {
        Predeploys {
            ethscriptions: Address::repeat_byte(0xee),
            l1_block: Address::repeat_byte(0x15),
            attributes_depositor: Address::repeat_byte(0x01),
        }
    }

    #[test]
    fn create_calldata_embeds_sha256_of_content_uri() {
        let builder = DepositBuilder::new(predeploys());
        let op = Operation::Create {
            tx_hash: B256::repeat_byte(0x02),
            creator: Address::repeat_byte(0x11),
            initial_owner: Address::repeat_byte(0x22),
            content_uri: "data:,hello world".to_string(),
            mimetype: String::new(),
            esip6: false,
            source: OperationSource::Input,
            event_log_index: None,
        };
        let deposit = builder.build_operation(B256::repeat_byte(0x02), 0, &op);
        assert_eq!(deposit.to, predeploys().ethscriptions);
        assert_eq!(&deposit.input[..4], &selectors::CREATE_ETHSCRIPTION[..]);
    }

    #[test]
    fn operation_deposits_are_deterministic() {
        let builder = DepositBuilder::new(predeploys());
        let op = Operation::Transfer {
            ethscription_id: B256::repeat_byte(0xaa),
            from: Address::repeat_byte(0x11),
            to: Address::repeat_byte(0x22),
            transfer_index: Some(0),
            event_log_index: None,
        };
        let tx_hash = B256::repeat_byte(0x03);
        let a = builder.build_operation(tx_hash, 1, &op);
        let b = builder.build_operation(tx_hash, 1, &op);
        assert_eq!(a, b);
    }

    #[test]
    fn create_calldata_nests_token_params_for_a_real_data_uri() {
        let builder = DepositBuilder::new(predeploys());
        let content_uri = r#"data:,{"p":"erc-20","op":"mint","tick":"punk","id":"1","amt":"100"}"#;
        let input = builder.create_calldata(
            B256::repeat_byte(0x02),
            content_uri,
            "",
            Address::repeat_byte(0x22),
            false,
        );
        let zero_tuple_encoded = {
            let mut out = selectors::CREATE_ETHSCRIPTION.to_vec();
            out.extend(
                DynSolValue::Tuple(vec![
                    DynSolValue::FixedBytes(B256::repeat_byte(0x02), 32),
                    DynSolValue::FixedBytes(B256::from_slice(&Sha256::digest(content_uri.as_bytes())), 32),
                    DynSolValue::Address(Address::repeat_byte(0x22)),
                    DynSolValue::Bytes(content_uri.strip_prefix("data:,").unwrap().as_bytes().to_vec()),
                    DynSolValue::String(String::new()),
                    DynSolValue::String(String::new()),
                    DynSolValue::String(String::new()),
                    DynSolValue::Bool(false),
                    DynSolValue::Bool(false),
                    token::zero_params_tuple(),
                ])
                .abi_encode_params(),
            );
            out
        };
        assert_ne!(
            input, zero_tuple_encoded,
            "token payload should produce a non-zero nested params tuple"
        );
    }

    #[test]
    fn l1_attributes_deposit_uses_attributes_depositor() {
        let builder = DepositBuilder::new(predeploys());
        let epoch = Epoch {
            number: 100,
            hash: B256::repeat_byte(0x09),
            timestamp: 123,
            base_fee: 7,
        };
        let deposit = builder.build_l1_attributes(&epoch, 0);
        assert_eq!(deposit.from, predeploys().attributes_depositor);
        assert_eq!(deposit.to, predeploys().l1_block);
        assert_eq!(deposit.gas_limit, L1_ATTRIBUTES_GAS_LIMIT);
    }
}
