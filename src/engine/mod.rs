//! The L2 execution engine client (spec.md §6 "L2 execution engine").
//!
//! Reworked from magi's real `engine_forkchoiceUpdated`/`engine_newPayload`/
//! `engine_getPayload` triad into the simpler interface this system actually
//! needs: head discovery, per-block L1-attributes lookup, and a single
//! `proposeBlock` call that both applies a block's deposits and returns the
//! resulting L2 block(s). Authentication reuses magi's [`auth::JwtSecret`]
//! JWT-bearer pattern unchanged.

pub mod auth;

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::BlockInfo;
use crate::types::EthscriptionsBlock;

use auth::JwtSecret;

/// Errors talking to the execution engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The HTTP request itself failed
    #[error("engine request failed: {0}")]
    Request(String),
    /// The engine returned a JSON-RPC error object
    #[error("engine returned an error: {0}")]
    Rpc(String),
    /// The response body didn't match the expected shape
    #[error("malformed engine response: {0}")]
    Malformed(String),
}

/// The L1-attributes epoch carried by one L2 block, as returned by
/// `getL1Attributes` (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Attributes {
    /// L1 block number
    pub number: u64,
    /// L1 block hash
    pub hash: B256,
    /// L1 block timestamp
    pub timestamp: u64,
    /// L1 base fee
    pub base_fee: u64,
    /// Position within the epoch; 0 at epoch start
    pub sequence_number: u64,
}

/// Everything `proposeBlock` needs: the ordered deposit envelopes (the
/// L1-attributes deposit first, then operation deposits — spec.md §4.F
/// step 5) plus the three fork-choice block references.
#[derive(Debug, Clone)]
pub struct ProposeBlockRequest {
    /// RLP-encoded, tx-type-prefixed deposit envelopes, in final block order
    pub transactions: Vec<Bytes>,
    /// The L1 block this L2 block derives from
    pub new_block_number: u64,
    /// Current canonical L2 head
    pub head: BlockInfo,
    /// Current safe L2 block
    pub safe: BlockInfo,
    /// Current finalized L2 block
    pub finalized: BlockInfo,
}

/// The L2 engine interface the block importer drives (spec.md §6).
#[async_trait]
pub trait Engine: Send + Sync + std::fmt::Debug {
    /// `getBlockByNumber("latest", false)` — head discovery.
    async fn head(&self) -> Result<Option<BlockInfo>, EngineError>;
    /// `getL1Attributes(l2_block_number)` — epoch lookup for recovery/reorg checks.
    async fn get_l1_attributes(&self, l2_block_number: u64) -> Result<L1Attributes, EngineError>;
    /// `proposeBlock(...)` — applies the deposits and returns the resulting L2 block(s).
    async fn propose_block(&self, request: ProposeBlockRequest) -> Result<Vec<EthscriptionsBlock>, EngineError>;
}

/// A JWT-authenticated HTTP JSON-RPC client for the execution engine,
/// mirroring the bearer-token pattern magi's (now generalized) `auth::JwtSecret`
/// was built for.
#[derive(Debug, Clone)]
pub struct EngineApi {
    client: reqwest::Client,
    url: String,
    secret: JwtSecret,
}

impl EngineApi {
    /// Builds a client targeting `url`, authenticating with `secret`.
    pub fn new(url: &str, secret: JwtSecret) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            secret,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, EngineError> {
        let claims = self.secret.generate_claims(None);
        let jwt = self
            .secret
            .encode(&claims)
            .map_err(|e| EngineError::Request(e.to_string()))?;

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Malformed(e.to_string()))?;

        if let Some(error) = value.get("error") {
            return Err(EngineError::Rpc(error.to_string()));
        }
        value
            .get("result")
            .cloned()
            .ok_or_else(|| EngineError::Malformed("missing result field".to_string()))
    }
}

#[async_trait]
impl Engine for EngineApi {
    async fn head(&self) -> Result<Option<BlockInfo>, EngineError> {
        let result = self.call("getBlockByNumber", json!(["latest", false])).await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| EngineError::Malformed(e.to_string()))
    }

    async fn get_l1_attributes(&self, l2_block_number: u64) -> Result<L1Attributes, EngineError> {
        let result = self.call("getL1Attributes", json!([l2_block_number])).await?;
        serde_json::from_value(result).map_err(|e| EngineError::Malformed(e.to_string()))
    }

    async fn propose_block(&self, request: ProposeBlockRequest) -> Result<Vec<EthscriptionsBlock>, EngineError> {
        let txs: Vec<String> = request.transactions.iter().map(|t| format!("0x{}", hex::encode(t))).collect();
        let params = json!([
            txs,
            request.new_block_number,
            request.head,
            request.safe,
            request.finalized,
        ]);
        let result = self.call("proposeBlock", params).await?;
        serde_json::from_value(result).map_err(|e| EngineError::Malformed(e.to_string()))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! An in-memory [Engine] double for driver tests, grounded on magi's
    //! deleted `engine::mock_engine` shape (records calls, returns canned
    //! responses without touching the network).

    use std::sync::Mutex;

    use super::*;

    /// A programmable [Engine] stand-in.
    #[derive(Debug, Default)]
    pub struct MockEngine {
        /// The head returned by [Engine::head]
        pub head: Mutex<Option<BlockInfo>>,
        /// L1 attributes keyed by L2 block number
        pub attributes: Mutex<std::collections::HashMap<u64, L1Attributes>>,
        /// The blocks returned by every [Engine::propose_block] call, in order
        pub proposed: Mutex<Vec<EthscriptionsBlock>>,
        /// Every request `propose_block` was called with
        pub requests: Mutex<Vec<ProposeBlockRequest>>,
    }

    #[async_trait]
    impl Engine for MockEngine {
        async fn head(&self) -> Result<Option<BlockInfo>, EngineError> {
            Ok(*self.head.lock().unwrap())
        }

        async fn get_l1_attributes(&self, l2_block_number: u64) -> Result<L1Attributes, EngineError> {
            self.attributes
                .lock()
                .unwrap()
                .get(&l2_block_number)
                .copied()
                .ok_or_else(|| EngineError::Malformed("no attributes for block".to_string()))
        }

        async fn propose_block(&self, request: ProposeBlockRequest) -> Result<Vec<EthscriptionsBlock>, EngineError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.proposed.lock().unwrap().drain(..).collect())
        }
    }
}
