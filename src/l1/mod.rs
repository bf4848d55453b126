//! L1 ingestion (component E, spec.md §4.E).
//!
//! [`L1Source`] abstracts the raw RPC boundary — grounded on magi's
//! `driver::info::InnerProvider` pattern of wrapping a `dyn Provider` behind a
//! narrow async trait so derivation logic can be tested against a fake
//! without a live node. [`RpcL1Source`] is the real implementation; the
//! prefetcher in [`prefetcher`] is what the importer actually talks to.

pub mod prefetcher;

use alloy_provider::Provider;
use alloy_rpc_types::{BlockNumberOrTag, BlockTransactionsKind};
use async_trait::async_trait;
use thiserror::Error;

use crate::types::l1::{L1Block, L1Log, L1Transaction};

pub use prefetcher::{PrefetchedBlock, Prefetcher};

/// Errors the prefetcher surfaces to the block importer (spec.md §7).
#[derive(Debug, Error)]
pub enum PrefetchError {
    /// The requested block hasn't resolved yet; the importer should sleep and retry.
    #[error("block {0} not ready")]
    NotReady(u64),
    /// The prefetcher is shutting down; in-flight promises resolve to this.
    #[error("prefetcher is shutting down")]
    Cancelled,
    /// The underlying RPC calls for this block failed.
    #[error("fetch failed for block {0}: {1}")]
    FetchFailed(u64, String),
}

/// Read-only access to the L1 (source) chain: block headers and transactions
/// with their receipts' logs (spec.md §6 "Source-chain RPC").
#[async_trait]
pub trait L1Source: Send + Sync {
    /// `getBlockNumber()`
    async fn get_block_number(&self) -> eyre::Result<u64>;
    /// `getBlockByNumber(n, full_txs=true)` + `getBlockReceipts(n)`, joined into
    /// one `(header, transactions)` pair.
    async fn get_block(&self, number: u64) -> eyre::Result<Option<(L1Block, Vec<L1Transaction>)>>;
}

/// An [L1Source] backed by a live JSON-RPC provider.
#[derive(Debug, Clone)]
pub struct RpcL1Source<P> {
    provider: P,
}

impl<P> RpcL1Source<P> {
    /// Wraps an already-constructed provider (e.g. `ProviderBuilder::new().on_http(url)`).
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync> L1Source for RpcL1Source<P> {
    async fn get_block_number(&self) -> eyre::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn get_block(&self, number: u64) -> eyre::Result<Option<(L1Block, Vec<L1Transaction>)>> {
        let Some(block) = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number), BlockTransactionsKind::Full)
            .await?
        else {
            return Ok(None);
        };

        let receipts = self
            .provider
            .get_block_receipts(alloy_rpc_types::BlockId::number(number))
            .await?
            .unwrap_or_default();

        let header = &block.header;
        let inner = &header.inner;
        let l1_block = L1Block {
            number: inner.number,
            block_hash: header.hash,
            parent_hash: inner.parent_hash,
            timestamp: inner.timestamp,
            base_fee: inner.base_fee_per_gas.unwrap_or_default(),
            mix_hash: inner.mix_hash,
            parent_beacon_block_root: inner.parent_beacon_block_root,
        };

        let mut transactions = Vec::new();
        for tx in block.transactions.txns() {
            use alloy_network::TransactionResponse as _;
            use alloy_rpc_types::TransactionTrait as _;

            let tx_hash = tx.tx_hash();
            let receipt = receipts.iter().find(|r| r.transaction_hash == tx_hash);
            let (status, logs): (bool, Vec<L1Log>) = match receipt {
                Some(r) => {
                    let logs = r
                        .inner
                        .logs()
                        .iter()
                        .map(|log| L1Log {
                            address: log.address(),
                            topics: log.topics().to_vec(),
                            data: log.inner.data.data.clone(),
                            log_index: log.log_index.unwrap_or_default(),
                            removed: log.removed,
                        })
                        .collect();
                    (r.inner.status(), logs)
                }
                None => (false, Vec::new()),
            };

            transactions.push(L1Transaction {
                block_hash: l1_block.block_hash,
                block_number: l1_block.number,
                block_timestamp: l1_block.timestamp,
                tx_hash,
                transaction_index: tx.transaction_index.unwrap_or_default(),
                input: tx.input().clone(),
                chain_id: tx.chain_id(),
                from_address: tx.from(),
                to_address: tx.to(),
                status: u64::from(status),
                logs,
            });
        }
        transactions.sort_by_key(|t| t.transaction_index);

        Ok(Some((l1_block, transactions)))
    }
}
