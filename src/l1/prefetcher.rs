//! Bounded look-ahead prefetcher (spec.md §4.E).
//!
//! Grounded on magi's `l1::chain_watcher::InnerWatcher` background-task
//! shape, but reshaped from a push channel into a promise ring: the importer
//! needs to request an arbitrary block number up to `ahead` slots in
//! advance, not just "the next one". Concurrency is a fixed-size
//! `tokio::sync::Semaphore`, matching magi's bounded-worker style; each
//! slot is a `tokio::sync::watch` channel so `fetch` can await a result that
//! may already be in flight from a previous `ensure_prefetched` call.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{watch, Semaphore};

use crate::deposit::{self, DepositBuilder, Predeploys};
use crate::detector::{self, EsipConfig};
use crate::types::l1::{L1Block, L1Transaction};
use crate::types::DepositTransaction;

use super::{L1Source, PrefetchError};

/// One fetched and fully-derived L1 block: header, raw transactions (kept
/// for the validation engine's reference-feed comparison), and the ordered
/// deposit list the block importer hands to the execution engine.
#[derive(Debug, Clone)]
pub struct PrefetchedBlock {
    /// The L1 block header
    pub eth_block: L1Block,
    /// The L1 transactions (with receipt logs) this block carried
    pub ethscription_txs: Vec<L1Transaction>,
    /// Deposits derived from every detected operation, in block order
    pub deposits: Vec<DepositTransaction>,
}

#[derive(Clone)]
enum Outcome {
    Ready(Arc<PrefetchedBlock>),
    NotReady,
    Failed(String),
}

type Slot = watch::Receiver<Option<Outcome>>;

/// A bounded ring of in-flight block fetches, keyed by L1 block number.
pub struct Prefetcher {
    source: Arc<dyn L1Source>,
    builder: Arc<DepositBuilder>,
    esips: EsipConfig,
    ahead: u64,
    semaphore: Arc<Semaphore>,
    slots: Arc<Mutex<BTreeMap<u64, Slot>>>,
    shutdown: Arc<AtomicBool>,
}

impl std::fmt::Debug for Prefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prefetcher").field("ahead", &self.ahead).finish_non_exhaustive()
    }
}

impl Prefetcher {
    /// Builds a prefetcher with `ahead` look-ahead slots and `threads` worker permits.
    pub fn new(source: Arc<dyn L1Source>, predeploys: Predeploys, esips: EsipConfig, ahead: u64, threads: usize) -> Self {
        Self {
            source,
            builder: Arc::new(DepositBuilder::new(predeploys)),
            esips,
            ahead,
            semaphore: Arc::new(Semaphore::new(threads.max(1))),
            slots: Arc::new(Mutex::new(BTreeMap::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Schedules fetches for `[from, from + ahead)` that aren't already in flight.
    pub fn ensure_prefetched(&self, from: u64) {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }
        let mut slots = self.slots.lock().unwrap();
        for n in from..from.saturating_add(self.ahead) {
            if slots.contains_key(&n) {
                continue;
            }
            let (tx, rx) = watch::channel(None);
            slots.insert(n, rx);
            self.spawn_fetch(n, tx);
        }
    }

    fn spawn_fetch(&self, n: u64, tx: watch::Sender<Option<Outcome>>) {
        let source = self.source.clone();
        let builder = self.builder.clone();
        let esips = self.esips;
        let semaphore = self.semaphore.clone();
        let shutdown = self.shutdown.clone();
        let slots = self.slots.clone();
        tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            if shutdown.load(Ordering::SeqCst) {
                let _ = tx.send(Some(Outcome::Failed("shutting down".to_string())));
                return;
            }
            let outcome = match fetch_one(&*source, &builder, &esips, n).await {
                Ok(Some(block)) => Outcome::Ready(Arc::new(block)),
                Ok(None) => Outcome::NotReady,
                Err(e) => Outcome::Failed(e.to_string()),
            };
            // NotReady/Failed aren't cached — a later `ensure_prefetched` retries them.
            if !matches!(outcome, Outcome::Ready(_)) {
                slots.lock().unwrap().remove(&n);
            }
            let _ = tx.send(Some(outcome));
        });
    }

    /// Awaits the result of block `n`, scheduling it first if needed.
    pub async fn fetch(&self, n: u64) -> Result<Arc<PrefetchedBlock>, PrefetchError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(PrefetchError::Cancelled);
        }
        self.ensure_prefetched(n);
        let mut rx = {
            let slots = self.slots.lock().unwrap();
            slots.get(&n).cloned().expect("ensure_prefetched populates the slot")
        };
        loop {
            if let Some(outcome) = rx.borrow().clone() {
                return match outcome {
                    Outcome::Ready(block) => Ok(block),
                    Outcome::NotReady => Err(PrefetchError::NotReady(n)),
                    Outcome::Failed(e) => Err(PrefetchError::FetchFailed(n, e)),
                };
            }
            if rx.changed().await.is_err() {
                return Err(PrefetchError::Cancelled);
            }
        }
    }

    /// The L1 chain's current tip, for startup recovery's age check.
    pub async fn l1_tip(&self) -> eyre::Result<u64> {
        self.source.get_block_number().await
    }

    /// Evicts cached slots strictly older than `n`.
    pub fn clear_older_than(&self, n: u64) {
        let mut slots = self.slots.lock().unwrap();
        *slots = slots.split_off(&n);
    }

    /// Marks the prefetcher as shutting down; in-flight and future fetches resolve to `Cancelled`.
    pub async fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

async fn fetch_one(
    source: &dyn L1Source,
    builder: &DepositBuilder,
    esips: &EsipConfig,
    n: u64,
) -> eyre::Result<Option<PrefetchedBlock>> {
    let Some((eth_block, ethscription_txs)) = source.get_block(n).await? else {
        return Ok(None);
    };

    let mut keyed_deposits = Vec::new();
    for tx in &ethscription_txs {
        let ops = detector::detect(tx, n, esips);
        for (i, op) in ops.iter().enumerate() {
            let deposit = builder.build_operation(tx.tx_hash, i as u64, op);
            keyed_deposits.push((deposit::sort_key(tx.transaction_index, op), deposit));
        }
    }
    keyed_deposits.sort_by_key(|(key, _)| *key);
    let deposits = keyed_deposits.into_iter().map(|(_, d)| d).collect();

    Ok(Some(PrefetchedBlock {
        eth_block,
        ethscription_txs,
        deposits,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::l1::L1Log;
    use alloy_primitives::{Address, Bytes, B256};
    use async_trait::async_trait;

    struct FakeSource {
        blocks: std::collections::HashMap<u64, (L1Block, Vec<L1Transaction>)>,
    }

    #[async_trait]
    impl L1Source for FakeSource {
        async fn get_block_number(&self) -> eyre::Result<u64> {
            Ok(self.blocks.keys().max().copied().unwrap_or(0))
        }

        async fn get_block(&self, number: u64) -> eyre::Result<Option<(L1Block, Vec<L1Transaction>)>> {
            Ok(self.blocks.get(&number).cloned())
        }
    }

    fn predeploys() -> Predeploys {
        Predeploys {
            ethscriptions: Address::repeat_byte(0xee),
            l1_block: Address::repeat_byte(0x15),
            attributes_depositor: Address::repeat_byte(0x01),
        }
    }

    fn sample_block(number: u64) -> (L1Block, Vec<L1Transaction>) {
        let block = L1Block {
            number,
            block_hash: B256::repeat_byte(number as u8),
            parent_hash: B256::repeat_byte((number.saturating_sub(1)) as u8),
            timestamp: 1000 + number,
            base_fee: 10,
            mix_hash: B256::ZERO,
            parent_beacon_block_root: None,
        };
        let tx = L1Transaction {
            block_hash: block.block_hash,
            block_number: number,
            block_timestamp: block.timestamp,
            tx_hash: B256::repeat_byte(0xaa),
            transaction_index: 0,
            input: Bytes::from(b"data:,hello".to_vec()),
            chain_id: None,
            from_address: Address::repeat_byte(0x11),
            to_address: Some(Address::repeat_byte(0x22)),
            status: 1,
            logs: Vec::<L1Log>::new(),
        };
        (block, vec![tx])
    }

    #[tokio::test]
    async fn fetches_and_derives_deposits() {
        let mut blocks = std::collections::HashMap::new();
        blocks.insert(10, sample_block(10));
        let source = Arc::new(FakeSource { blocks });
        let prefetcher = Prefetcher::new(source, predeploys(), EsipConfig::default(), 5, 2);

        let fetched = prefetcher.fetch(10).await.unwrap();
        assert_eq!(fetched.eth_block.number, 10);
        assert_eq!(fetched.deposits.len(), 1);
    }

    #[tokio::test]
    async fn missing_block_is_not_ready() {
        let source = Arc::new(FakeSource {
            blocks: std::collections::HashMap::new(),
        });
        let prefetcher = Prefetcher::new(source, predeploys(), EsipConfig::default(), 5, 2);
        let err = prefetcher.fetch(1).await.unwrap_err();
        assert!(matches!(err, PrefetchError::NotReady(1)));
    }

    #[tokio::test]
    async fn shutdown_cancels_future_fetches() {
        let source = Arc::new(FakeSource {
            blocks: std::collections::HashMap::new(),
        });
        let prefetcher = Prefetcher::new(source, predeploys(), EsipConfig::default(), 5, 2);
        prefetcher.shutdown().await;
        let err = prefetcher.fetch(1).await.unwrap_err();
        assert!(matches!(err, PrefetchError::Cancelled));
    }
}
