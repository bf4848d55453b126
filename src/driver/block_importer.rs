//! The [BlockImporter] itself: startup recovery and the main import loop
//! (spec.md §4.F).
//!
//! Grounded on magi's `driver::info::HeadInfoQuery` (fallback-on-failure head
//! recovery) and `derive::state::State` (bounded `BTreeMap` cache + `prune`).
//! This indexer derives exactly one L2 block per imported L1 block — there
//! are no continuation blocks within an epoch — so every produced block's
//! `sequence_number` is `0` and recovery never needs to walk back *within*
//! an epoch, only across L1 blocks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::Bytes;
use tokio::sync::mpsc::UnboundedSender;

use crate::common::{BlockInfo, Epoch};
use crate::deposit::DepositBuilder;
use crate::engine::{Engine, ProposeBlockRequest};
use crate::l1::PrefetchError;
use crate::types::l1::L1Block;
use crate::validation::{ValidationJob, ValidationStore};

use super::{BlockSource, ImporterError};

/// Epochs older than this many L1 blocks are pruned from the cache (spec.md §4.F).
const CACHE_WINDOW: u64 = 65;
/// How far behind the L2 tip the safe head trails.
const SAFE_LAG: u64 = 31;
/// How far behind the L2 tip the finalized head trails.
const FINALIZED_LAG: u64 = 63;

#[derive(Debug, Clone)]
struct CachedEpoch {
    l1_block: L1Block,
    l2_block: BlockInfo,
}

/// Derives a canonical L2 chain of deposit transactions from Ethscriptions
/// activity on L1, one L2 block per imported L1 block.
pub struct BlockImporter<S, E> {
    source: Arc<S>,
    engine: Arc<E>,
    builder: DepositBuilder,
    retry_offset: u64,
    cache: Mutex<BTreeMap<u64, CachedEpoch>>,
    l2_head: Mutex<Option<BlockInfo>>,
    cursor: Mutex<u64>,
    validation_store: Option<Arc<dyn ValidationStore>>,
    validation_tx: Option<UnboundedSender<ValidationJob>>,
}

impl<S, E> std::fmt::Debug for BlockImporter<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockImporter")
            .field("next_block_to_import", &*self.cursor.lock().unwrap())
            .finish_non_exhaustive()
    }
}

impl<S: BlockSource, E: Engine> BlockImporter<S, E> {
    /// Builds an importer over `source`/`engine`, with `retry_offset` L1
    /// confirmations required during startup recovery.
    pub fn new(source: Arc<S>, engine: Arc<E>, builder: DepositBuilder, retry_offset: u64) -> Self {
        Self {
            source,
            engine,
            builder,
            retry_offset,
            cache: Mutex::new(BTreeMap::new()),
            l2_head: Mutex::new(None),
            cursor: Mutex::new(0),
            validation_store: None,
            validation_tx: None,
        }
    }

    /// Wires a persisted validation store; a prior recorded failure halts import.
    pub fn with_validation_store(mut self, store: Arc<dyn ValidationStore>) -> Self {
        self.validation_store = Some(store);
        self
    }

    /// Wires a channel the importer enqueues [ValidationJob]s onto after each import.
    pub fn with_validation_queue(mut self, tx: UnboundedSender<ValidationJob>) -> Self {
        self.validation_tx = Some(tx);
        self
    }

    /// The next L1 block number the importer will attempt to import.
    pub fn next_block_to_import(&self) -> u64 {
        *self.cursor.lock().unwrap()
    }

    /// Startup recovery (spec.md §4.F): finds the execution engine's head,
    /// walks back until the epoch's L1 attributes match the live L1 chain
    /// and are old enough to be past reorg risk, then resumes from there.
    pub async fn recover(&self) -> Result<(), ImporterError> {
        let l1_tip = self.source.l1_tip().await?;

        let Some(head) = self.engine.head().await? else {
            *self.cursor.lock().unwrap() = l1_tip.saturating_sub(self.retry_offset);
            return Ok(());
        };

        let mut l2_number = head.number;
        loop {
            let attrs = self.engine.get_l1_attributes(l2_number).await?;
            let live = self.source.fetch(attrs.number).await;
            let matches_live = matches!(&live, Ok(b) if b.eth_block.block_hash == attrs.hash);
            let old_enough = attrs.number.saturating_add(self.retry_offset) <= l1_tip;

            if matches_live && old_enough {
                self.cache.lock().unwrap().insert(
                    attrs.number,
                    CachedEpoch {
                        l1_block: live.unwrap().eth_block.clone(),
                        l2_block: head,
                    },
                );
                *self.l2_head.lock().unwrap() = Some(head);
                *self.cursor.lock().unwrap() = attrs.number + 1;
                return Ok(());
            }

            if l2_number == 0 {
                *self.cursor.lock().unwrap() = l1_tip.saturating_sub(self.retry_offset);
                return Ok(());
            }
            l2_number -= 1;
        }
    }

    fn select_safe_finalized(&self, head_l1_number: u64, head: BlockInfo) -> (BlockInfo, BlockInfo) {
        let cache = self.cache.lock().unwrap();
        let oldest = cache.values().next().map(|e| e.l2_block).unwrap_or(head);

        let safe = cache
            .iter()
            .rev()
            .find(|(n, _)| **n + SAFE_LAG <= head_l1_number)
            .map(|(_, e)| e.l2_block)
            .unwrap_or(oldest);

        let finalized = cache
            .iter()
            .rev()
            .find(|(n, _)| **n + FINALIZED_LAG <= head_l1_number)
            .map(|(_, e)| e.l2_block)
            .unwrap_or(oldest);

        (safe, finalized)
    }

    /// Runs one iteration of the main import loop (spec.md §4.F steps 1-7).
    /// Returns `Err(NotReady)` when the next block hasn't been fetched yet —
    /// callers should sleep and retry. `Reorg`/`ValidationFailure` are fatal.
    pub async fn advance(&self) -> Result<u64, ImporterError> {
        let next = self.next_block_to_import();

        if let Some(store) = &self.validation_store {
            if next > 0 {
                if let Some(failed_at) = store
                    .first_failure_at_or_before(next - 1)
                    .await
                    .map_err(ImporterError::Other)?
                {
                    return Err(ImporterError::ValidationFailure(failed_at));
                }
            }
        }

        self.source.ensure_prefetched(next);
        let fetched = match self.source.fetch(next).await {
            Ok(b) => b,
            Err(PrefetchError::NotReady(n)) => return Err(ImporterError::NotReady(n)),
            Err(e) => return Err(ImporterError::Prefetch(e)),
        };

        let head_l1_number = {
            let cache = self.cache.lock().unwrap();
            match cache.iter().next_back() {
                Some((n, prev)) => {
                    if prev.l1_block.block_hash != fetched.eth_block.parent_hash {
                        return Err(ImporterError::Reorg(next));
                    }
                    *n
                }
                None => next,
            }
        };

        let epoch = Epoch {
            number: fetched.eth_block.number,
            hash: fetched.eth_block.block_hash,
            timestamp: fetched.eth_block.timestamp,
            base_fee: fetched.eth_block.base_fee,
        };
        let mut transactions = vec![Bytes::from(self.builder.build_l1_attributes(&epoch, 0).encode_envelope())];
        transactions.extend(fetched.deposits.iter().map(|d| Bytes::from(d.encode_envelope())));

        let l2_head = self.l2_head.lock().unwrap().unwrap_or_default();
        let (safe, finalized) = self.select_safe_finalized(head_l1_number, l2_head);

        let request = ProposeBlockRequest {
            transactions,
            new_block_number: next,
            head: l2_head,
            safe,
            finalized,
        };
        let produced = self.engine.propose_block(request).await?;
        let last = produced
            .last()
            .ok_or_else(|| ImporterError::Other(eyre::eyre!("engine returned no blocks for L1 block {next}")))?;
        let new_head = BlockInfo {
            hash: last.block_hash,
            number: last.number,
            parent_hash: last.parent_hash,
            timestamp: last.timestamp,
        };

        {
            let mut cache = self.cache.lock().unwrap();
            cache.insert(
                next,
                CachedEpoch {
                    l1_block: fetched.eth_block.clone(),
                    l2_block: new_head,
                },
            );
            let prune_before = next.saturating_sub(CACHE_WINDOW - 1);
            *cache = cache.split_off(&prune_before);
        }
        *self.l2_head.lock().unwrap() = Some(new_head);
        self.source.clear_older_than(next);
        *self.cursor.lock().unwrap() = next + 1;

        if let Some(tx) = &self.validation_tx {
            let hashes = produced.iter().map(|b| b.block_hash).collect();
            let _ = tx.send(ValidationJob {
                l1_block: next,
                l2_block_hashes: hashes,
            });
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use crate::l1::PrefetchedBlock;
    use crate::types::l1::L1Transaction;
    use crate::types::l2::EthscriptionsBlock;
    use alloy_primitives::{Bloom, B256};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeSource {
        blocks: Mutex<HashMap<u64, PrefetchedBlock>>,
        tip: u64,
    }

    #[async_trait]
    impl BlockSource for FakeSource {
        async fn fetch(&self, n: u64) -> Result<Arc<PrefetchedBlock>, PrefetchError> {
            self.blocks
                .lock()
                .unwrap()
                .get(&n)
                .cloned()
                .map(Arc::new)
                .ok_or(PrefetchError::NotReady(n))
        }

        fn ensure_prefetched(&self, _from: u64) {}

        fn clear_older_than(&self, _n: u64) {}

        async fn l1_tip(&self) -> eyre::Result<u64> {
            Ok(self.tip)
        }
    }

    fn block(number: u64, parent_hash: B256) -> PrefetchedBlock {
        PrefetchedBlock {
            eth_block: L1Block {
                number,
                block_hash: B256::repeat_byte(number as u8),
                parent_hash,
                timestamp: 1000 + number,
                base_fee: 5,
                mix_hash: B256::ZERO,
                parent_beacon_block_root: None,
            },
            ethscription_txs: Vec::<L1Transaction>::new(),
            deposits: Vec::new(),
        }
    }

    fn builder() -> DepositBuilder {
        use crate::deposit::Predeploys;
        use alloy_primitives::Address;
        DepositBuilder::new(Predeploys {
            ethscriptions: Address::repeat_byte(0xee),
            l1_block: Address::repeat_byte(0x15),
            attributes_depositor: Address::repeat_byte(0x01),
        })
    }

    fn l2_block(number: u64, hash: B256, parent_hash: B256) -> EthscriptionsBlock {
        EthscriptionsBlock {
            number,
            block_hash: hash,
            parent_hash,
            timestamp: 1000 + number,
            state_root: B256::ZERO,
            receipts_root: B256::ZERO,
            gas_used: 0,
            gas_limit: 30_000_000,
            prev_randao: B256::ZERO,
            logs_bloom: Bloom::default(),
            epoch: Epoch::default(),
            sequence_number: 0,
        }
    }

    #[tokio::test]
    async fn advances_and_produces_a_block() {
        let mut blocks = HashMap::new();
        blocks.insert(1, block(1, B256::ZERO));
        let source = Arc::new(FakeSource { blocks: Mutex::new(blocks), tip: 100 });
        let engine = Arc::new(MockEngine::default());
        engine
            .proposed
            .lock()
            .unwrap()
            .push(l2_block(1, B256::repeat_byte(0xaa), B256::ZERO));

        let importer = BlockImporter::new(source, engine.clone(), builder(), 63);
        *importer.cursor.lock().unwrap() = 1;

        let imported = importer.advance().await.unwrap();
        assert_eq!(imported, 1);
        assert_eq!(importer.next_block_to_import(), 2);
        assert_eq!(engine.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reorg_is_detected_when_parent_hash_mismatches_cache() {
        let mut blocks = HashMap::new();
        blocks.insert(1, block(1, B256::ZERO));
        blocks.insert(2, block(2, B256::repeat_byte(0xff))); // wrong parent
        let source = Arc::new(FakeSource { blocks: Mutex::new(blocks), tip: 100 });
        let engine = Arc::new(MockEngine::default());
        engine
            .proposed
            .lock()
            .unwrap()
            .push(l2_block(1, B256::repeat_byte(1), B256::ZERO));

        let importer = BlockImporter::new(source, engine, builder(), 63);
        *importer.cursor.lock().unwrap() = 1;
        importer.advance().await.unwrap();

        let err = importer.advance().await.unwrap_err();
        assert!(matches!(err, ImporterError::Reorg(2)));
    }

    #[tokio::test]
    async fn not_ready_block_is_reported_without_advancing_cursor() {
        let source = Arc::new(FakeSource {
            blocks: Mutex::new(HashMap::new()),
            tip: 100,
        });
        let engine = Arc::new(MockEngine::default());
        let importer = BlockImporter::new(source, engine, builder(), 63);
        *importer.cursor.lock().unwrap() = 1;

        let err = importer.advance().await.unwrap_err();
        assert!(matches!(err, ImporterError::NotReady(1)));
        assert_eq!(importer.next_block_to_import(), 1);
    }

    #[tokio::test]
    async fn validation_failure_halts_import() {
        use crate::validation::SqliteValidationStore;
        use crate::types::ValidationResult;

        let store = SqliteValidationStore::in_memory().unwrap();
        store.upsert(ValidationResult::new(3, false, vec!["mismatch".into()], serde_json::Value::Null, 1)).await.unwrap();

        let source = Arc::new(FakeSource {
            blocks: Mutex::new(HashMap::new()),
            tip: 100,
        });
        let engine = Arc::new(MockEngine::default());
        let importer = BlockImporter::new(source, engine, builder(), 63).with_validation_store(Arc::new(store));
        *importer.cursor.lock().unwrap() = 4;

        let err = importer.advance().await.unwrap_err();
        assert!(matches!(err, ImporterError::ValidationFailure(3)));
    }

    #[tokio::test]
    async fn recovery_falls_back_to_retry_offset_when_engine_has_no_head() {
        let source = Arc::new(FakeSource {
            blocks: Mutex::new(HashMap::new()),
            tip: 200,
        });
        let engine = Arc::new(MockEngine::default());
        let importer = BlockImporter::new(source, engine, builder(), 63);
        importer.recover().await.unwrap();
        assert_eq!(importer.next_block_to_import(), 137);
    }
}
