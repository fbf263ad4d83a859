//! In-memory store backend.
//!
//! Backs the store contracts with ordered maps. Used by the test suites
//! and by local single-process runs; the address-ordered map gives the
//! reserve index its iteration order for free.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use hive_common::postage::BatchId;
use hive_common::{Batch, ChunkAddress};

use crate::error::{BatchStoreError, GetError, StoreError};
use crate::store::{
    BatchStore, ChunkGetter, ChunkItem, GetMode, IndexItem, IndexVisitor, ReserveIndex,
    StampItem, StampStore,
};

/// In-memory chunk store: reserve index and chunk getter in one.
#[derive(Default)]
pub struct MemChunkStore {
    chunks: RwLock<BTreeMap<ChunkAddress, ChunkItem>>,
}

impl MemChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, item: ChunkItem) {
        self.chunks.write().insert(item.address, item);
    }

    pub fn remove(&self, addr: &ChunkAddress) -> Option<ChunkItem> {
        self.chunks.write().remove(addr)
    }

    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }
}

impl ReserveIndex for MemChunkStore {
    fn iterate(&self, start: &ChunkAddress, visit: IndexVisitor<'_>) -> hive_common::Result<()> {
        // snapshot the addresses so visitors may block without holding the
        // map lock against writers
        let addresses: Vec<ChunkAddress> =
            self.chunks.read().range(*start..).map(|(a, _)| *a).collect();
        for address in addresses {
            if visit(IndexItem { address })? {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkGetter for MemChunkStore {
    async fn get(&self, _mode: GetMode, addr: &ChunkAddress) -> Result<ChunkItem, GetError> {
        self.chunks
            .read()
            .get(addr)
            .cloned()
            .ok_or(GetError::NotFound)
    }
}

/// In-memory batch store.
#[derive(Default)]
pub struct MemBatchStore {
    batches: RwLock<HashMap<BatchId, Batch>>,
}

impl MemBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, batch: Batch) {
        self.batches.write().insert(batch.id, batch);
    }

    pub fn remove(&self, id: &BatchId) -> Option<Batch> {
        self.batches.write().remove(id)
    }
}

#[async_trait]
impl BatchStore for MemBatchStore {
    async fn get(&self, id: &BatchId) -> Result<Batch, BatchStoreError> {
        self.batches
            .read()
            .get(id)
            .cloned()
            .ok_or(BatchStoreError::NotFound)
    }
}

/// In-memory stamp store.
#[derive(Default)]
pub struct MemStampStore {
    items: RwLock<HashMap<(BatchId, ChunkAddress), StampItem>>,
}

impl MemStampStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }
}

#[async_trait]
impl StampStore for MemStampStore {
    async fn get(
        &self,
        batch_id: &BatchId,
        addr: &ChunkAddress,
    ) -> Result<Option<StampItem>, StoreError> {
        Ok(self.items.read().get(&(*batch_id, *addr)).cloned())
    }

    async fn put(&self, item: StampItem) -> Result<(), StoreError> {
        self.items
            .write()
            .insert((item.batch_id, item.chunk_address), item);
        Ok(())
    }
}
