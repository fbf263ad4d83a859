//! External store contracts the sampler and stamper consume.
//!
//! The persistent engines behind these traits live outside this crate;
//! `mem` ships an in-memory backend for tests and local runs.

use async_trait::async_trait;
use bytes::Bytes;

use alloy::primitives::Signature;
use hive_common::postage::BatchId;
use hive_common::{Batch, ChunkAddress};

use crate::error::{BatchStoreError, GetError, StoreError};

/// Retrieval mode passed to the chunk getter. Sampling always retrieves
/// `Sync`, which must not trigger network retrieval side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GetMode {
    /// Local-only read for background processes.
    Sync,
    /// Read on behalf of an external request.
    Request,
}

/// An entry of the reserve index. Exposes the chunk address; backends may
/// carry more.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexItem {
    pub address: ChunkAddress,
}

/// A stored chunk together with its stamp fields, as handed out by the
/// chunk getter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkItem {
    pub address: ChunkAddress,
    pub data: Bytes,
    pub batch_id: BatchId,
    /// Packed stamp index (bucket, sub-index).
    pub index: u64,
    /// Stamp timestamp, unix nanoseconds.
    pub timestamp: u64,
    pub signature: Signature,
}

/// Visitor result: `Ok(true)` stops the iteration.
pub type IndexVisitor<'a> = &'a mut dyn FnMut(IndexItem) -> hive_common::Result<bool>;

/// The reserve index: chunk addresses in ascending lexicographic order,
/// stable under concurrent reads.
pub trait ReserveIndex: Send + Sync {
    /// Visit items starting from `start` (inclusive) in address order.
    /// A visitor error aborts the iteration and is returned as is.
    fn iterate(&self, start: &ChunkAddress, visit: IndexVisitor<'_>) -> hive_common::Result<()>;
}

/// Local chunk retrieval.
#[async_trait]
pub trait ChunkGetter: Send + Sync {
    async fn get(&self, mode: GetMode, addr: &ChunkAddress) -> Result<ChunkItem, GetError>;
}

/// Trusted batch records.
#[async_trait]
pub trait BatchStore: Send + Sync {
    async fn get(&self, id: &BatchId) -> Result<Batch, BatchStoreError>;
}

/// The authoritative stamp record for a (batch, chunk address) pair.
/// At most one such record exists per key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StampItem {
    pub batch_id: BatchId,
    pub chunk_address: ChunkAddress,
    pub index: u64,
    pub timestamp: u64,
}

/// Storage for stamp records. Callers serialize access per batch through
/// the keyed mutex; the store itself only has to be consistent per call.
#[async_trait]
pub trait StampStore: Send + Sync {
    async fn get(
        &self,
        batch_id: &BatchId,
        addr: &ChunkAddress,
    ) -> Result<Option<StampItem>, StoreError>;

    async fn put(&self, item: StampItem) -> Result<(), StoreError>;
}
