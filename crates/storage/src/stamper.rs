//! Stamp issuance and verification.
//!
//! A stamper is created per upload session and connects a stamp issuer
//! with a signer. The read-modify-write of the stored stamp record runs
//! under the injected per-batch keyed mutex, so concurrent uploads sharing
//! a batch serialize on it; within that section the issuer's own lock
//! guards the bucket counters.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use alloy::primitives::Address;
use hive_common::postage::{self, BatchId, Stamp};
use hive_common::{Chunk, ChunkAddress, Signer};

use crate::error::StampError;
use crate::issuer::StampIssuer;
use crate::keyed_lock::KeyedMutex;
use crate::store::{BatchStore, StampItem, StampStore};

/// Issues stamps for chunk addresses.
#[async_trait]
pub trait Stamper: Send + Sync {
    async fn stamp(&self, addr: &ChunkAddress) -> Result<Stamp, StampError>;

    fn batch_id(&self) -> BatchId;
}

/// The lock key guarding stamp state of a batch.
fn stamp_lock_key(batch_id: &BatchId) -> String {
    format!("postageIdStamp-{}", hex::encode(batch_id))
}

/// Canonical stamper: issues and signs fresh stamps against a batch.
pub struct BatchStamper {
    store: Arc<dyn StampStore>,
    issuer: Arc<StampIssuer>,
    signer: Arc<dyn Signer>,
    locks: Arc<KeyedMutex>,
}

impl BatchStamper {
    pub fn new(
        store: Arc<dyn StampStore>,
        issuer: Arc<StampIssuer>,
        signer: Arc<dyn Signer>,
        locks: Arc<KeyedMutex>,
    ) -> Self {
        BatchStamper {
            store,
            issuer,
            signer,
            locks,
        }
    }
}

#[async_trait]
impl Stamper for BatchStamper {
    async fn stamp(&self, addr: &ChunkAddress) -> Result<Stamp, StampError> {
        let batch_id = *self.issuer.batch_id();
        let _section = self.locks.lock(&stamp_lock_key(&batch_id)).await;

        let (index, timestamp) = match self.store.get(&batch_id, addr).await? {
            // fresh (batch, address) pair: the first slot of an untouched
            // bucket is sub-index 0
            None => self.issuer.increment(addr)?,
            // replayed address: re-issue under the next slot
            Some(prev) => {
                debug!(chunk_address = %addr, prev_index = prev.index, "re-issuing stamp");
                self.issuer.increment(addr)?
            }
        };
        self.store
            .put(StampItem {
                batch_id,
                chunk_address: *addr,
                index,
                timestamp,
            })
            .await?;

        let digest = postage::to_sign_digest(addr, &batch_id, index, timestamp);
        let signature = self.signer.sign(digest)?;
        Ok(Stamp::new(batch_id, index, timestamp, signature))
    }

    fn batch_id(&self) -> BatchId {
        *self.issuer.batch_id()
    }
}

/// Stamper over a single pre-signed stamp, as used for chunks whose stamp
/// was produced elsewhere.
pub struct PresignedStamper {
    stamp: Stamp,
    owner: Address,
}

impl PresignedStamper {
    pub fn new(stamp: Stamp, owner: Address) -> Self {
        PresignedStamper { stamp, owner }
    }
}

#[async_trait]
impl Stamper for PresignedStamper {
    async fn stamp(&self, addr: &ChunkAddress) -> Result<Stamp, StampError> {
        let signer = postage::recover_batch_owner(addr, &self.stamp)?;
        if signer != self.owner {
            return Err(StampError::InvalidBatchSignature);
        }
        Ok(self.stamp.clone())
    }

    fn batch_id(&self) -> BatchId {
        *self.stamp.batch_id()
    }
}

/// Verify a serialized stamp against a chunk: the stamp must parse, its
/// batch must be known and usable, and the signature must recover to the
/// batch owner. Returns the parsed stamp.
pub async fn valid_stamp(
    chunk: &Chunk,
    stamp_bytes: &[u8],
    batches: &dyn BatchStore,
) -> Result<Stamp, StampError> {
    let stamp = Stamp::from_bytes(stamp_bytes)?;
    let batch = batches.get(stamp.batch_id()).await?;
    if !batch.usable {
        return Err(StampError::NotUsable);
    }
    let signer = postage::recover_batch_owner(chunk.address(), &stamp)?;
    if signer != batch.owner {
        return Err(StampError::InvalidBatchSignature);
    }
    Ok(stamp)
}
