//! Per-batch stamp issuance state.
//!
//! Tracks how many stamps each collision bucket of a batch has handed out.
//! The counters are the in-memory side of the stamp critical section; the
//! stored stamp records are the durable side.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::Address;
use parking_lot::Mutex;

use hive_common::postage::{self, bucket_index, to_bucket, Batch, BatchId};
use hive_common::ChunkAddress;

use crate::error::StampError;

/// Issues stamp indices for one batch. Bucket counters never exceed
/// `2^(depth - bucket_depth)`; overflow is reported as `BucketFull`.
pub struct StampIssuer {
    batch_id: BatchId,
    owner: Address,
    depth: u8,
    bucket_depth: u8,
    buckets: Mutex<Vec<u32>>,
}

impl StampIssuer {
    /// Build an issuer from a trusted batch record. Fails with `NotUsable`
    /// until the batch has cleared its grace period.
    pub fn new(batch: &Batch) -> Result<Self, StampError> {
        if !batch.usable {
            return Err(StampError::NotUsable);
        }
        Ok(StampIssuer {
            batch_id: batch.id,
            owner: batch.owner,
            depth: batch.depth,
            bucket_depth: batch.bucket_depth,
            buckets: Mutex::new(vec![0u32; batch.bucket_count()]),
        })
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn bucket_depth(&self) -> u8 {
        self.bucket_depth
    }

    /// Slots available per bucket.
    pub fn bucket_upper_bound(&self) -> u32 {
        postage::bucket_upper_bound(self.depth, self.bucket_depth)
    }

    /// Current population of the bucket `addr` falls into.
    pub fn bucket_count(&self, addr: &ChunkAddress) -> u32 {
        let bucket = to_bucket(self.bucket_depth, addr);
        self.buckets.lock()[bucket as usize]
    }

    /// Take the next slot of the bucket `addr` falls into. Returns the
    /// packed stamp index and an issuance timestamp in unix nanoseconds.
    pub fn increment(&self, addr: &ChunkAddress) -> Result<(u64, u64), StampError> {
        let bucket = to_bucket(self.bucket_depth, addr);
        let mut buckets = self.buckets.lock();
        let count = buckets[bucket as usize];
        if count == self.bucket_upper_bound() {
            return Err(StampError::BucketFull);
        }
        buckets[bucket as usize] = count + 1;
        Ok((bucket_index(bucket, count), unix_nanos()))
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
