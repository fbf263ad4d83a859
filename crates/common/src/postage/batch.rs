//! Batch records and collision-bucket arithmetic.

use alloy::primitives::{Address, B256};

use crate::address::ChunkAddress;

/// 32-byte batch identifier.
pub type BatchId = B256;

/// A trusted batch record, as mirrored from the batch store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub id: BatchId,
    /// Address stamps of this batch must recover to.
    pub owner: Address,
    /// Total capacity: the batch covers 2^depth chunk slots.
    pub depth: u8,
    /// The top `bucket_depth` bits of a chunk address select its bucket.
    pub bucket_depth: u8,
    /// Whether the batch has cleared its on-chain grace period.
    pub usable: bool,
}

impl Batch {
    /// Slots available per bucket: 2^(depth - bucket_depth).
    pub fn bucket_upper_bound(&self) -> u32 {
        bucket_upper_bound(self.depth, self.bucket_depth)
    }

    /// Number of buckets: 2^bucket_depth.
    pub fn bucket_count(&self) -> usize {
        1usize << self.bucket_depth
    }
}

/// The collision bucket of `addr`: its top `bucket_depth` address bits.
pub fn to_bucket(bucket_depth: u8, addr: &ChunkAddress) -> u32 {
    let mut head = [0u8; 4];
    head.copy_from_slice(&addr.as_bytes()[..4]);
    u32::from_be_bytes(head) >> (32 - bucket_depth as u32)
}

/// Pack a bucket and its running sub-index into a stamp index:
/// bucket (4 bytes BE) followed by sub-index (4 bytes BE).
pub fn bucket_index(bucket: u32, sub: u32) -> u64 {
    ((bucket as u64) << 32) | sub as u64
}

/// Split a stamp index back into (bucket, sub-index).
pub fn split_index(index: u64) -> (u32, u32) {
    ((index >> 32) as u32, index as u32)
}

/// Slots available per bucket under the given depths.
pub fn bucket_upper_bound(depth: u8, bucket_depth: u8) -> u32 {
    1u32 << (depth - bucket_depth) as u32
}
