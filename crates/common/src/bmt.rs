//! Binary Merkle tree hash over chunk data.
//!
//! The first 8 bytes of the input are the little-endian span; the rest is
//! payload. The payload is zero-padded to 4096 bytes and folded pairwise
//! with keccak256 down to a single 32-byte root; the final digest is
//! keccak256 over span and root.
//!
//! The keyed variant prefixes every compression with the key. It is the
//! same fold, so an empty key reproduces the plain chunk address hash.

use alloy::primitives::{Keccak256, B256};
use thiserror::Error;

/// Size of one tree segment.
pub const SEGMENT_SIZE: usize = 32;
/// Number of segments at the leaf level.
pub const BRANCHES: usize = 128;
/// Maximum payload covered by one tree: 4096 bytes.
pub const CHUNK_SIZE: usize = SEGMENT_SIZE * BRANCHES;
/// Size of the span header in bytes.
pub const SPAN_SIZE: usize = 8;
/// Maximum total input size: span plus payload.
pub const MAX_DATA_SIZE: usize = CHUNK_SIZE + SPAN_SIZE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BmtError {
    #[error("input too short: {0} bytes, need at least the {SPAN_SIZE}-byte span")]
    ShortInput(usize),
}

/// A reusable binary Merkle tree hasher.
///
/// Each pipeline worker owns one instance; the internal buffer is reused
/// between chunks.
pub struct BmtHasher {
    key: Vec<u8>,
    buf: Box<[u8; CHUNK_SIZE]>,
}

impl BmtHasher {
    /// Plain hasher, as used for content addressing.
    pub fn new() -> Self {
        Self::keyed(&[])
    }

    /// Keyed hasher. Every compression is seeded with `key`, which makes
    /// the digest a keyed transform of the same tree.
    pub fn keyed(key: &[u8]) -> Self {
        BmtHasher {
            key: key.to_vec(),
            buf: Box::new([0u8; CHUNK_SIZE]),
        }
    }

    /// Hash `data`, interpreted as span followed by payload. Payload beyond
    /// one chunk's capacity is ignored, matching the tree's fixed width.
    pub fn sum(&mut self, data: &[u8]) -> Result<B256, BmtError> {
        if data.len() < SPAN_SIZE {
            return Err(BmtError::ShortInput(data.len()));
        }
        let span = &data[..SPAN_SIZE];
        let payload = &data[SPAN_SIZE..];
        let take = payload.len().min(CHUNK_SIZE);
        self.buf[..take].copy_from_slice(&payload[..take]);
        self.buf[take..].fill(0);

        let mut width = CHUNK_SIZE;
        while width > SEGMENT_SIZE {
            let mut read = 0;
            let mut write = 0;
            while read < width {
                let node = keyed_keccak(&self.key, &[&self.buf[read..read + 2 * SEGMENT_SIZE]]);
                self.buf[write..write + SEGMENT_SIZE].copy_from_slice(node.as_slice());
                read += 2 * SEGMENT_SIZE;
                write += SEGMENT_SIZE;
            }
            width /= 2;
        }

        let root = self.buf[..SEGMENT_SIZE].to_vec();
        Ok(keyed_keccak(&self.key, &[span, &root]))
    }
}

impl Default for BmtHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn keyed_keccak(key: &[u8], parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(key);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}
