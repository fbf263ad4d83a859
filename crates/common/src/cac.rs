//! Content-addressed chunks.
//!
//! A content-addressed chunk carries an 8-byte little-endian span followed
//! by at most 4096 bytes of payload; its address is the binary Merkle tree
//! hash of that data.

use bytes::Bytes;
use thiserror::Error;

use crate::address::ChunkAddress;
use crate::bmt::{BmtError, BmtHasher, CHUNK_SIZE, MAX_DATA_SIZE, SPAN_SIZE};
use crate::chunk::Chunk;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacError {
    #[error("payload too large: {0} bytes, max {CHUNK_SIZE}")]
    PayloadTooLarge(usize),
    #[error("chunk data too small: {0} bytes, need at least {SPAN_SIZE}")]
    DataTooSmall(usize),
    #[error("chunk data too large: {0} bytes, max {MAX_DATA_SIZE}")]
    DataTooLarge(usize),
    #[error(transparent)]
    Hash(#[from] BmtError),
}

/// A content-addressed chunk.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Cac {
    address: ChunkAddress,
    data: Bytes,
}

impl Cac {
    /// Build a chunk from a bare payload. The little-endian span is
    /// prepended before hashing.
    pub fn new(payload: &[u8]) -> Result<Self, CacError> {
        if payload.len() > CHUNK_SIZE {
            return Err(CacError::PayloadTooLarge(payload.len()));
        }
        let mut data = Vec::with_capacity(SPAN_SIZE + payload.len());
        data.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        data.extend_from_slice(payload);
        Self::new_with_data_span(Bytes::from(data))
    }

    /// Build a chunk from data that already carries its span header.
    pub fn new_with_data_span(data: impl Into<Bytes>) -> Result<Self, CacError> {
        let data = data.into();
        if data.len() < SPAN_SIZE {
            return Err(CacError::DataTooSmall(data.len()));
        }
        if data.len() > MAX_DATA_SIZE {
            return Err(CacError::DataTooLarge(data.len()));
        }
        let address = BmtHasher::new().sum(&data)?.into();
        Ok(Cac { address, data })
    }

    pub fn address(&self) -> ChunkAddress {
        self.address
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The little-endian span header.
    pub fn span(&self) -> u64 {
        let mut span = [0u8; SPAN_SIZE];
        span.copy_from_slice(&self.data[..SPAN_SIZE]);
        u64::from_le_bytes(span)
    }

    pub fn chunk(&self) -> Chunk {
        Chunk::new(self.address, self.data.clone())
    }
}

/// A chunk is a valid content-addressed chunk iff recomputing the binary
/// Merkle tree hash of its data reproduces its address.
pub fn valid(chunk: &Chunk) -> bool {
    let data = chunk.data();
    if data.len() < SPAN_SIZE || data.len() > MAX_DATA_SIZE {
        return false;
    }
    match BmtHasher::new().sum(data) {
        Ok(digest) => ChunkAddress::from(digest) == *chunk.address(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_matches_new_with_data_span() {
        let payload = b"equivalence probe";
        let a = Cac::new(payload).expect("cac");

        let mut data = (payload.len() as u64).to_le_bytes().to_vec();
        data.extend_from_slice(payload);
        let b = Cac::new_with_data_span(data).expect("cac");

        assert_eq!(a, b);
        assert_eq!(a.span(), payload.len() as u64);
    }

    #[test]
    fn test_size_limits() {
        assert_eq!(
            Cac::new(&vec![0u8; CHUNK_SIZE + 1]),
            Err(CacError::PayloadTooLarge(CHUNK_SIZE + 1))
        );
        assert_eq!(
            Cac::new_with_data_span(vec![0u8; SPAN_SIZE - 1]),
            Err(CacError::DataTooSmall(SPAN_SIZE - 1))
        );
        assert_eq!(
            Cac::new_with_data_span(vec![0u8; CHUNK_SIZE + SPAN_SIZE + 1]),
            Err(CacError::DataTooLarge(CHUNK_SIZE + SPAN_SIZE + 1))
        );
        assert!(Cac::new(&vec![0u8; CHUNK_SIZE]).is_ok());
        assert!(Cac::new(b"").is_ok());
    }

    #[test]
    fn test_valid_rejects_tampered_data() {
        let c = Cac::new(b"original payload").expect("cac");
        assert!(valid(&c.chunk()));

        let mut data = c.data().to_vec();
        data[SPAN_SIZE] ^= 0xff;
        let tampered = Chunk::new(c.address(), data);
        assert!(!valid(&tampered));
    }

    #[test]
    fn test_empty_payload_chunk() {
        let c = Cac::new(b"").expect("cac");
        assert_eq!(c.span(), 0);
        assert_eq!(c.data().len(), SPAN_SIZE);
        assert!(valid(&c.chunk()));
    }
}
