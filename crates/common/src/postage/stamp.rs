//! Postage stamps: wire format, sign digest and owner recovery.

use alloy::primitives::{Keccak256, Signature, B256};
use thiserror::Error;

use crate::address::ChunkAddress;
use crate::crypto::{self, CryptoError, SIGNATURE_SIZE};

use super::batch::BatchId;

/// Serialized size of the index field.
pub const STAMP_INDEX_SIZE: usize = 8;
/// Serialized size of the timestamp field.
pub const STAMP_TIMESTAMP_SIZE: usize = 8;
/// Serialized stamp size: batch id, index, timestamp, signature.
pub const STAMP_SIZE: usize = 32 + STAMP_INDEX_SIZE + STAMP_TIMESTAMP_SIZE + SIGNATURE_SIZE;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("invalid stamp size: {0} bytes, expected {STAMP_SIZE}")]
    InvalidSize(usize),
    #[error("invalid batch signature")]
    InvalidBatchSignature,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// A postage stamp: the signed assertion that a chunk occupies a slot of a
/// batch at a point in time. Index and timestamp serialize big-endian.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stamp {
    batch_id: BatchId,
    index: u64,
    timestamp: u64,
    signature: Signature,
}

impl Stamp {
    pub fn new(batch_id: BatchId, index: u64, timestamp: u64, signature: Signature) -> Self {
        Stamp {
            batch_id,
            index,
            timestamp,
            signature,
        }
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    /// Packed (bucket, sub-index), big-endian on the wire.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Issuance time in unix nanoseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Serialize: batch_id(32) ‖ index(8 BE) ‖ timestamp(8 BE) ‖ sig(65).
    pub fn to_bytes(&self) -> [u8; STAMP_SIZE] {
        let mut out = [0u8; STAMP_SIZE];
        out[..32].copy_from_slice(self.batch_id.as_slice());
        out[32..40].copy_from_slice(&self.index.to_be_bytes());
        out[40..48].copy_from_slice(&self.timestamp.to_be_bytes());
        out[48..].copy_from_slice(&self.signature.as_bytes());
        out
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, StampError> {
        if raw.len() != STAMP_SIZE {
            return Err(StampError::InvalidSize(raw.len()));
        }
        let batch_id = BatchId::from_slice(&raw[..32]);
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&raw[32..40]);
        let index = u64::from_be_bytes(buf);
        buf.copy_from_slice(&raw[40..48]);
        let timestamp = u64::from_be_bytes(buf);
        let signature = crypto::signature_from_bytes(&raw[48..])?;
        Ok(Stamp {
            batch_id,
            index,
            timestamp,
            signature,
        })
    }
}

/// The digest a batch owner signs to stamp `addr`:
/// keccak256(addr ‖ batch_id ‖ index BE ‖ timestamp BE).
pub fn to_sign_digest(addr: &ChunkAddress, batch_id: &BatchId, index: u64, timestamp: u64) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(addr.as_slice());
    hasher.update(batch_id.as_slice());
    hasher.update(index.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    hasher.finalize()
}

/// Recover the address that signed `stamp` for chunk `addr`.
pub fn recover_batch_owner(addr: &ChunkAddress, stamp: &Stamp) -> Result<alloy::primitives::Address, StampError> {
    let digest = to_sign_digest(addr, &stamp.batch_id, stamp.index, stamp.timestamp);
    Ok(crypto::recover_address(digest, &stamp.signature)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Signer, WalletSigner};

    fn stamped(addr: &ChunkAddress, batch_id: BatchId, index: u64, ts: u64) -> (Stamp, WalletSigner) {
        let signer = WalletSigner::random();
        let digest = to_sign_digest(addr, &batch_id, index, ts);
        let sig = signer.sign(digest).expect("sign");
        (Stamp::new(batch_id, index, ts, sig), signer)
    }

    #[test]
    fn test_wire_roundtrip() {
        let addr = ChunkAddress::new([0x0f; 32]);
        let (stamp, _) = stamped(&addr, BatchId::repeat_byte(0x77), 0x0102_0304_0506_0708, 42);
        let raw = stamp.to_bytes();
        assert_eq!(raw.len(), STAMP_SIZE);
        // big-endian field layout
        assert_eq!(&raw[32..40], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        assert_eq!(&raw[40..48], &42u64.to_be_bytes());
        let parsed = Stamp::from_bytes(&raw).expect("parse");
        assert_eq!(parsed, stamp);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_size() {
        assert!(matches!(
            Stamp::from_bytes(&[0u8; STAMP_SIZE - 1]),
            Err(StampError::InvalidSize(_))
        ));
        assert!(matches!(
            Stamp::from_bytes(&[0u8; STAMP_SIZE + 1]),
            Err(StampError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_sign_digest_is_order_sensitive() {
        let a = ChunkAddress::new([1u8; 32]);
        let b = ChunkAddress::new([2u8; 32]);
        let batch = BatchId::repeat_byte(0x10);
        assert_ne!(
            to_sign_digest(&a, &batch, 0, 0),
            to_sign_digest(&b, &batch, 0, 0)
        );
        assert_ne!(
            to_sign_digest(&a, &batch, 1, 0),
            to_sign_digest(&a, &batch, 0, 1)
        );
    }

    #[test]
    fn test_recover_batch_owner() {
        let addr = ChunkAddress::new([0xaa; 32]);
        let (stamp, signer) = stamped(&addr, BatchId::repeat_byte(0x55), 7, 1234);
        let owner = recover_batch_owner(&addr, &stamp).expect("recover");
        assert_eq!(owner, signer.address());

        // recovery against a different chunk address does not yield the owner
        let other = ChunkAddress::new([0xab; 32]);
        match recover_batch_owner(&other, &stamp) {
            Ok(recovered) => assert_ne!(recovered, signer.address()),
            Err(StampError::Crypto(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
