//! Single-owner chunks.
//!
//! A single-owner chunk wraps a content-addressed chunk and binds it to an
//! owner: its address is keccak256(id ‖ owner) and its signature covers
//! keccak256(id ‖ inner address). Wire layout:
//!
//! ```text
//! id (32) ‖ signature (65) ‖ inner chunk data (span ‖ payload)
//! ```

use alloy::primitives::{Address, Keccak256, Signature};
use thiserror::Error;

use crate::address::ChunkAddress;
use crate::bmt::SPAN_SIZE;
use crate::cac::{Cac, CacError};
use crate::chunk::Chunk;
use crate::crypto::{self, CryptoError, Signer, SIGNATURE_SIZE};

/// Size of a single-owner chunk id in bytes.
pub const ID_SIZE: usize = 32;
/// Minimum serialized size: id, signature and an inner span header.
pub const MIN_CHUNK_SIZE: usize = ID_SIZE + SIGNATURE_SIZE + SPAN_SIZE;

#[derive(Debug, Error)]
pub enum SocError {
    #[error("chunk data too small: {0} bytes, need at least {MIN_CHUNK_SIZE}")]
    DataTooSmall(usize),
    #[error("signature does not recover to owner")]
    InvalidSignature,
    #[error("chunk address does not match id and owner")]
    AddressMismatch,
    #[error(transparent)]
    Inner(#[from] CacError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// A single-owner chunk with a verified signature.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Soc {
    id: [u8; ID_SIZE],
    owner: Address,
    signature: Signature,
    inner: Cac,
}

impl Soc {
    /// Build from pre-existing signature bytes. Fails unless the signature
    /// recovers to `owner` over the id and inner address.
    pub fn new_signed(
        id: [u8; ID_SIZE],
        inner: Cac,
        owner: Address,
        signature: &[u8],
    ) -> Result<Self, SocError> {
        let signature = crypto::signature_from_bytes(signature)?;
        let digest = to_sign_digest(&id, &inner.address());
        let recovered = crypto::recover_address(digest, &signature)?;
        if recovered != owner {
            return Err(SocError::InvalidSignature);
        }
        Ok(Soc {
            id,
            owner,
            signature,
            inner,
        })
    }

    /// Sign the inner chunk with `signer`, taking its address as owner.
    pub fn sign(id: [u8; ID_SIZE], inner: Cac, signer: &dyn Signer) -> Result<Self, SocError> {
        let digest = to_sign_digest(&id, &inner.address());
        let signature = signer.sign(digest)?;
        Ok(Soc {
            id,
            owner: signer.address(),
            signature,
            inner,
        })
    }

    /// Parse and verify a single-owner chunk from its addressed form.
    pub fn from_chunk(chunk: &Chunk) -> Result<Self, SocError> {
        let data = chunk.data();
        if data.len() < MIN_CHUNK_SIZE {
            return Err(SocError::DataTooSmall(data.len()));
        }
        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&data[..ID_SIZE]);
        let signature = crypto::signature_from_bytes(&data[ID_SIZE..ID_SIZE + SIGNATURE_SIZE])?;
        let inner = Cac::new_with_data_span(data.slice(ID_SIZE + SIGNATURE_SIZE..))?;

        let digest = to_sign_digest(&id, &inner.address());
        let owner = crypto::recover_address(digest, &signature)?;
        if create_address(&id, &owner) != *chunk.address() {
            return Err(SocError::AddressMismatch);
        }
        Ok(Soc {
            id,
            owner,
            signature,
            inner,
        })
    }

    pub fn id(&self) -> &[u8; ID_SIZE] {
        &self.id
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn wrapped(&self) -> &Cac {
        &self.inner
    }

    pub fn address(&self) -> ChunkAddress {
        create_address(&self.id, &self.owner)
    }

    /// The addressed chunk form: id ‖ signature ‖ inner data.
    pub fn chunk(&self) -> Chunk {
        let inner_data = self.inner.data();
        let mut data = Vec::with_capacity(ID_SIZE + SIGNATURE_SIZE + inner_data.len());
        data.extend_from_slice(&self.id);
        data.extend_from_slice(&self.signature.as_bytes());
        data.extend_from_slice(inner_data);
        Chunk::new(self.address(), data)
    }
}

/// The chunk address of a single-owner chunk: keccak256(id ‖ owner).
pub fn create_address(id: &[u8; ID_SIZE], owner: &Address) -> ChunkAddress {
    let mut hasher = Keccak256::new();
    hasher.update(id);
    hasher.update(owner.as_slice());
    hasher.finalize().into()
}

/// The digest an owner signs: keccak256(id ‖ inner chunk address).
pub fn to_sign_digest(id: &[u8; ID_SIZE], inner: &ChunkAddress) -> alloy::primitives::B256 {
    let mut hasher = Keccak256::new();
    hasher.update(id);
    hasher.update(inner.as_slice());
    hasher.finalize()
}

/// A chunk is a valid single-owner chunk iff it parses, its signature
/// recovers to the owner and the address binds id and owner.
pub fn valid(chunk: &Chunk) -> bool {
    Soc::from_chunk(chunk).is_ok()
}
