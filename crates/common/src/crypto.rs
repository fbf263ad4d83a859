//! Recoverable secp256k1 signatures over keccak digests.
//!
//! Owners are 20-byte Ethereum-style addresses recovered from 65-byte
//! signatures. The `Signer` trait is the seam components take; the wallet
//! implementation wraps a local private key.

use alloy::primitives::{Address, Signature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use thiserror::Error;

/// Size of a recoverable signature in bytes.
pub const SIGNATURE_SIZE: usize = 65;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid signature length: expected {SIGNATURE_SIZE}, found {0}")]
    InvalidSignatureLength(usize),
    #[error("invalid signature encoding")]
    InvalidSignature,
    #[error("signature recovery failed")]
    Recovery,
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Signs 32-byte digests with a recoverable signature.
pub trait Signer: Send + Sync {
    fn sign(&self, digest: B256) -> Result<Signature, CryptoError>;

    /// The address signatures from this signer recover to.
    fn address(&self) -> Address;
}

/// A `Signer` backed by an in-process secp256k1 private key.
pub struct WalletSigner {
    inner: PrivateKeySigner,
}

impl WalletSigner {
    pub fn new(inner: PrivateKeySigner) -> Self {
        WalletSigner { inner }
    }

    /// Fresh random key. Used by tests and local setups.
    pub fn random() -> Self {
        WalletSigner {
            inner: PrivateKeySigner::random(),
        }
    }
}

impl Signer for WalletSigner {
    fn sign(&self, digest: B256) -> Result<Signature, CryptoError> {
        self.inner
            .sign_hash_sync(&digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }

    fn address(&self) -> Address {
        self.inner.address()
    }
}

/// Recover the signing address from a signature over `digest`.
pub fn recover_address(digest: B256, signature: &Signature) -> Result<Address, CryptoError> {
    signature
        .recover_address_from_prehash(&digest)
        .map_err(|_| CryptoError::Recovery)
}

/// Parse a 65-byte recoverable signature.
pub fn signature_from_bytes(raw: &[u8]) -> Result<Signature, CryptoError> {
    if raw.len() != SIGNATURE_SIZE {
        return Err(CryptoError::InvalidSignatureLength(raw.len()));
    }
    Signature::from_raw(raw).map_err(|_| CryptoError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_sign_recover_roundtrip() {
        let signer = WalletSigner::random();
        let digest = keccak256(b"digest under test");
        let sig = signer.sign(digest).expect("sign");
        let recovered = recover_address(digest, &sig).expect("recover");
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_recover_mismatch_on_other_digest() {
        let signer = WalletSigner::random();
        let sig = signer.sign(keccak256(b"one")).expect("sign");
        let recovered = recover_address(keccak256(b"two"), &sig);
        // recovery either fails or yields a different address
        match recovered {
            Ok(addr) => assert_ne!(addr, signer.address()),
            Err(CryptoError::Recovery) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_signature_wire_roundtrip() {
        let signer = WalletSigner::random();
        let digest = keccak256(b"wire");
        let sig = signer.sign(digest).expect("sign");
        let raw = sig.as_bytes();
        assert_eq!(raw.len(), SIGNATURE_SIZE);
        let parsed = signature_from_bytes(&raw).expect("parse");
        assert_eq!(parsed, sig);
    }

    #[test]
    fn test_signature_length_check() {
        match signature_from_bytes(&[0u8; 64]) {
            Err(CryptoError::InvalidSignatureLength(64)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }
}
