//! # Hive Common Crate
//!
//! Value types shared across the hive reserve: chunk addresses, the binary
//! Merkle tree hash, content-addressed and single-owner chunks, postage
//! stamps and the signing seam.
//!
//! ## Modules
//! - `address`: 32-byte chunk addresses, proximity, radius boundaries
//! - `bmt`: binary Merkle tree hasher (plain and anchor-keyed)
//! - `cac`: content-addressed chunks
//! - `soc`: single-owner chunks
//! - `chunk`: chunk value type and combined validity predicate
//! - `crypto`: keccak digests, recoverable signatures, `Signer`
//! - `postage`: stamps, batches, bucket arithmetic

pub mod address;
pub mod bmt;
pub mod cac;
pub mod chunk;
pub mod crypto;
pub mod postage;
pub mod soc;

pub use address::ChunkAddress;
pub use chunk::Chunk;
pub use crypto::{Signer, WalletSigner};
pub use postage::{Batch, BatchId, Stamp};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
