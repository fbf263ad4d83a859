//! Chunk value type and the combined validity predicate.

use bytes::Bytes;

use crate::address::ChunkAddress;
use crate::{cac, soc};

/// An addressed chunk: 32-byte address plus raw data. The data layout is
/// defined by the chunk kind (content-addressed or single-owner).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Chunk {
    address: ChunkAddress,
    data: Bytes,
}

impl Chunk {
    pub fn new(address: ChunkAddress, data: impl Into<Bytes>) -> Self {
        Chunk {
            address,
            data: data.into(),
        }
    }

    pub fn address(&self) -> &ChunkAddress {
        &self.address
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// A chunk is valid iff it is a valid content-addressed chunk or a valid
/// single-owner chunk.
pub fn valid(chunk: &Chunk) -> bool {
    cac::valid(chunk) || soc::valid(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::WalletSigner;
    use crate::soc::Soc;

    #[test]
    fn test_valid_cac_chunk() {
        let c = cac::Cac::new(b"some payload").expect("cac");
        assert!(valid(&c.chunk()));
    }

    #[test]
    fn test_valid_soc_chunk() {
        let inner = cac::Cac::new(b"wrapped").expect("cac");
        let signer = WalletSigner::random();
        let s = Soc::sign([0x31; 32], inner, &signer).expect("soc");
        assert!(valid(&s.chunk()));
    }

    #[test]
    fn test_garbage_chunk_invalid() {
        let c = Chunk::new(ChunkAddress::new([0xee; 32]), vec![0u8; 64]);
        assert!(!valid(&c));
    }
}
