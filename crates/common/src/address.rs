//! 32-byte chunk addresses.
//! Addresses compare lexicographically as byte strings; equality of chunks
//! is equality of addresses.

use std::fmt;

use alloy::primitives::B256;

/// Size of a chunk address in bytes.
pub const ADDRESS_SIZE: usize = 32;

/// A 32-byte chunk address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkAddress(B256);

impl ChunkAddress {
    /// The all-zero address.
    pub const ZERO: ChunkAddress = ChunkAddress(B256::ZERO);

    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        ChunkAddress(B256::new(bytes))
    }

    /// Parse an address from a byte slice. Returns `None` unless the slice
    /// is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ADDRESS_SIZE {
            return None;
        }
        Some(ChunkAddress(B256::from_slice(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0 .0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Number of leading bits on which `self` and `other` agree, capped at
    /// 255. Used to check whether an address falls inside a neighbourhood.
    pub fn proximity(&self, other: &ChunkAddress) -> u8 {
        for (i, (a, b)) in self.as_bytes().iter().zip(other.as_bytes()).enumerate() {
            let diff = a ^ b;
            if diff != 0 {
                return (i * 8) as u8 + diff.leading_zeros() as u8;
            }
        }
        u8::MAX
    }

    /// The lower boundary of the neighbourhood `radius` bits deep around
    /// this address: the leading `radius` bits are kept, every following
    /// bit is zeroed. Reserve iteration starts from this address.
    pub fn neighbourhood(&self, radius: u8) -> ChunkAddress {
        let mut out = [0u8; ADDRESS_SIZE];
        let full_bytes = (radius as usize) / 8;
        let rest_bits = (radius as usize) % 8;
        out[..full_bytes].copy_from_slice(&self.as_bytes()[..full_bytes]);
        if rest_bits > 0 && full_bytes < ADDRESS_SIZE {
            let mask = 0xffu8 << (8 - rest_bits);
            out[full_bytes] = self.as_bytes()[full_bytes] & mask;
        }
        ChunkAddress::new(out)
    }
}

impl From<B256> for ChunkAddress {
    fn from(value: B256) -> Self {
        ChunkAddress(value)
    }
}

impl From<[u8; ADDRESS_SIZE]> for ChunkAddress {
    fn from(value: [u8; ADDRESS_SIZE]) -> Self {
        ChunkAddress::new(value)
    }
}

impl fmt::Display for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = hex::encode(self.as_bytes());
        write!(f, "ChunkAddress({})", h.get(0..12).unwrap_or(&h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        a[0] = 0x01;
        b[0] = 0x02;
        assert!(ChunkAddress::new(a) < ChunkAddress::new(b));

        a[0] = 0x02;
        a[31] = 0x01;
        assert!(ChunkAddress::new(b) < ChunkAddress::new(a));
    }

    #[test]
    fn test_proximity() {
        let a = ChunkAddress::new([0x00; 32]);
        let b = ChunkAddress::new([0x00; 32]);
        assert_eq!(a.proximity(&b), u8::MAX);

        let mut c = [0x00u8; 32];
        c[0] = 0x80; // differs in the very first bit
        assert_eq!(a.proximity(&ChunkAddress::new(c)), 0);

        let mut d = [0x00u8; 32];
        d[1] = 0x10; // first 11 bits agree
        assert_eq!(a.proximity(&ChunkAddress::new(d)), 11);

        // symmetric
        assert_eq!(
            ChunkAddress::new(c).proximity(&a),
            a.proximity(&ChunkAddress::new(c))
        );
    }

    #[test]
    fn test_neighbourhood_boundary() {
        let overlay = ChunkAddress::new([0xffu8; 32]);

        assert_eq!(overlay.neighbourhood(0), ChunkAddress::ZERO);

        let mut expected = [0u8; 32];
        expected[0] = 0xe0; // top 3 bits kept
        assert_eq!(overlay.neighbourhood(3), ChunkAddress::new(expected));

        let mut expected = [0u8; 32];
        expected[0] = 0xff;
        expected[1] = 0x80; // 9 bits
        assert_eq!(overlay.neighbourhood(9), ChunkAddress::new(expected));

        // every member of the neighbourhood sorts at or after the boundary
        let boundary = overlay.neighbourhood(9);
        assert!(boundary <= overlay);
        assert!(overlay.proximity(&boundary) >= 9);
    }

    #[test]
    fn test_from_slice() {
        assert!(ChunkAddress::from_slice(&[0u8; 31]).is_none());
        assert!(ChunkAddress::from_slice(&[0u8; 33]).is_none());
        let a = ChunkAddress::from_slice(&[7u8; 32]).expect("32 bytes");
        assert_eq!(a, ChunkAddress::new([7u8; 32]));
    }
}
