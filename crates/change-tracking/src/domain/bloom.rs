//! Fixed-size bit filter with an explicit "all set" mode
//!
//! Each tracked database owns one of these. A set bit means "the storage file
//! hashing here was possibly modified since the last read".
//!
//! INVARIANTS:
//! - The byte capacity is fixed at construction and never changes.
//! - While `set_all` is raised every membership query answers true.
//! - A bit, once set, stays set until `clear` (no false negatives).

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::hash_functions::relfilenode_hash;
use shared_types::Oid;

/// Probabilistic set of 64-bit hashes over a fixed byte array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    /// Bit array, `8 * size_bytes` positions
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
    /// Treat every position as set regardless of `bits`
    set_all: bool,
}

/// Serde support for BitVec
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bits.as_raw_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        Ok(BitVec::<u8, Lsb0>::from_vec(bytes))
    }
}

impl BloomFilter {
    /// Create an empty filter of `size_bytes` bytes.
    ///
    /// A zero size is bumped to one byte so the modulus is always defined.
    pub fn new(size_bytes: usize) -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; size_bytes.max(1) * 8],
            set_all: false,
        }
    }

    /// Capacity in bytes.
    pub fn size_bytes(&self) -> usize {
        self.bits.as_raw_slice().len()
    }

    /// Capacity in bits.
    pub fn size_bits(&self) -> usize {
        self.bits.len()
    }

    /// Bit position for a 64-bit hash: `hash mod (8 * size_bytes)`.
    #[inline]
    pub fn bit_index(&self, hash: u64) -> usize {
        (hash % self.bits.len() as u64) as usize
    }

    /// Membership test for a raw hash value.
    pub fn is_set(&self, hash: u64) -> bool {
        self.set_all || self.bits[self.bit_index(hash)]
    }

    /// Set the bit for a raw hash value. Idempotent.
    pub fn set(&mut self, hash: u64) {
        let idx = self.bit_index(hash);
        self.bits.set(idx, true);
    }

    /// Membership test for a storage file number.
    pub fn contains_relfilenode(&self, relfilenode: Oid) -> bool {
        self.is_set(relfilenode_hash(relfilenode))
    }

    /// Record a storage file number as modified.
    pub fn insert_relfilenode(&mut self, relfilenode: Oid) {
        self.set(relfilenode_hash(relfilenode));
    }

    /// Fill every byte with ones and raise the all-set flag.
    pub fn set_all(&mut self) {
        self.bits.as_raw_mut_slice().fill(0xFF);
        self.set_all = true;
    }

    /// Zero every byte and lower the all-set flag.
    pub fn clear(&mut self) {
        self.bits.as_raw_mut_slice().fill(0);
        self.set_all = false;
    }

    /// OR `other` into this filter; the all-set flag is OR'd too.
    ///
    /// # Panics
    /// Panics if the filters differ in capacity.
    pub fn merge(&mut self, other: &BloomFilter) {
        assert_eq!(
            self.bits.len(),
            other.bits.len(),
            "Cannot merge filters with different sizes"
        );

        let self_raw = self.bits.as_raw_mut_slice();
        let other_raw = other.bits.as_raw_slice();
        for (s, o) in self_raw.iter_mut().zip(other_raw.iter()) {
            *s |= *o;
        }
        self.set_all |= other.set_all;
    }

    /// Overwrite this filter with a deep copy of `src`, flag included.
    ///
    /// # Panics
    /// Panics if the filters differ in capacity.
    pub fn copy_from(&mut self, src: &BloomFilter) {
        assert_eq!(
            self.bits.len(),
            src.bits.len(),
            "Cannot copy filters with different sizes"
        );
        self.bits
            .as_raw_mut_slice()
            .copy_from_slice(src.bits.as_raw_slice());
        self.set_all = src.set_all;
    }

    /// Whether the filter is in all-set (full snapshot) mode.
    pub fn is_set_all(&self) -> bool {
        self.set_all
    }

    /// True when no bit is set and the flag is lowered.
    pub fn is_empty(&self) -> bool {
        !self.set_all && self.bits.not_any()
    }

    /// Number of set bits.
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }
}
