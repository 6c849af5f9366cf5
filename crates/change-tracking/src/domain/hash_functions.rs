//! Hash function for storage file numbers
//!
//! The 4-byte little-endian file number is run through MurmurHash3 x64/128
//! (seed 0) and the two 64-bit halves are XOR-folded into one value.

use std::io::Cursor;

use shared_types::Oid;

/// Fold a 128-bit digest into 64 bits.
#[inline]
pub fn fold_128(digest: u128) -> u64 {
    (digest as u64) ^ ((digest >> 64) as u64)
}

/// 64-bit hash of a storage file number.
pub fn relfilenode_hash(relfilenode: Oid) -> u64 {
    let bytes = relfilenode.to_le_bytes();
    let mut cursor = Cursor::new(&bytes[..]);

    // Reading from an in-memory cursor cannot fail
    let digest = murmur3::murmur3_x64_128(&mut cursor, 0).unwrap_or(0);
    fold_128(digest)
}
