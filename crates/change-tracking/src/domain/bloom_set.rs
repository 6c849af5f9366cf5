//! Filter directory: a fixed array of (owner, filter) slots
//!
//! The slot count and the per-filter byte size are fixed when the set is
//! built. Owners are database ids; `INVALID_OID` marks a free slot.
//!
//! Locking: the owner table sits behind one directory `RwLock`; every slot's
//! filter has its own `RwLock`. Lock order is always directory then slot.
//! Payload operations look the owner up under the shared directory lock,
//! take the slot lock, and release the directory lock before touching bits,
//! so bit-sets on different databases never serialize behind each other.
//! Bind and unbind change the owner table and hold the directory lock
//! exclusively.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use super::bloom::BloomFilter;
use shared_types::{Oid, INVALID_OID};

/// Fixed-capacity directory of per-database filters.
#[derive(Debug)]
pub struct BloomSet {
    bloom_size: usize,
    owners: RwLock<Box<[Oid]>>,
    entries: Box<[RwLock<BloomFilter>]>,
}

fn find_slot(owners: &[Oid], owner: Oid) -> Option<usize> {
    if owner == INVALID_OID {
        return None;
    }
    owners.iter().position(|o| *o == owner)
}

impl BloomSet {
    /// Build `capacity` unbound slots, each holding a `bloom_size`-byte filter.
    pub fn new(capacity: usize, bloom_size: usize) -> Self {
        let owners = vec![INVALID_OID; capacity].into_boxed_slice();
        let entries = (0..capacity)
            .map(|_| RwLock::new(BloomFilter::new(bloom_size)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            bloom_size: bloom_size.max(1),
            owners: RwLock::new(owners),
            entries,
        }
    }

    /// Bytes needed for `capacity` slots of `bloom_size`-byte filters.
    pub fn required_size(capacity: usize, bloom_size: usize) -> usize {
        std::mem::size_of::<Self>()
            + capacity
                * (std::mem::size_of::<Oid>()
                    + std::mem::size_of::<RwLock<BloomFilter>>()
                    + bloom_size.max(1))
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Bytes per filter.
    pub fn bloom_size(&self) -> usize {
        self.bloom_size
    }

    fn slot_write(&self, owner: Oid) -> Option<RwLockWriteGuard<'_, BloomFilter>> {
        let owners = self.owners.read();
        let idx = find_slot(&owners, owner)?;
        let entry = self.entries[idx].write();
        drop(owners);
        Some(entry)
    }

    fn slot_read(&self, owner: Oid) -> Option<RwLockReadGuard<'_, BloomFilter>> {
        let owners = self.owners.read();
        let idx = find_slot(&owners, owner)?;
        let entry = self.entries[idx].read();
        drop(owners);
        Some(entry)
    }

    /// Bind `owner` to a free slot.
    ///
    /// Idempotent: an owner that already has a slot succeeds without taking a
    /// second one. Returns `false` when every slot belongs to someone else;
    /// no existing slot is touched in that case.
    pub fn bind(&self, owner: Oid) -> bool {
        if owner == INVALID_OID {
            return false;
        }

        if find_slot(&self.owners.read(), owner).is_some() {
            return true;
        }

        let mut owners = self.owners.write();
        // Re-check: another binder may have won the race
        if find_slot(&owners, owner).is_some() {
            return true;
        }

        match owners.iter().position(|o| *o == INVALID_OID) {
            Some(idx) => {
                let mut entry = self.entries[idx].write();
                entry.clear();
                owners[idx] = owner;
                debug!(dbid = owner, slot = idx, "bound filter slot");
                true
            }
            None => {
                warn!(
                    dbid = owner,
                    capacity = self.capacity(),
                    "no free filter slot"
                );
                false
            }
        }
    }

    /// Release `owner`'s slot, clearing its bits. No-op if not bound.
    pub fn unbind(&self, owner: Oid) {
        let mut owners = self.owners.write();
        if let Some(idx) = find_slot(&owners, owner) {
            let mut entry = self.entries[idx].write();
            entry.clear();
            owners[idx] = INVALID_OID;
            debug!(dbid = owner, slot = idx, "unbound filter slot");
        }
    }

    /// Put the owner's filter in all-set mode (`on`) or clear it.
    ///
    /// Returns `false` if the owner is not bound.
    pub fn trigger_full_snapshot(&self, owner: Oid, on: bool) -> bool {
        match self.slot_write(owner) {
            Some(mut entry) => {
                if on {
                    entry.set_all();
                } else {
                    entry.clear();
                }
                debug!(dbid = owner, on, "full snapshot trigger");
                true
            }
            None => false,
        }
    }

    /// Mark `relfilenode` as modified for `owner`.
    ///
    /// Returns `false` (and does nothing) if the owner is not bound.
    pub fn set_bit(&self, owner: Oid, relfilenode: Oid) -> bool {
        match self.slot_write(owner) {
            Some(mut entry) => {
                entry.insert_relfilenode(relfilenode);
                true
            }
            None => false,
        }
    }

    /// Destructive read: copy the owner's filter into `dest`, then clear it.
    ///
    /// The slot stays bound. Returns `false` if the owner is not bound, in
    /// which case `dest` is untouched.
    pub fn take(&self, owner: Oid, dest: &mut BloomFilter) -> bool {
        match self.slot_write(owner) {
            Some(mut entry) => {
                dest.copy_from(&entry);
                entry.clear();
                debug!(dbid = owner, all = dest.is_set_all(), "filter taken");
                true
            }
            None => false,
        }
    }

    /// OR `filter` back into the owner's slot. Returns `false` if unbound.
    pub fn merge_back(&self, owner: Oid, filter: &BloomFilter) -> bool {
        match self.slot_write(owner) {
            Some(mut entry) => {
                entry.merge(filter);
                debug!(dbid = owner, all = filter.is_set_all(), "filter merged back");
                true
            }
            None => false,
        }
    }

    /// Whether the owner's filter is in all-set mode. `None` if unbound.
    pub fn is_saturated(&self, owner: Oid) -> Option<bool> {
        self.slot_read(owner).map(|entry| entry.is_set_all())
    }

    /// Whether `owner` currently has a slot.
    pub fn is_bound(&self, owner: Oid) -> bool {
        find_slot(&self.owners.read(), owner).is_some()
    }

    /// Number of bound slots.
    pub fn count_bound(&self) -> usize {
        self.owners
            .read()
            .iter()
            .filter(|o| **o != INVALID_OID)
            .count()
    }

    /// Owners of every bound slot, in slot order.
    pub fn bound_owners(&self) -> Vec<Oid> {
        self.owners
            .read()
            .iter()
            .copied()
            .filter(|o| *o != INVALID_OID)
            .collect()
    }

    /// Fraction of slots currently bound.
    pub fn saturation(&self) -> f64 {
        if self.capacity() == 0 {
            return 0.0;
        }
        self.count_bound() as f64 / self.capacity() as f64
    }
}
