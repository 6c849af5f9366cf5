//! Drop ring: a bounded record of recently deleted storage files
//!
//! Nodes live in a fixed arena and are linked by index into a doubly linked
//! list, newest at the head and oldest at the tail. Free nodes sit on a stack
//! of indices. When the arena is full a new drop evicts the tail.
//!
//! One mutex guards the whole ring; drops are rare next to bit-sets.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shared_types::{Oid, INVALID_OID};

/// One remembered drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRecord {
    pub relfilenode: Oid,
    pub dbid: Oid,
}

#[derive(Debug, Clone, Copy)]
struct DropNode {
    relfilenode: Oid,
    dbid: Oid,
    prev: Option<u32>,
    next: Option<u32>,
}

impl DropNode {
    const FREE: DropNode = DropNode {
        relfilenode: INVALID_OID,
        dbid: INVALID_OID,
        prev: None,
        next: None,
    };
}

#[derive(Debug)]
struct DropsList {
    nodes: Vec<DropNode>,
    head: Option<u32>,
    tail: Option<u32>,
    used: usize,
    free: Vec<u32>,
}

impl DropsList {
    fn new(capacity: usize) -> Self {
        Self {
            nodes: vec![DropNode::FREE; capacity],
            head: None,
            tail: None,
            used: 0,
            free: (0..capacity as u32).rev().collect(),
        }
    }

    fn is_full(&self) -> bool {
        self.used == self.nodes.len()
    }

    fn push_head(&mut self, relfilenode: Oid, dbid: Oid) -> bool {
        let Some(idx) = self.free.pop() else {
            return false;
        };

        self.nodes[idx as usize] = DropNode {
            relfilenode,
            dbid,
            prev: None,
            next: self.head,
        };
        match self.head {
            Some(old) => self.nodes[old as usize].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.used += 1;
        true
    }

    fn unlink(&mut self, idx: u32) -> DropRecord {
        let node = self.nodes[idx as usize];
        match node.prev {
            Some(p) => self.nodes[p as usize].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n as usize].prev = node.prev,
            None => self.tail = node.prev,
        }
        self.nodes[idx as usize] = DropNode::FREE;
        self.free.push(idx);
        self.used -= 1;

        DropRecord {
            relfilenode: node.relfilenode,
            dbid: node.dbid,
        }
    }
}

/// Bounded, shared drop ring.
#[derive(Debug)]
pub struct DropsTrack {
    capacity: usize,
    list: Mutex<DropsList>,
}

impl DropsTrack {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            list: Mutex::new(DropsList::new(capacity)),
        }
    }

    /// Bytes needed for a ring of `capacity` nodes.
    pub fn required_size(capacity: usize) -> usize {
        std::mem::size_of::<Self>()
            + capacity * (std::mem::size_of::<DropNode>() + std::mem::size_of::<u32>())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.list.lock().used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a dropped file at the head of the ring.
    ///
    /// At capacity the oldest record is evicted first and returned.
    pub fn add(&self, relfilenode: Oid, dbid: Oid) -> Option<DropRecord> {
        if self.capacity == 0 {
            return None;
        }

        let mut list = self.list.lock();
        let evicted = if list.is_full() {
            let tail = list.tail?;
            let record = list.unlink(tail);
            debug!(
                dbid = record.dbid,
                relfilenode = record.relfilenode,
                "drop ring full, oldest record evicted"
            );
            Some(record)
        } else {
            None
        };

        list.push_head(relfilenode, dbid);
        evicted
    }

    /// Remove every record of `dbid` and return their file numbers,
    /// oldest first.
    pub fn drain(&self, dbid: Oid) -> Vec<Oid> {
        let mut list = self.list.lock();
        let mut drained = Vec::new();

        let mut cursor = list.tail;
        while let Some(idx) = cursor {
            let node = list.nodes[idx as usize];
            cursor = node.prev;
            if node.dbid == dbid {
                drained.push(list.unlink(idx).relfilenode);
            }
        }

        if !drained.is_empty() {
            debug!(dbid, count = drained.len(), "drops drained");
        }
        drained
    }

    /// Re-insert drained records at the head, in the given order.
    ///
    /// Records that do not fit are discarded. Returns how many were restored.
    pub fn undo(&self, relfilenodes: &[Oid], dbid: Oid) -> usize {
        let mut list = self.list.lock();
        let mut restored = 0;

        for &relfilenode in relfilenodes {
            if list.is_full() || !list.push_head(relfilenode, dbid) {
                debug!(dbid, relfilenode, "drop ring full, undo record discarded");
                continue;
            }
            restored += 1;
        }
        restored
    }

    /// Snapshot of every record, newest first.
    pub fn entries(&self) -> Vec<DropRecord> {
        let list = self.list.lock();
        let mut out = Vec::with_capacity(list.used);
        let mut cursor = list.head;
        while let Some(idx) = cursor {
            let node = list.nodes[idx as usize];
            out.push(DropRecord {
                relfilenode: node.relfilenode,
                dbid: node.dbid,
            });
            cursor = node.next;
        }
        out
    }
}
