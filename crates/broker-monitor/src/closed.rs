// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Closed-connection history.
//!
//! A fixed-capacity ring of detached [`ConnInfo`] records. Slots are
//! allocated once; recording into a full ring overwrites the oldest entry.

use crate::monitor::ConnInfo;
use parking_lot::Mutex;

/// Ring buffer of recently closed connections.
#[derive(Debug)]
pub struct ClosedRing {
    inner: Mutex<Ring>,
}

#[derive(Debug)]
struct Ring {
    slots: Vec<Option<ConnInfo>>,
    /// Next slot to write.
    next: usize,
    len: usize,
}

impl ClosedRing {
    /// Create a ring retaining at most `capacity` records (0 keeps none).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Ring {
                slots: vec![None; capacity],
                next: 0,
                len: 0,
            }),
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn record(&self, info: ConnInfo) {
        let mut ring = self.inner.lock();
        let capacity = ring.slots.len();
        if capacity == 0 {
            return;
        }
        let slot = ring.next;
        if let Some(evicted) = ring.slots[slot].replace(info) {
            log::trace!("[monitor] closed ring evicted cid={}", evicted.cid);
        }
        ring.next = (slot + 1) % capacity;
        ring.len = (ring.len + 1).min(capacity);
    }

    /// Copy of every retained record, oldest first.
    pub fn all(&self) -> Vec<ConnInfo> {
        let ring = self.inner.lock();
        let capacity = ring.slots.len();
        let start = if ring.len < capacity { 0 } else { ring.next };
        (0..ring.len)
            .filter_map(|i| ring.slots[(start + i) % capacity].clone())
            .collect()
    }

    /// Record for `cid`, if it has not been evicted yet.
    pub fn find(&self, cid: u64) -> Option<ConnInfo> {
        let ring = self.inner.lock();
        ring.slots
            .iter()
            .flatten()
            .find(|info| info.cid == cid)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().slots.len()
    }
}
