// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server-wide counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Message and connection totals reported by varz.
#[derive(Debug, Default)]
pub(crate) struct ServerStats {
    pub(crate) in_msgs: AtomicU64,
    pub(crate) out_msgs: AtomicU64,
    pub(crate) in_bytes: AtomicU64,
    pub(crate) out_bytes: AtomicU64,
    pub(crate) slow_consumers: AtomicU64,
    pub(crate) total_connections: AtomicU64,
}

impl ServerStats {
    pub(crate) fn record_inbound(&self, bytes: u64) {
        self.in_msgs.fetch_add(1, Ordering::Relaxed);
        self.in_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_outbound(&self, msgs: u64, bytes: u64) {
        self.out_msgs.fetch_add(msgs, Ordering::Relaxed);
        self.out_bytes.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Subscription table counters.
#[derive(Debug, Default)]
pub(crate) struct SubStats {
    count: AtomicU64,
    inserts: AtomicU64,
    removes: AtomicU64,
    matches: AtomicU64,
    max_fanout: AtomicU64,
    total_fanout: AtomicU64,
}

/// Point-in-time copy of [`SubStats`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct SubStatsView {
    pub(crate) count: u64,
    pub(crate) inserts: u64,
    pub(crate) removes: u64,
    pub(crate) matches: u64,
    pub(crate) max_fanout: u64,
    pub(crate) avg_fanout: f64,
}

impl SubStats {
    pub(crate) fn inserted(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn removed(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.count.fetch_sub(n, Ordering::Relaxed);
        self.removes.fetch_add(n, Ordering::Relaxed);
    }

    /// Account one publish that reached `fanout` subscriptions.
    pub(crate) fn matched(&self, fanout: u64) {
        self.matches.fetch_add(1, Ordering::Relaxed);
        self.total_fanout.fetch_add(fanout, Ordering::Relaxed);
        self.max_fanout.fetch_max(fanout, Ordering::Relaxed);
    }

    pub(crate) fn view(&self) -> SubStatsView {
        let matches = self.matches.load(Ordering::Relaxed);
        let total_fanout = self.total_fanout.load(Ordering::Relaxed);
        SubStatsView {
            count: self.count.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            matches,
            max_fanout: self.max_fanout.load(Ordering::Relaxed),
            avg_fanout: if matches == 0 {
                0.0
            } else {
                total_fanout as f64 / matches as f64
            },
        }
    }
}
