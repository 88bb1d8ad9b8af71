// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inter-cluster gateway links and their per-account interest state.
//!
//! In `Optimistic` mode a link forwards everything except subjects the
//! remote said it has no interest in. Once that no-interest set grows past
//! the configured threshold (or the remote asks for it) the account flips to
//! `InterestOnly`: the no-interest set is dropped and only subjects with
//! registered remote interest are forwarded. Queue interest is always
//! registered, whatever the mode.

use super::client::Client;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Per-account forwarding mode of a gateway link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterestMode {
    #[default]
    Optimistic,
    #[serde(rename = "Interest-Only")]
    InterestOnly,
}

impl InterestMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            InterestMode::Optimistic => "Optimistic",
            InterestMode::InterestOnly => "Interest-Only",
        }
    }
}

impl fmt::Display for InterestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub(crate) struct AccountInterest {
    pub(crate) mode: InterestMode,
    pub(crate) no_interest: BTreeSet<String>,
    subjects: BTreeMap<String, u32>,
    queues: BTreeMap<(String, String), u32>,
}

impl AccountInterest {
    /// Record that the remote has no interest in `subject`.
    ///
    /// Returns true when this pushed the account over `threshold` and
    /// switched it to interest-only.
    pub(crate) fn add_no_interest(&mut self, subject: &str, threshold: usize) -> bool {
        if self.mode == InterestMode::InterestOnly {
            return false;
        }
        self.no_interest.insert(subject.to_string());
        if threshold > 0 && self.no_interest.len() >= threshold {
            self.switch_to_interest_only();
            return true;
        }
        false
    }

    pub(crate) fn switch_to_interest_only(&mut self) {
        self.mode = InterestMode::InterestOnly;
        self.no_interest.clear();
    }

    pub(crate) fn register(&mut self, subject: &str, queue: Option<&str>) {
        match queue {
            Some(q) => *self.queues.entry((subject.to_string(), q.to_string())).or_default() += 1,
            None => {
                self.no_interest.remove(subject);
                if self.mode == InterestMode::InterestOnly {
                    *self.subjects.entry(subject.to_string()).or_default() += 1;
                }
            }
        }
    }

    pub(crate) fn unregister(&mut self, subject: &str, queue: Option<&str>) {
        match queue {
            Some(q) => release(&mut self.queues, (subject.to_string(), q.to_string())),
            None => release(&mut self.subjects, subject.to_string()),
        }
    }

    /// Distinct registered subjects, queue groups included.
    pub(crate) fn num_subs(&self) -> usize {
        self.subjects.len() + self.queues.len()
    }

    pub(crate) fn num_queue_subs(&self) -> usize {
        self.queues.len()
    }
}

fn release<K: Ord>(map: &mut BTreeMap<K, u32>, key: K) {
    if let Some(count) = map.get_mut(&key) {
        *count -= 1;
        if *count == 0 {
            map.remove(&key);
        }
    }
}

/// Parameters of a newly established gateway link.
#[derive(Debug, Clone, Default)]
pub struct GatewaySpec {
    /// Name of the remote cluster.
    pub name: String,
    /// Server id of the remote end, reported as the connection name.
    pub remote_id: String,
    pub ip: String,
    pub port: u16,
    /// Outbound only: the remote comes from configuration, not discovery.
    pub configured: bool,
}

#[derive(Debug)]
pub struct GatewayLink {
    pub(crate) client: Arc<Client>,
    pub(crate) name: String,
    pub(crate) outbound: bool,
    pub(crate) configured: bool,
    accounts: Mutex<BTreeMap<String, AccountInterest>>,
}

impl GatewayLink {
    pub(crate) fn new(client: Arc<Client>, spec: &GatewaySpec, outbound: bool) -> Self {
        Self {
            client,
            name: spec.name.clone(),
            outbound,
            configured: outbound && spec.configured,
            accounts: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn cid(&self) -> u64 {
        self.client.cid()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_outbound(&self) -> bool {
        self.outbound
    }

    /// Per-account interest, ordered by account name.
    pub(crate) fn accounts(&self) -> MutexGuard<'_, BTreeMap<String, AccountInterest>> {
        self.accounts.lock()
    }
}
