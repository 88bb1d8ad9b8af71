// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live broker state read by the snapshot builders.
//!
//! [`Server`] keeps the connection registry (clients, routes, gateway links)
//! behind a single `RwLock`, with every connection carrying its own mutex for
//! counters and subscriptions. Lock order is always registry, then
//! connection, then closed ring or gateway account table.
//!
//! The mutation entry points model what a broker does on accept, CONNECT,
//! SUB/UNSUB, PUB, PING/PONG, TLS completion and close. They update the state
//! the reports observe; they do not route messages across servers.

pub mod client;
pub mod gateway;
pub mod route;
mod stats;

pub use client::{Client, ClosedState, ConnectInfo, Subscription};
pub use gateway::{GatewayLink, GatewaySpec, InterestMode};
pub use route::{Route, RouteSpec};
pub(crate) use stats::{ServerStats, SubStats};

use crate::closed::ClosedRing;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::snapshot::{recover_read, recover_write, snapshot_with_epoch};
use crate::subject::{is_valid_subject, matches_literal, validate_literal_subject};
use chrono::{DateTime, Utc};
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

const SERVER_ID_LEN: usize = 56;

/// Connection registry.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) clients: BTreeMap<u64, Arc<Client>>,
    pub(crate) routes: BTreeMap<u64, Arc<Route>>,
    /// One outbound link per remote cluster.
    pub(crate) outbound_gateways: BTreeMap<String, Arc<GatewayLink>>,
    /// Any number of inbound links per remote cluster.
    pub(crate) inbound_gateways: BTreeMap<String, Vec<Arc<GatewayLink>>>,
}

impl Registry {
    pub(crate) fn gateway_links(&self) -> impl Iterator<Item = &Arc<GatewayLink>> {
        self.outbound_gateways
            .values()
            .chain(self.inbound_gateways.values().flatten())
    }

    fn gateway_link(&self, cid: u64) -> Option<&Arc<GatewayLink>> {
        self.gateway_links().find(|link| link.cid() == cid)
    }

    /// Any connection with this id, whatever its kind.
    fn find(&self, cid: u64) -> Option<&Arc<Client>> {
        self.clients
            .get(&cid)
            .or_else(|| self.routes.get(&cid).map(|r| &r.client))
            .or_else(|| self.gateway_link(cid).map(|l| &l.client))
    }

    /// Clients and routes, the connections that hold subscriptions.
    pub(crate) fn subscribers(&self) -> impl Iterator<Item = &Arc<Client>> {
        self.clients
            .values()
            .chain(self.routes.values().map(|r| &r.client))
    }
}

/// Broker state owner.
#[derive(Debug)]
pub struct Server {
    id: String,
    config: MonitorConfig,
    start: DateTime<Utc>,
    epoch: AtomicU64,
    next_cid: AtomicU64,
    registry: RwLock<Registry>,
    closed: ClosedRing,
    pub(crate) stats: ServerStats,
    pub(crate) sub_stats: SubStats,
}

impl Server {
    /// Create a server with a freshly generated id.
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_id(config, generate_server_id())
    }

    pub fn with_id(config: MonitorConfig, id: impl Into<String>) -> Self {
        let closed = ClosedRing::new(config.max_closed_connections);
        Self {
            id: id.into(),
            config,
            start: Utc::now(),
            epoch: AtomicU64::new(0),
            next_cid: AtomicU64::new(1),
            registry: RwLock::new(Registry::default()),
            closed,
            stats: ServerStats::default(),
            sub_stats: SubStats::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Configured server name, falling back to the id.
    pub fn name(&self) -> &str {
        if self.config.server_name.is_empty() {
            &self.id
        } else {
            &self.config.server_name
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start
    }

    /// Registry generation, bumped by every structural mutation.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn num_clients(&self) -> usize {
        recover_read(&self.registry, "registry num_clients").clients.len()
    }

    pub fn num_routes(&self) -> usize {
        recover_read(&self.registry, "registry num_routes").routes.len()
    }

    pub(crate) fn closed(&self) -> &ClosedRing {
        &self.closed
    }

    /// Run `extractor` under the registry read lock with epoch retry.
    pub(crate) fn snapshot<R, F>(&self, extractor: F) -> R
    where
        F: Fn(&Registry) -> R,
    {
        snapshot_with_epoch(&self.epoch, &self.registry, extractor)
    }

    fn bump(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn next_cid(&self) -> u64 {
        self.next_cid.fetch_add(1, Ordering::SeqCst)
    }

    fn lookup(&self, cid: u64) -> Result<Arc<Client>> {
        recover_read(&self.registry, "registry lookup")
            .find(cid)
            .cloned()
            .ok_or_else(|| MonitorError::NotFound(format!("connection {}", cid)))
    }

    /// Register a client accepted from `addr` and return its connection id.
    ///
    /// Past `max_connections` the client is closed straight away with
    /// [`ClosedState::MaxConnectionsExceeded`] and only shows up as closed.
    pub fn accept_client(&self, addr: SocketAddr) -> u64 {
        let cid = self.next_cid();
        let now = Utc::now();
        let client = Arc::new(Client::new(cid, addr.ip().to_string(), addr.port(), now));
        self.stats.total_connections.fetch_add(1, Ordering::Relaxed);

        let mut reg = recover_write(&self.registry, "registry accept");
        if reg.clients.len() >= self.config.max_connections {
            let info = client.lock().conn_info(
                cid,
                now,
                Some(ClosedState::MaxConnectionsExceeded),
                true,
                true,
            );
            self.closed.record(info);
            log::debug!("[monitor] rejected cid={} from {}: max connections", cid, addr);
        } else {
            reg.clients.insert(cid, client);
            log::trace!("[monitor] accepted cid={} from {}", cid, addr);
        }
        drop(reg);
        self.bump();
        cid
    }

    /// Apply the identity sent in CONNECT.
    pub fn set_connect_info(&self, cid: u64, info: ConnectInfo) -> Result<()> {
        let client = self.lookup(cid)?;
        let mut st = client.lock();
        st.info = info;
        st.touch(Utc::now());
        Ok(())
    }

    pub fn complete_tls_handshake(&self, cid: u64, version: &str, cipher: &str) -> Result<()> {
        let client = self.lookup(cid)?;
        client.lock().tls = Some((version.to_string(), cipher.to_string()));
        Ok(())
    }

    /// Note that a server PING was sent.
    pub fn send_ping(&self, cid: u64) -> Result<()> {
        let client = self.lookup(cid)?;
        client.lock().ping_sent = Some(Instant::now());
        Ok(())
    }

    /// Handle the PONG answering [`Server::send_ping`] and return the RTT.
    pub fn receive_pong(&self, cid: u64) -> Result<Duration> {
        let client = self.lookup(cid)?;
        let mut st = client.lock();
        let sent = st
            .ping_sent
            .take()
            .ok_or_else(|| MonitorError::NotFound(format!("outstanding ping on {}", cid)))?;
        let rtt = sent.elapsed();
        st.rtt = Some(rtt);
        st.touch(Utc::now());
        Ok(rtt)
    }

    pub fn set_rtt(&self, cid: u64, rtt: Duration) -> Result<()> {
        let client = self.lookup(cid)?;
        client.lock().rtt = Some(rtt);
        Ok(())
    }

    pub fn set_pending_bytes(&self, cid: u64, bytes: u64) -> Result<()> {
        let client = self.lookup(cid)?;
        client.lock().pending_bytes = bytes;
        Ok(())
    }

    /// Add a subscription on any client or route. A repeated sid is ignored.
    pub fn subscribe(&self, cid: u64, subject: &str, queue: Option<&str>, sid: &str) -> Result<()> {
        if !is_valid_subject(subject) {
            return Err(MonitorError::invalid("subject", subject, "invalid subject"));
        }
        let client = self.lookup(cid)?;
        {
            let mut st = client.lock();
            if st.subs.iter().any(|s| s.sid == sid) {
                return Ok(());
            }
            st.subs.push(Subscription {
                subject: subject.to_string(),
                queue: queue.map(str::to_string),
                sid: sid.to_string(),
                delivered: 0,
                max: 0,
            });
            st.touch(Utc::now());
        }
        self.sub_stats.inserted();
        self.bump();
        Ok(())
    }

    /// Remove the subscription after `max` deliveries in total.
    pub fn auto_unsubscribe(&self, cid: u64, sid: &str, max: u64) -> Result<()> {
        let client = self.lookup(cid)?;
        let expired = {
            let mut st = client.lock();
            let sub = st
                .subs
                .iter_mut()
                .find(|s| s.sid == sid)
                .ok_or_else(|| MonitorError::NotFound(format!("subscription {}", sid)))?;
            sub.max = max;
            let expired = sub.exhausted();
            if expired {
                st.subs.retain(|s| s.sid != sid);
            }
            expired
        };
        if expired {
            self.sub_stats.removed(1);
            self.bump();
        }
        Ok(())
    }

    pub fn unsubscribe(&self, cid: u64, sid: &str) -> Result<()> {
        let client = self.lookup(cid)?;
        {
            let mut st = client.lock();
            let before = st.subs.len();
            st.subs.retain(|s| s.sid != sid);
            if st.subs.len() == before {
                return Err(MonitorError::NotFound(format!("subscription {}", sid)));
            }
            st.touch(Utc::now());
        }
        self.sub_stats.removed(1);
        self.bump();
        Ok(())
    }

    /// Publish `payload` on `subject` from connection `cid`.
    ///
    /// Every matching plain subscription of a local client gets a copy, each
    /// queue group gets one copy, and a route with matching interest gets one
    /// copy. Returns the number of copies delivered.
    pub fn publish(&self, cid: u64, subject: &str, payload: &[u8]) -> Result<u64> {
        validate_literal_subject(subject)
            .map_err(|_| MonitorError::invalid("subject", subject, "not a literal subject"))?;
        if payload.len() > self.config.max_payload {
            self.close_connection(cid, ClosedState::MaxPayloadExceeded)?;
            return Err(MonitorError::invalid(
                "payload",
                payload.len().to_string(),
                "exceeds maximum payload",
            ));
        }

        let size = payload.len() as u64;
        let now = Utc::now();
        let reg = recover_read(&self.registry, "registry publish");
        let publisher = reg
            .find(cid)
            .ok_or_else(|| MonitorError::NotFound(format!("connection {}", cid)))?;
        {
            let mut st = publisher.lock();
            st.in_msgs += 1;
            st.in_bytes += size;
            st.touch(now);
        }
        self.stats.record_inbound(size);

        let mut fanout = 0u64;
        let mut removed = 0u64;
        let mut groups: BTreeSet<(String, String)> = BTreeSet::new();
        for client in reg.clients.values() {
            let mut st = client.lock();
            let mut copies = 0u64;
            for sub in st.subs.iter_mut() {
                if !matches_literal(&sub.subject, subject) {
                    continue;
                }
                if let Some(queue) = &sub.queue {
                    if !groups.insert((sub.subject.clone(), queue.clone())) {
                        continue;
                    }
                }
                sub.delivered += 1;
                copies += 1;
            }
            if copies > 0 {
                st.out_msgs += copies;
                st.out_bytes += copies * size;
                let before = st.subs.len();
                st.subs.retain(|s| !s.exhausted());
                removed += (before - st.subs.len()) as u64;
                fanout += copies;
            }
        }
        for route in reg.routes.values() {
            let mut st = route.client.lock();
            if st.subs.iter().any(|s| matches_literal(&s.subject, subject)) {
                st.out_msgs += 1;
                st.out_bytes += size;
                fanout += 1;
            }
        }
        drop(reg);

        self.stats.record_outbound(fanout, fanout * size);
        self.sub_stats.matched(fanout);
        if removed > 0 {
            self.sub_stats.removed(removed);
            self.bump();
        }
        Ok(fanout)
    }

    /// Close any connection. Clients are kept in the closed ring.
    pub fn close_connection(&self, cid: u64, reason: ClosedState) -> Result<()> {
        let now = Utc::now();
        let mut reg = recover_write(&self.registry, "registry close");

        let (client, is_client) = if let Some(client) = reg.clients.remove(&cid) {
            (client, true)
        } else if let Some(route) = reg.routes.remove(&cid) {
            (Arc::clone(&route.client), false)
        } else if let Some(link) = remove_gateway_link(&mut reg, cid) {
            (Arc::clone(&link.client), false)
        } else {
            return Err(MonitorError::NotFound(format!("connection {}", cid)));
        };

        {
            let mut st = client.lock();
            if is_client {
                // Recorded under the registry write lock.
                self.closed
                    .record(st.conn_info(cid, now, Some(reason), true, true));
            }
            self.sub_stats.removed(st.subs.len() as u64);
            st.subs.clear();
        }
        drop(reg);

        if reason.is_slow_consumer() {
            self.stats.slow_consumers.fetch_add(1, Ordering::Relaxed);
        }
        self.bump();
        log::debug!("[monitor] closed cid={} reason={}", cid, reason);
        Ok(())
    }

    /// Close every client with [`ClosedState::ServerShutdown`].
    pub fn shutdown(&self) {
        let cids: Vec<u64> = recover_read(&self.registry, "registry shutdown")
            .clients
            .keys()
            .copied()
            .collect();
        for cid in cids {
            // Already closed concurrently: nothing to record.
            let _ = self.close_connection(cid, ClosedState::ServerShutdown);
        }
    }

    /// Register a route link and return its route id.
    pub fn add_route(&self, spec: RouteSpec) -> u64 {
        let rid = self.next_cid();
        let client = Arc::new(Client::new(rid, spec.ip.clone(), spec.port, Utc::now()));
        client.lock().info.name.clone_from(&spec.remote_id);
        let route = Arc::new(Route::new(client, spec));
        recover_write(&self.registry, "registry add_route")
            .routes
            .insert(rid, route);
        self.bump();
        rid
    }

    /// Register the outbound link to a remote cluster, replacing any previous one.
    pub fn connect_outbound_gateway(&self, spec: GatewaySpec) -> u64 {
        let (cid, link) = self.new_gateway_link(&spec, true);
        let replaced = recover_write(&self.registry, "registry outbound gateway")
            .outbound_gateways
            .insert(spec.name.clone(), link);
        if let Some(old) = replaced {
            log::debug!(
                "[monitor] outbound gateway {:?} replaced cid={}",
                spec.name,
                old.cid()
            );
        }
        self.bump();
        cid
    }

    /// Register an inbound link from a remote cluster.
    pub fn accept_inbound_gateway(&self, spec: GatewaySpec) -> u64 {
        let (cid, link) = self.new_gateway_link(&spec, false);
        recover_write(&self.registry, "registry inbound gateway")
            .inbound_gateways
            .entry(spec.name.clone())
            .or_default()
            .push(link);
        self.bump();
        cid
    }

    fn new_gateway_link(&self, spec: &GatewaySpec, outbound: bool) -> (u64, Arc<GatewayLink>) {
        let cid = self.next_cid();
        let client = Arc::new(Client::new(cid, spec.ip.clone(), spec.port, Utc::now()));
        client.lock().info.name.clone_from(&spec.remote_id);
        (cid, Arc::new(GatewayLink::new(client, spec, outbound)))
    }

    /// Run `f` on the interest state of `account` on gateway link `cid`.
    fn with_gateway_account<R>(
        &self,
        cid: u64,
        account: &str,
        f: impl FnOnce(&mut gateway::AccountInterest) -> R,
    ) -> Result<R> {
        let reg = recover_read(&self.registry, "registry gateway account");
        let link = reg
            .gateway_link(cid)
            .ok_or_else(|| MonitorError::NotFound(format!("gateway connection {}", cid)))?;
        let mut accounts = link.accounts();
        Ok(f(accounts.entry(account.to_string()).or_default()))
    }

    /// The remote has no interest at all in `account`.
    pub fn gateway_account_no_interest(&self, cid: u64, account: &str) -> Result<()> {
        self.with_gateway_account(cid, account, |_| ())
    }

    /// The remote has no interest in `subject` on `account`.
    ///
    /// Returns true when this switched the account to interest-only.
    pub fn gateway_subject_no_interest(&self, cid: u64, account: &str, subject: &str) -> Result<bool> {
        let threshold = self.config.gateway.interest_only_threshold;
        let switched =
            self.with_gateway_account(cid, account, |acc| acc.add_no_interest(subject, threshold))?;
        if switched {
            log::debug!(
                "[monitor] gateway cid={} account {:?} switched to interest-only",
                cid,
                account
            );
        }
        Ok(switched)
    }

    pub fn gateway_interest_only(&self, cid: u64, account: &str) -> Result<()> {
        self.with_gateway_account(cid, account, |acc| acc.switch_to_interest_only())
    }

    pub fn gateway_register_interest(
        &self,
        cid: u64,
        account: &str,
        subject: &str,
        queue: Option<&str>,
    ) -> Result<()> {
        self.with_gateway_account(cid, account, |acc| acc.register(subject, queue))
    }

    pub fn gateway_unregister_interest(
        &self,
        cid: u64,
        account: &str,
        subject: &str,
        queue: Option<&str>,
    ) -> Result<()> {
        self.with_gateway_account(cid, account, |acc| acc.unregister(subject, queue))
    }
}

fn remove_gateway_link(reg: &mut Registry, cid: u64) -> Option<Arc<GatewayLink>> {
    let outbound = reg
        .outbound_gateways
        .iter()
        .find(|(_, link)| link.cid() == cid)
        .map(|(name, _)| name.clone());
    if let Some(name) = outbound {
        return reg.outbound_gateways.remove(&name);
    }
    let mut found = None;
    reg.inbound_gateways.retain(|_, links| {
        if let Some(pos) = links.iter().position(|l| l.cid() == cid) {
            found = Some(links.remove(pos));
        }
        !links.is_empty()
    });
    found
}

fn generate_server_id() -> String {
    let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let state = RandomState::new();
    let mut id = String::with_capacity(SERVER_ID_LEN + 16);
    id.push('N');
    let mut round = 0u64;
    while id.len() < SERVER_ID_LEN {
        let mut hasher = state.build_hasher();
        hasher.write_i64(seed);
        hasher.write_u64(round);
        id.push_str(&format!("{:016X}", hasher.finish()));
        round += 1;
    }
    id.truncate(SERVER_ID_LEN);
    id
}
