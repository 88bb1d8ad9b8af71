// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-connection state shared by clients, routes and gateway links.

use crate::monitor::ConnInfo;
use crate::time::{format_rtt, format_uptime, non_negative};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Why a connection was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosedState {
    ClientClosed,
    AuthenticationTimeout,
    AuthenticationViolation,
    TlsHandshakeError,
    SlowConsumerPendingBytes,
    SlowConsumerWriteDeadline,
    WriteError,
    ReadError,
    ParseError,
    StaleConnection,
    ProtocolViolation,
    BadClientProtocolVersion,
    WrongPort,
    MaxConnectionsExceeded,
    MaxPayloadExceeded,
    MaxControlLineExceeded,
    MaxSubscriptionsExceeded,
    DuplicateRoute,
    RouteRemoved,
    ServerShutdown,
}

impl ClosedState {
    pub const ALL: [ClosedState; 20] = [
        ClosedState::ClientClosed,
        ClosedState::AuthenticationTimeout,
        ClosedState::AuthenticationViolation,
        ClosedState::TlsHandshakeError,
        ClosedState::SlowConsumerPendingBytes,
        ClosedState::SlowConsumerWriteDeadline,
        ClosedState::WriteError,
        ClosedState::ReadError,
        ClosedState::ParseError,
        ClosedState::StaleConnection,
        ClosedState::ProtocolViolation,
        ClosedState::BadClientProtocolVersion,
        ClosedState::WrongPort,
        ClosedState::MaxConnectionsExceeded,
        ClosedState::MaxPayloadExceeded,
        ClosedState::MaxControlLineExceeded,
        ClosedState::MaxSubscriptionsExceeded,
        ClosedState::DuplicateRoute,
        ClosedState::RouteRemoved,
        ClosedState::ServerShutdown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ClosedState::ClientClosed => "Client Closed",
            ClosedState::AuthenticationTimeout => "Authentication Timeout",
            ClosedState::AuthenticationViolation => "Authentication Failure",
            ClosedState::TlsHandshakeError => "TLS Handshake Failure",
            ClosedState::SlowConsumerPendingBytes => "Slow Consumer (Pending Bytes)",
            ClosedState::SlowConsumerWriteDeadline => "Slow Consumer (Write Deadline)",
            ClosedState::WriteError => "Write Error",
            ClosedState::ReadError => "Read Error",
            ClosedState::ParseError => "Parse Error",
            ClosedState::StaleConnection => "Stale Connection",
            ClosedState::ProtocolViolation => "Protocol Violation",
            ClosedState::BadClientProtocolVersion => "Bad Client Protocol Version",
            ClosedState::WrongPort => "Incorrect Port",
            ClosedState::MaxConnectionsExceeded => "Maximum Connections Exceeded",
            ClosedState::MaxPayloadExceeded => "Maximum Message Payload Exceeded",
            ClosedState::MaxControlLineExceeded => "Maximum Control Line Exceeded",
            ClosedState::MaxSubscriptionsExceeded => "Maximum Subscriptions Exceeded",
            ClosedState::DuplicateRoute => "Duplicate Route",
            ClosedState::RouteRemoved => "Route Removed",
            ClosedState::ServerShutdown => "Server Shutdown",
        }
    }

    pub const fn is_slow_consumer(self) -> bool {
        matches!(
            self,
            ClosedState::SlowConsumerPendingBytes | ClosedState::SlowConsumerWriteDeadline
        )
    }
}

impl fmt::Display for ClosedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity a peer announces after the transport is up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectInfo {
    pub name: String,
    pub lang: String,
    pub version: String,
    /// Authenticated user, when authentication is in use.
    pub user: Option<String>,
    /// Account the connection is bound to.
    pub account: Option<String>,
}

/// One subscription held by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub subject: String,
    pub queue: Option<String>,
    pub sid: String,
    /// Messages delivered on this subscription.
    pub delivered: u64,
    /// Auto-unsubscribe limit, 0 when unlimited.
    pub max: u64,
}

impl Subscription {
    pub(crate) fn exhausted(&self) -> bool {
        self.max > 0 && self.delivered >= self.max
    }
}

#[derive(Debug)]
pub(crate) struct ClientState {
    pub(crate) ip: String,
    pub(crate) port: u16,
    pub(crate) start: DateTime<Utc>,
    pub(crate) last: DateTime<Utc>,
    pub(crate) info: ConnectInfo,
    pub(crate) rtt: Option<Duration>,
    pub(crate) ping_sent: Option<Instant>,
    pub(crate) tls: Option<(String, String)>,
    pub(crate) pending_bytes: u64,
    pub(crate) in_msgs: u64,
    pub(crate) out_msgs: u64,
    pub(crate) in_bytes: u64,
    pub(crate) out_bytes: u64,
    pub(crate) subs: Vec<Subscription>,
}

impl ClientState {
    /// Advance last activity, never before the connection start.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last = self.last.max(now);
    }

    /// Copy this state into a report record measured at `at`.
    ///
    /// `closed` turns the record into a closed-connection record stopped at
    /// `at`. Subscriptions and auth are only copied when asked for.
    pub(crate) fn conn_info(
        &self,
        cid: u64,
        at: DateTime<Utc>,
        closed: Option<ClosedState>,
        subs: bool,
        auth: bool,
    ) -> ConnInfo {
        let at = at.max(self.last);
        let mut info = ConnInfo::new(cid, &self.ip, self.port, self.start);
        info.last_activity = self.last;
        if let Some(reason) = closed {
            info.stop = Some(at);
            info.reason = Some(reason.to_string());
        }
        info.uptime = format_uptime(non_negative(at - self.start));
        info.idle = format_uptime(non_negative(at - self.last));
        info.rtt = self.rtt.map(format_rtt).unwrap_or_default();
        info.pending_bytes = self.pending_bytes;
        info.in_msgs = self.in_msgs;
        info.out_msgs = self.out_msgs;
        info.in_bytes = self.in_bytes;
        info.out_bytes = self.out_bytes;
        info.num_subs = self.subs.len() as u32;
        info.name.clone_from(&self.info.name);
        info.lang.clone_from(&self.info.lang);
        info.version.clone_from(&self.info.version);
        if let Some((version, cipher)) = &self.tls {
            info.tls_version.clone_from(version);
            info.tls_cipher_suite.clone_from(cipher);
        }
        if auth {
            info.authorized_user = self.info.user.clone().unwrap_or_default();
            info.account = self.info.account.clone().unwrap_or_default();
        }
        if subs {
            info.subs = self.subs.iter().map(|s| s.subject.clone()).collect();
        }
        info
    }
}

/// A connection: client, route or gateway link.
#[derive(Debug)]
pub struct Client {
    cid: u64,
    state: Mutex<ClientState>,
}

impl Client {
    pub(crate) fn new(cid: u64, ip: impl Into<String>, port: u16, now: DateTime<Utc>) -> Self {
        Self {
            cid,
            state: Mutex::new(ClientState {
                ip: ip.into(),
                port,
                start: now,
                last: now,
                info: ConnectInfo::default(),
                rtt: None,
                ping_sent: None,
                tls: None,
                pending_bytes: 0,
                in_msgs: 0,
                out_msgs: 0,
                in_bytes: 0,
                out_bytes: 0,
                subs: Vec::new(),
            }),
        }
    }

    pub fn cid(&self) -> u64 {
        self.cid
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock()
    }

    /// Open-connection record measured at `now`.
    pub(crate) fn conn_info(&self, now: DateTime<Utc>, subs: bool, auth: bool) -> ConnInfo {
        self.lock().conn_info(self.cid, now, None, subs, auth)
    }
}
