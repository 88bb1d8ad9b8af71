// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connections report.

use crate::error::{MonitorError, Result};
use crate::server::Server;
use crate::sort::{sort_conns, SortOpt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which connections a connections report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnState {
    #[default]
    Open,
    Closed,
    #[serde(alias = "all")]
    Any,
}

impl ConnState {
    pub const fn includes_open(self) -> bool {
        matches!(self, ConnState::Open | ConnState::Any)
    }

    pub const fn includes_closed(self) -> bool {
        matches!(self, ConnState::Closed | ConnState::Any)
    }
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnState::Open => "open",
            ConnState::Closed => "closed",
            ConnState::Any => "any",
        })
    }
}

impl FromStr for ConnState {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(ConnState::Open),
            "closed" => Ok(ConnState::Closed),
            "any" | "all" => Ok(ConnState::Any),
            _ => Err(MonitorError::invalid(
                "state",
                s,
                "expected open, closed, any or all",
            )),
        }
    }
}

/// Options for [`crate::Monitor::connz`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnzOptions {
    pub sort: SortOpt,
    /// Include the authorized user and account.
    pub auth: bool,
    /// Include each connection's subject list.
    pub subscriptions: bool,
    /// Negative values are treated as 0.
    pub offset: i64,
    /// Non-positive values select the configured default page size.
    pub limit: i64,
    /// Restrict to one connection id (0 means no restriction).
    pub cid: u64,
    pub state: ConnState,
}

/// Detached copy of one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnInfo {
    pub cid: u64,
    pub ip: String,
    pub port: u16,
    pub start: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rtt: String,
    pub uptime: String,
    pub idle: String,
    pub pending_bytes: u64,
    pub in_msgs: u64,
    pub out_msgs: u64,
    pub in_bytes: u64,
    pub out_bytes: u64,
    #[serde(rename = "subscriptions")]
    pub num_subs: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lang: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tls_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tls_cipher_suite: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authorized_user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,
    #[serde(
        default,
        rename = "subscriptions_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subs: Vec<String>,
}

impl ConnInfo {
    /// Blank record for a connection started at `start`.
    pub fn new(cid: u64, ip: &str, port: u16, start: DateTime<Utc>) -> Self {
        Self {
            cid,
            ip: ip.to_string(),
            port,
            start,
            last_activity: start,
            stop: None,
            reason: None,
            rtt: String::new(),
            uptime: "0s".to_string(),
            idle: "0s".to_string(),
            pending_bytes: 0,
            in_msgs: 0,
            out_msgs: 0,
            in_bytes: 0,
            out_bytes: 0,
            num_subs: 0,
            name: String::new(),
            lang: String::new(),
            version: String::new(),
            tls_version: String::new(),
            tls_cipher_suite: String::new(),
            authorized_user: String::new(),
            account: String::new(),
            subs: Vec::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stop.is_some()
    }

    /// Drop the optional detail a query did not ask for.
    pub(crate) fn strip(&mut self, subs: bool, auth: bool) {
        if !subs {
            self.subs.clear();
        }
        if !auth {
            self.authorized_user.clear();
            self.account.clear();
        }
    }
}

/// Connections report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connz {
    pub server_id: String,
    pub now: DateTime<Utc>,
    /// Records in this page.
    pub num_connections: usize,
    /// Records matching the filters, before pagination.
    pub total: usize,
    /// Open plus retained closed connections, before any filter.
    pub total_in_scope: usize,
    pub offset: usize,
    pub limit: usize,
    pub connections: Vec<ConnInfo>,
}

/// Reject option combinations before touching shared state.
pub(crate) fn validate(opts: &ConnzOptions) -> Result<()> {
    if opts.sort.closed_only() && opts.state != ConnState::Closed {
        return Err(MonitorError::IncompatibleScope {
            sort: opts.sort,
            state: opts.state,
        });
    }
    Ok(())
}

pub(crate) fn build(server: &Server, opts: &ConnzOptions) -> Result<Connz> {
    validate(opts)?;

    let offset = usize::try_from(opts.offset).unwrap_or(0);
    let limit = usize::try_from(opts.limit)
        .ok()
        .filter(|l| *l > 0)
        .unwrap_or(server.config().conn_list_size);
    let now = Utc::now();
    let (subs, auth) = (opts.subscriptions, opts.auth);

    // Open and closed are copied in one pass so a connection closing
    // concurrently is seen exactly once.
    let (mut conns, total_in_scope) = server.snapshot(|reg| {
        let ring = server.closed();
        let mut conns = Vec::new();
        if opts.state.includes_open() {
            if opts.cid > 0 {
                conns.extend(reg.clients.get(&opts.cid).map(|c| c.conn_info(now, subs, auth)));
            } else {
                conns.extend(reg.clients.values().map(|c| c.conn_info(now, subs, auth)));
            }
        }
        if opts.state.includes_closed() {
            if opts.cid > 0 {
                conns.extend(ring.find(opts.cid));
            } else {
                conns.extend(ring.all());
            }
        }
        (conns, reg.clients.len() + ring.len())
    });

    for conn in conns.iter_mut().filter(|c| c.is_closed()) {
        conn.strip(subs, auth);
    }
    sort_conns(&mut conns, opts.sort, now);

    let total = conns.len();
    let connections: Vec<ConnInfo> = conns.into_iter().skip(offset).take(limit).collect();
    log::trace!(
        "[monitor] connz state={} sort={} total={} returned={}",
        opts.state,
        opts.sort,
        total,
        connections.len()
    );

    Ok(Connz {
        server_id: server.id().to_string(),
        now,
        num_connections: connections.len(),
        total,
        total_in_scope,
        offset,
        limit,
        connections,
    })
}

/// Exact lookup of one connection, open first, then closed.
pub(crate) fn connection(server: &Server, cid: u64) -> Result<ConnInfo> {
    let now = Utc::now();
    server
        .snapshot(|reg| {
            reg.clients
                .get(&cid)
                .map(|c| c.conn_info(now, true, true))
                .or_else(|| server.closed().find(cid))
        })
        .ok_or_else(|| MonitorError::NotFound(format!("connection {}", cid)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::server::ClosedState;
    use std::net::SocketAddr;

    fn server_with(n: u16) -> (Server, Vec<u64>) {
        let server = Server::with_id(MonitorConfig::default(), "NCONNZ");
        let cids = (0..n)
            .map(|i| server.accept_client(SocketAddr::from(([127, 0, 0, 1], 6000 + i))))
            .collect();
        (server, cids)
    }

    #[test]
    fn test_conn_state_parse() {
        assert_eq!("open".parse::<ConnState>(), Ok(ConnState::Open));
        assert_eq!("CLOSED".parse::<ConnState>(), Ok(ConnState::Closed));
        assert_eq!("Any".parse::<ConnState>(), Ok(ConnState::Any));
        assert_eq!("all".parse::<ConnState>(), Ok(ConnState::Any));
        assert!("nope".parse::<ConnState>().unwrap_err().is_request_error());
    }

    #[test]
    fn test_closed_only_sort_rejected_outside_closed_scope() {
        let (server, _) = server_with(1);
        for sort in [SortOpt::ByStop, SortOpt::ByReason] {
            for state in [ConnState::Open, ConnState::Any] {
                let opts = ConnzOptions {
                    sort,
                    state,
                    ..Default::default()
                };
                assert_eq!(
                    build(&server, &opts).unwrap_err(),
                    MonitorError::IncompatibleScope { sort, state }
                );
            }
            let opts = ConnzOptions {
                sort,
                state: ConnState::Closed,
                ..Default::default()
            };
            assert!(build(&server, &opts).is_ok());
        }
    }

    #[test]
    fn test_pagination_clamps() {
        let (server, _) = server_with(5);
        let opts = ConnzOptions {
            offset: -3,
            limit: -1,
            ..Default::default()
        };
        let c = build(&server, &opts).unwrap();
        assert_eq!(c.offset, 0);
        assert_eq!(c.limit, 1024);
        assert_eq!(c.num_connections, 5);

        let opts = ConnzOptions {
            offset: 1,
            limit: 2,
            ..Default::default()
        };
        let c = build(&server, &opts).unwrap();
        assert_eq!(c.num_connections, 2);
        assert_eq!(c.total, 5);
        assert_eq!(c.connections[0].cid, 2);

        let opts = ConnzOptions {
            offset: 10,
            ..Default::default()
        };
        let c = build(&server, &opts).unwrap();
        assert_eq!(c.num_connections, 0);
        assert_eq!(c.total, 5);
    }

    #[test]
    fn test_cid_filter_respects_state() {
        let (server, cids) = server_with(3);
        server.close_connection(cids[0], ClosedState::ClientClosed).unwrap();

        let open_only = ConnzOptions {
            cid: cids[0],
            ..Default::default()
        };
        let c = build(&server, &open_only).unwrap();
        assert_eq!(c.total, 0);
        assert_eq!(c.total_in_scope, 3);

        let closed = ConnzOptions {
            cid: cids[0],
            state: ConnState::Closed,
            ..Default::default()
        };
        let c = build(&server, &closed).unwrap();
        assert_eq!(c.num_connections, 1);
        assert_eq!(c.connections[0].reason.as_deref(), Some("Client Closed"));

        let any = ConnzOptions {
            cid: cids[1],
            state: ConnState::Any,
            ..Default::default()
        };
        assert_eq!(build(&server, &any).unwrap().num_connections, 1);
    }

    #[test]
    fn test_closed_detail_only_when_requested() {
        let (server, cids) = server_with(1);
        server
            .set_connect_info(
                cids[0],
                crate::server::ConnectInfo {
                    user: Some("bob".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        server.subscribe(cids[0], "foo", None, "1").unwrap();
        server.close_connection(cids[0], ClosedState::ClientClosed).unwrap();

        let plain = ConnzOptions {
            state: ConnState::Closed,
            ..Default::default()
        };
        let c = build(&server, &plain).unwrap();
        assert_eq!(c.connections[0].num_subs, 1);
        assert!(c.connections[0].subs.is_empty());
        assert!(c.connections[0].authorized_user.is_empty());

        let detailed = ConnzOptions {
            state: ConnState::Closed,
            subscriptions: true,
            auth: true,
            ..Default::default()
        };
        let c = build(&server, &detailed).unwrap();
        assert_eq!(c.connections[0].subs, vec!["foo".to_string()]);
        assert_eq!(c.connections[0].authorized_user, "bob");
    }

    #[test]
    fn test_tls_and_rtt_filled_once_measured() {
        let (server, cids) = server_with(2);
        let (a, b) = (cids[0], cids[1]);

        let fresh = build(&server, &ConnzOptions::default()).unwrap();
        for conn in &fresh.connections {
            assert!(conn.tls_version.is_empty());
            assert!(conn.tls_cipher_suite.is_empty());
            assert!(conn.rtt.is_empty());
        }

        server
            .complete_tls_handshake(a, "1.3", "TLS_AES_128_GCM_SHA256")
            .unwrap();
        server.set_rtt(a, std::time::Duration::from_micros(1500)).unwrap();
        server.send_ping(b).unwrap();
        server.receive_pong(b).unwrap();

        let c = build(&server, &ConnzOptions::default()).unwrap();
        assert_eq!(c.connections[0].tls_version, "1.3");
        assert_eq!(c.connections[0].tls_cipher_suite, "TLS_AES_128_GCM_SHA256");
        assert_eq!(c.connections[0].rtt, "1.5ms");
        assert!(c.connections[1].tls_version.is_empty());
        assert!(!c.connections[1].rtt.is_empty());

        server.close_connection(a, ClosedState::ClientClosed).unwrap();
        let closed = ConnzOptions {
            state: ConnState::Closed,
            ..Default::default()
        };
        let c = build(&server, &closed).unwrap();
        assert_eq!(c.connections[0].tls_version, "1.3");
        assert_eq!(c.connections[0].rtt, "1.5ms");
    }

    #[test]
    fn test_sort_by_pending() {
        let (server, cids) = server_with(3);
        server.set_pending_bytes(cids[0], 10).unwrap();
        server.set_pending_bytes(cids[1], 100).unwrap();

        let opts = ConnzOptions {
            sort: SortOpt::ByPending,
            ..Default::default()
        };
        let c = build(&server, &opts).unwrap();
        let order: Vec<(u64, u64)> = c
            .connections
            .iter()
            .map(|conn| (conn.cid, conn.pending_bytes))
            .collect();
        assert_eq!(order, vec![(cids[1], 100), (cids[0], 10), (cids[2], 0)]);
    }

    #[test]
    fn test_huge_offset_returns_empty_page() {
        let (server, _) = server_with(2);
        let opts = ConnzOptions {
            offset: i64::MAX,
            ..Default::default()
        };
        let c = build(&server, &opts).unwrap();
        assert_eq!(c.num_connections, 0);
        assert_eq!(c.total, 2);
    }

    #[test]
    fn test_connection_lookup() {
        let (server, cids) = server_with(2);
        server.close_connection(cids[1], ClosedState::ReadError).unwrap();
        assert_eq!(connection(&server, cids[0]).unwrap().cid, cids[0]);
        assert!(connection(&server, cids[1]).unwrap().is_closed());
        assert!(matches!(
            connection(&server, 99),
            Err(MonitorError::NotFound(_))
        ));
    }

    #[test]
    fn test_json_field_names() {
        let (server, cids) = server_with(1);
        server.subscribe(cids[0], "foo", None, "1").unwrap();
        let opts = ConnzOptions {
            subscriptions: true,
            ..Default::default()
        };
        let json = serde_json::to_value(build(&server, &opts).unwrap()).unwrap();
        let conn = &json["connections"][0];
        assert_eq!(conn["subscriptions"], 1);
        assert_eq!(conn["subscriptions_list"][0], "foo");
        assert!(conn.get("stop").is_none());
        assert!(conn.get("rtt").is_none());
        assert!(conn.get("authorized_user").is_none());
    }
}
