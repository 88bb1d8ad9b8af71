// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! General server statistics report.

use crate::error::Result;
use crate::server::Server;
use crate::time::{format_uptime, non_negative};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::Ordering;

/// Options for [`crate::Monitor::varz`]. There are none yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarzOptions {}

/// Cluster options as reported by varz.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptsVarz {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub auth_timeout: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

/// Gateway options as reported by varz.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayOptsVarz {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub auth_timeout: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub tls_timeout: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub advertise: String,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub connect_retries: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<RemoteGatewayOptsVarz>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reject_unknown: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteGatewayOptsVarz {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub tls_timeout: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

/// General statistics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Varz {
    pub server_id: String,
    pub server_name: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub max_connections: usize,
    pub max_payload: usize,
    pub start: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub uptime: String,
    pub connections: usize,
    pub total_connections: u64,
    pub routes: usize,
    /// Distinct servers reachable over routes.
    pub remotes: usize,
    pub gateways: usize,
    pub in_msgs: u64,
    pub out_msgs: u64,
    pub in_bytes: u64,
    pub out_bytes: u64,
    pub slow_consumers: u64,
    pub subscriptions: u64,
    pub http_req_stats: BTreeMap<String, u64>,
    pub cluster: ClusterOptsVarz,
    pub gateway: GatewayOptsVarz,
}

pub(crate) fn build(
    server: &Server,
    _opts: &VarzOptions,
    http_req_stats: BTreeMap<String, u64>,
) -> Result<Varz> {
    let config = server.config();
    let now = Utc::now();
    let (connections, routes, remotes, gateways) = server.snapshot(|reg| {
        let remotes: BTreeSet<&str> = reg.routes.values().map(|r| r.remote_id()).collect();
        (
            reg.clients.len(),
            reg.routes.len(),
            remotes.len(),
            reg.outbound_gateways.len(),
        )
    });
    let stats = &server.stats;

    Ok(Varz {
        server_id: server.id().to_string(),
        server_name: server.name().to_string(),
        version: crate::VERSION.to_string(),
        host: config.host.clone(),
        port: config.port,
        max_connections: config.max_connections,
        max_payload: config.max_payload,
        start: server.start_time(),
        now,
        uptime: format_uptime(non_negative(now - server.start_time())),
        connections,
        total_connections: stats.total_connections.load(Ordering::Relaxed),
        routes,
        remotes,
        gateways,
        in_msgs: stats.in_msgs.load(Ordering::Relaxed),
        out_msgs: stats.out_msgs.load(Ordering::Relaxed),
        in_bytes: stats.in_bytes.load(Ordering::Relaxed),
        out_bytes: stats.out_bytes.load(Ordering::Relaxed),
        slow_consumers: stats.slow_consumers.load(Ordering::Relaxed),
        subscriptions: server.sub_stats.view().count,
        http_req_stats,
        cluster: ClusterOptsVarz {
            host: config.cluster.host.clone(),
            port: config.cluster.port,
            auth_timeout: config.cluster.auth_timeout,
            urls: config.cluster.routes.clone(),
        },
        gateway: GatewayOptsVarz {
            name: config.gateway.name.clone(),
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            auth_timeout: config.gateway.auth_timeout,
            tls_timeout: config.gateway.tls_timeout,
            advertise: config.gateway.advertise.clone(),
            connect_retries: config.gateway.connect_retries,
            gateways: config
                .gateway
                .gateways
                .iter()
                .map(|g| RemoteGatewayOptsVarz {
                    name: g.name.clone(),
                    tls_timeout: g.tls_timeout,
                    urls: g.urls.clone(),
                })
                .collect(),
            reject_unknown: config.gateway.reject_unknown,
        },
    })
}
