// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Routes report.

use crate::config::SubjectPermission;
use crate::error::Result;
use crate::server::Server;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options for [`crate::Monitor::routez`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutezOptions {
    /// Include each route's subject list.
    pub subscriptions: bool,
}

/// One route link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub rid: u64,
    pub remote_id: String,
    pub did_solicit: bool,
    pub is_configured: bool,
    pub ip: String,
    pub port: u16,
    /// Import permissions the peer advertised; absent when it has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<SubjectPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<SubjectPermission>,
    pub pending_size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rtt: String,
    pub in_msgs: u64,
    pub out_msgs: u64,
    pub in_bytes: u64,
    pub out_bytes: u64,
    #[serde(rename = "subscriptions")]
    pub num_subs: u32,
    #[serde(
        default,
        rename = "subscriptions_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subs: Vec<String>,
}

/// Routes report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routez {
    pub server_id: String,
    pub now: DateTime<Utc>,
    /// This server's own cluster import permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<SubjectPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<SubjectPermission>,
    pub num_routes: usize,
    pub routes: Vec<RouteInfo>,
}

pub(crate) fn build(server: &Server, opts: &RoutezOptions) -> Result<Routez> {
    let now = Utc::now();
    let routes: Vec<RouteInfo> = server.snapshot(|reg| {
        reg.routes
            .values()
            .map(|route| {
                let conn = route.client.conn_info(now, opts.subscriptions, false);
                let perms = route.permissions.clone().unwrap_or_default();
                RouteInfo {
                    rid: route.rid(),
                    remote_id: route.remote_id.clone(),
                    did_solicit: route.did_solicit,
                    is_configured: route.is_configured,
                    ip: conn.ip,
                    port: conn.port,
                    import: perms.import,
                    export: perms.export,
                    pending_size: conn.pending_bytes,
                    rtt: conn.rtt,
                    in_msgs: conn.in_msgs,
                    out_msgs: conn.out_msgs,
                    in_bytes: conn.in_bytes,
                    out_bytes: conn.out_bytes,
                    num_subs: conn.num_subs,
                    subs: conn.subs,
                }
            })
            .collect()
    });

    let own = server.config().cluster.permissions.clone().unwrap_or_default();
    Ok(Routez {
        server_id: server.id().to_string(),
        now,
        import: own.import,
        export: own.export,
        num_routes: routes.len(),
        routes,
    })
}
