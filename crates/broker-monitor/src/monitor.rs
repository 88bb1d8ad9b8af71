// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Report aggregator.
//!
//! [`Monitor`] validates each option set, then delegates to the per-report
//! builders. Every report is an owned value: nothing in it aliases live
//! server state.

mod connz;
mod endpoint;
mod gatewayz;
mod routez;
mod subsz;
mod varz;

pub use connz::{ConnInfo, ConnState, Connz, ConnzOptions};
pub use endpoint::Endpoint;
pub use gatewayz::{AccountGatewayz, Gatewayz, GatewayzOptions, RemoteGatewayz};
pub use routez::{RouteInfo, Routez, RoutezOptions};
pub use subsz::{SubDetail, Subsz, SubszOptions};
pub use varz::{ClusterOptsVarz, GatewayOptsVarz, RemoteGatewayOptsVarz, Varz, VarzOptions};

use crate::error::Result;
use crate::server::Server;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Healthz {
    pub status: String,
}

/// Snapshot front end over a [`Server`].
#[derive(Debug)]
pub struct Monitor {
    server: Arc<Server>,
    http_req_stats: Mutex<BTreeMap<String, u64>>,
}

impl Monitor {
    pub fn new(server: Arc<Server>) -> Self {
        let http_req_stats = Endpoint::ALL
            .iter()
            .map(|e| (e.path().to_string(), 0))
            .collect();
        Self {
            server,
            http_req_stats: Mutex::new(http_req_stats),
        }
    }

    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    /// Count one HTTP request; only the HTTP boundary calls this.
    pub fn record_request(&self, endpoint: Endpoint) {
        *self
            .http_req_stats
            .lock()
            .entry(endpoint.path().to_string())
            .or_default() += 1;
    }

    /// General statistics.
    pub fn varz(&self, opts: &VarzOptions) -> Result<Varz> {
        let stats = self.http_req_stats.lock().clone();
        varz::build(&self.server, opts, stats)
    }

    /// Open and/or closed connections, filtered, sorted and paginated.
    pub fn connz(&self, opts: &ConnzOptions) -> Result<Connz> {
        connz::build(&self.server, opts)
    }

    /// One connection by id, open or closed.
    pub fn connection(&self, cid: u64) -> Result<ConnInfo> {
        connz::connection(&self.server, cid)
    }

    pub fn routez(&self, opts: &RoutezOptions) -> Result<Routez> {
        routez::build(&self.server, opts)
    }

    pub fn subsz(&self, opts: &SubszOptions) -> Result<Subsz> {
        subsz::build(&self.server, opts)
    }

    pub fn gatewayz(&self, opts: &GatewayzOptions) -> Result<Gatewayz> {
        gatewayz::build(&self.server, opts)
    }

    pub fn healthz(&self) -> Healthz {
        Healthz {
            status: "ok".to_string(),
        }
    }

    /// Time since the server started.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        crate::time::non_negative(chrono::Utc::now() - self.server.start_time())
    }
}
