// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker Monitoring Snapshots
//!
//! Point-in-time views of a publish/subscribe broker: open and recently
//! closed client connections, inter-server routes, the subscription table
//! and inter-cluster gateway links with their per-account interest state.
//!
//! # Features
//!
//! - **Connections**: filter by id and state, sort by 13 keys, paginate
//! - **Closed history**: fixed-capacity ring of terminated connections
//! - **Routes**: per-route counters and advertised permissions
//! - **Subscriptions**: table statistics and a literal-subject match test
//! - **Gateways**: inbound/outbound links with bounded account listings
//!
//! # Quick Start
//!
//! ```
//! use broker_monitor::{ConnzOptions, Monitor, MonitorConfig, Server, SortOpt};
//! use std::sync::Arc;
//!
//! let server = Arc::new(Server::new(MonitorConfig::default()));
//! let cid = server.accept_client("127.0.0.1:50000".parse().unwrap());
//! server.subscribe(cid, "orders.>", None, "1").unwrap();
//!
//! let monitor = Monitor::new(Arc::clone(&server));
//! let connz = monitor
//!     .connz(&ConnzOptions {
//!         sort: SortOpt::BySubs,
//!         subscriptions: true,
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(connz.connections[0].subs, vec!["orders.>".to_string()]);
//! ```

pub mod closed;
pub mod config;
pub mod error;
pub mod monitor;
pub mod server;
mod snapshot;
pub mod sort;
pub mod subject;
pub mod time;

pub use closed::ClosedRing;
pub use config::{
    ClusterConfig, ConfigError, GatewayConfig, MonitorConfig, RemoteGatewayConfig,
    RoutePermissions, SubjectPermission,
};
pub use error::{MonitorError, Result};
pub use monitor::{
    AccountGatewayz, ConnInfo, ConnState, Connz, ConnzOptions, Endpoint, Gatewayz,
    GatewayzOptions, Healthz, Monitor, RemoteGatewayz, RouteInfo, Routez, RoutezOptions,
    SubDetail, Subsz, SubszOptions, Varz, VarzOptions,
};
pub use server::{ClosedState, ConnectInfo, GatewaySpec, InterestMode, RouteSpec, Server};
pub use sort::SortOpt;

/// Crate version reported by varz.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
