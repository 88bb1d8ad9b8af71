// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker Monitor HTTP - JSON monitoring endpoints
//!
//! Serves the snapshot reports of a [`Monitor`] over HTTP.
//!
//! # Endpoints
//!
//! - `GET /` - Index page
//! - `GET /varz` - General server statistics
//! - `GET /connz` - Connections (`cid`, `state`, `sort`, `subs`, `auth`, `offset`, `limit`)
//! - `GET /routez` - Routes (`subs`)
//! - `GET /subsz`, `GET /subscriptionsz` - Subscriptions (`subs`, `offset`, `limit`, `test`)
//! - `GET /gatewayz` - Gateways (`gw_name`, `accs`, `acc_name`, `accs_limit`)
//! - `GET /healthz` - Health check
//!
//! Every JSON endpoint accepts `callback=<name>` for JSONP output.

pub mod handlers;
pub mod params;
pub mod routes;

use axum::Router;
use broker_monitor::Monitor;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub monitor: Arc<Monitor>,
}

impl AppState {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        Self { monitor }
    }
}

pub fn build_router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .merge(routes::monitor_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(AppState::new(monitor)))
}
