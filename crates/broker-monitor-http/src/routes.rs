// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Route definitions.

use crate::{handlers, AppState};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Monitoring routes. `/subscriptionsz` is an alias of `/subsz`.
pub fn monitor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/varz", get(handlers::varz))
        .route("/connz", get(handlers::connz))
        .route("/routez", get(handlers::routez))
        .route("/subsz", get(handlers::subsz))
        .route("/subscriptionsz", get(handlers::subsz))
        .route("/gatewayz", get(handlers::gatewayz))
        .route("/healthz", get(handlers::healthz))
}
