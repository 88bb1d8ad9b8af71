// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers for the monitoring endpoints.

use crate::params::{self, Params};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use broker_monitor::{Endpoint, MonitorError, VarzOptions};
use serde::Serialize;
use std::sync::Arc;

/// Error response, rendered as a plain-text body.
#[derive(Debug)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.error,
        )
            .into_response()
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        let code = if err.is_request_error() {
            400
        } else if matches!(err, MonitorError::NotFound(_)) {
            404
        } else {
            500
        };
        if code == 500 {
            tracing::error!("snapshot failed: {}", err);
        } else {
            tracing::debug!("rejected request: {}", err);
        }
        Self {
            error: format!("Error: {}", err),
            code,
        }
    }
}

/// Serialize a report, wrapping it as `callback(json)` when asked to.
fn render<T: Serialize>(callback: Option<&str>, report: &T) -> Result<Response, ApiError> {
    let json = serde_json::to_string_pretty(report).map_err(MonitorError::from)?;

    let response = match callback {
        Some(cb) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/javascript")],
            format!("{}({})", cb, json),
        )
            .into_response(),
        None => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response(),
    };
    Ok(response)
}

const INDEX_HTML: &str = r#"<html lang="en">
<head><title>Broker Monitor</title></head>
<body>
<h1>Broker Monitor</h1>
<a href="varz">General</a><br/>
<a href="connz">Connections</a><br/>
<a href="routez">Routes</a><br/>
<a href="gatewayz">Gateways</a><br/>
<a href="subsz">Subscriptions</a><br/>
<a href="healthz">Health</a><br/>
</body>
</html>
"#;

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<&'static str> {
    state.monitor.record_request(Endpoint::Root);
    Html(INDEX_HTML)
}

/// GET /varz
pub async fn varz(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    state.monitor.record_request(Endpoint::Varz);
    let callback = params::callback(&params)?;
    let report = state.monitor.varz(&VarzOptions::default())?;
    render(callback, &report)
}

/// GET /connz
pub async fn connz(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    state.monitor.record_request(Endpoint::Connz);
    let opts = params::connz_options(&params)?;
    let callback = params::callback(&params)?;
    let report = state.monitor.connz(&opts)?;
    render(callback, &report)
}

/// GET /routez
pub async fn routez(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    state.monitor.record_request(Endpoint::Routez);
    let opts = params::routez_options(&params)?;
    let callback = params::callback(&params)?;
    let report = state.monitor.routez(&opts)?;
    render(callback, &report)
}

/// GET /subsz and /subscriptionsz
pub async fn subsz(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    state.monitor.record_request(Endpoint::Subsz);
    let opts = params::subsz_options(&params)?;
    let callback = params::callback(&params)?;
    let report = state.monitor.subsz(&opts)?;
    render(callback, &report)
}

/// GET /gatewayz
pub async fn gatewayz(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    state.monitor.record_request(Endpoint::Gatewayz);
    let opts = params::gatewayz_options(&params)?;
    let callback = params::callback(&params)?;
    let report = state.monitor.gatewayz(&opts)?;
    render(callback, &report)
}

/// GET /healthz
pub async fn healthz(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> Result<Response, ApiError> {
    state.monitor.record_request(Endpoint::Healthz);
    let callback = params::callback(&params)?;
    render(callback, &state.monitor.healthz())
}
