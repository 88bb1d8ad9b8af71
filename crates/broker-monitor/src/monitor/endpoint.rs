// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monitoring endpoints and their HTTP paths.

/// Report endpoints served over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Root,
    Varz,
    Connz,
    Routez,
    Subsz,
    Gatewayz,
    Healthz,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Root,
        Endpoint::Varz,
        Endpoint::Connz,
        Endpoint::Routez,
        Endpoint::Subsz,
        Endpoint::Gatewayz,
        Endpoint::Healthz,
    ];

    /// Canonical path, also the key in varz `http_req_stats`.
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Root => "/",
            Endpoint::Varz => "/varz",
            Endpoint::Connz => "/connz",
            Endpoint::Routez => "/routez",
            Endpoint::Subsz => "/subsz",
            Endpoint::Gatewayz => "/gatewayz",
            Endpoint::Healthz => "/healthz",
        }
    }
}
