// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inter-server route links.

use super::client::Client;
use crate::config::RoutePermissions;
use std::sync::Arc;

/// Parameters of a newly established route.
#[derive(Debug, Clone, Default)]
pub struct RouteSpec {
    /// Server id of the peer.
    pub remote_id: String,
    pub ip: String,
    pub port: u16,
    /// True when this server initiated the connection.
    pub did_solicit: bool,
    /// True when the peer URL comes from configuration rather than gossip.
    pub is_configured: bool,
    /// Permissions the peer advertised for this link.
    pub permissions: Option<RoutePermissions>,
}

#[derive(Debug)]
pub struct Route {
    pub(crate) client: Arc<Client>,
    pub(crate) remote_id: String,
    pub(crate) did_solicit: bool,
    pub(crate) is_configured: bool,
    pub(crate) permissions: Option<RoutePermissions>,
}

impl Route {
    pub(crate) fn new(client: Arc<Client>, spec: RouteSpec) -> Self {
        Self {
            client,
            remote_id: spec.remote_id,
            did_solicit: spec.did_solicit,
            is_configured: spec.is_configured,
            permissions: spec.permissions,
        }
    }

    pub fn rid(&self) -> u64 {
        self.client.cid()
    }

    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }
}
