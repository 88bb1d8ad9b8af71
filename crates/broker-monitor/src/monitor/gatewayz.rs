// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateways report.

use super::connz::ConnInfo;
use crate::error::Result;
use crate::server::gateway::{AccountInterest, GatewayLink};
use crate::server::Server;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options for [`crate::Monitor::gatewayz`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayzOptions {
    /// Restrict both link maps to this remote cluster.
    pub name: String,
    /// List per-account interest on each link.
    pub accounts: bool,
    /// List only this account (implies listing).
    pub account_name: String,
    /// Maximum accounts per link; a positive value implies listing.
    pub accounts_limit: i64,
}

/// Interest summary of one account on one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGatewayz {
    pub name: String,
    pub interest_mode: String,
    pub no_interest_count: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub interest_only_threshold: usize,
    pub num_subs: usize,
    pub num_queue_subs: usize,
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

/// One gateway link as seen from this server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGatewayz {
    pub configured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<AccountGatewayz>,
}

/// Gateways report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gatewayz {
    pub server_id: String,
    pub now: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "is_zero_port")]
    pub port: u16,
    pub outbound_gateways: BTreeMap<String, RemoteGatewayz>,
    pub inbound_gateways: BTreeMap<String, Vec<RemoteGatewayz>>,
}

fn is_zero_port(v: &u16) -> bool {
    *v == 0
}

/// Which accounts to copy from each link.
enum AccountSelection<'a> {
    None,
    One(&'a str),
    First(usize),
}

impl<'a> AccountSelection<'a> {
    fn from_options(opts: &'a GatewayzOptions, default_limit: usize) -> Self {
        if !opts.account_name.is_empty() {
            AccountSelection::One(&opts.account_name)
        } else if opts.accounts || opts.accounts_limit > 0 {
            let limit = usize::try_from(opts.accounts_limit)
                .ok()
                .filter(|l| *l > 0)
                .unwrap_or(default_limit);
            AccountSelection::First(limit)
        } else {
            AccountSelection::None
        }
    }
}

fn account_entry(
    name: &str,
    interest: &AccountInterest,
    outbound: bool,
    threshold: usize,
) -> AccountGatewayz {
    AccountGatewayz {
        name: name.to_string(),
        interest_mode: interest.mode.to_string(),
        no_interest_count: interest.no_interest.len(),
        interest_only_threshold: if outbound { threshold } else { 0 },
        num_subs: if outbound { interest.num_subs() } else { 0 },
        num_queue_subs: if outbound { interest.num_queue_subs() } else { 0 },
    }
}

fn link_entry(
    link: &GatewayLink,
    now: DateTime<Utc>,
    selection: &AccountSelection<'_>,
    threshold: usize,
) -> RemoteGatewayz {
    let accounts = {
        let table = link.accounts();
        let entry = |(name, interest): (&String, &AccountInterest)| {
            account_entry(name, interest, link.outbound, threshold)
        };
        match selection {
            AccountSelection::None => Vec::new(),
            AccountSelection::One(name) => table.get_key_value(*name).map(entry).into_iter().collect(),
            AccountSelection::First(limit) => table.iter().take(*limit).map(entry).collect(),
        }
    };
    RemoteGatewayz {
        configured: link.configured,
        connection: Some(link.client.conn_info(now, false, false)),
        accounts,
    }
}

pub(crate) fn build(server: &Server, opts: &GatewayzOptions) -> Result<Gatewayz> {
    let config = server.config();
    let selection = AccountSelection::from_options(opts, config.gateway_accounts_limit);
    let threshold = config.gateway.interest_only_threshold;
    let now = Utc::now();
    let wanted = |name: &str| opts.name.is_empty() || opts.name == name;

    let (outbound_gateways, inbound_gateways) = server.snapshot(|reg| {
        let outbound: BTreeMap<String, RemoteGatewayz> = reg
            .outbound_gateways
            .iter()
            .filter(|(name, _)| wanted(name))
            .map(|(name, link)| (name.clone(), link_entry(link, now, &selection, threshold)))
            .collect();
        let inbound: BTreeMap<String, Vec<RemoteGatewayz>> = reg
            .inbound_gateways
            .iter()
            .filter(|(name, _)| wanted(name))
            .map(|(name, links)| {
                let entries = links
                    .iter()
                    .map(|link| link_entry(link, now, &selection, threshold))
                    .collect();
                (name.clone(), entries)
            })
            .collect();
        (outbound, inbound)
    });

    Ok(Gatewayz {
        server_id: server.id().to_string(),
        now,
        name: config.gateway.name.clone(),
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        outbound_gateways,
        inbound_gateways,
    })
}
