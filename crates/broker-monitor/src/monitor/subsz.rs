// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriptions report.

use crate::error::Result;
use crate::server::Server;
use crate::subject::{matches_literal, validate_literal_subject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options for [`crate::Monitor::subsz`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubszOptions {
    /// Include per-subscription details.
    pub subscriptions: bool,
    pub offset: i64,
    pub limit: i64,
    /// Literal subject; only subscriptions a publish to it would reach are
    /// listed. Empty means no filter.
    pub test: String,
}

/// One subscription in the details list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDetail {
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub qgroup: String,
    pub sid: String,
    pub msgs: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max: u64,
    pub cid: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Subscriptions report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsz {
    pub server_id: String,
    pub now: DateTime<Utc>,
    pub num_subscriptions: u64,
    pub num_inserts: u64,
    pub num_removes: u64,
    pub num_matches: u64,
    pub max_fanout: u64,
    pub avg_fanout: f64,
    /// Subscriptions passing the test filter, before pagination.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    #[serde(
        default,
        rename = "subscriptions_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subs: Vec<SubDetail>,
}

pub(crate) fn build(server: &Server, opts: &SubszOptions) -> Result<Subsz> {
    let test = opts.test.as_str();
    if !test.is_empty() {
        validate_literal_subject(test)?;
    }

    let offset = usize::try_from(opts.offset).unwrap_or(0);
    let limit = usize::try_from(opts.limit)
        .ok()
        .filter(|l| *l > 0)
        .unwrap_or(server.config().sub_list_size);
    let now = Utc::now();
    let stats = server.sub_stats.view();

    let details: Vec<SubDetail> = server.snapshot(|reg| {
        let mut out = Vec::new();
        for conn in reg.subscribers() {
            let st = conn.lock();
            out.extend(
                st.subs
                    .iter()
                    .filter(|s| test.is_empty() || matches_literal(&s.subject, test))
                    .map(|s| SubDetail {
                        subject: s.subject.clone(),
                        qgroup: s.queue.clone().unwrap_or_default(),
                        sid: s.sid.clone(),
                        msgs: s.delivered,
                        max: s.max,
                        cid: conn.cid(),
                    }),
            );
        }
        out
    });

    let total = details.len();
    let subs = if opts.subscriptions {
        details.into_iter().skip(offset).take(limit).collect()
    } else {
        Vec::new()
    };

    Ok(Subsz {
        server_id: server.id().to_string(),
        now,
        num_subscriptions: stats.count,
        num_inserts: stats.inserts,
        num_removes: stats.removes,
        num_matches: stats.matches,
        max_fanout: stats.max_fanout,
        avg_fanout: stats.avg_fanout,
        total,
        offset,
        limit,
        subs,
    })
}
