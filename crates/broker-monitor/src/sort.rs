// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection sort keys.
//!
//! Each key carries its own direction. Ties are broken by ascending
//! connection id so every ordering is total and repeatable.

use crate::error::MonitorError;
use crate::monitor::ConnInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sort key for connection reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOpt {
    #[default]
    #[serde(rename = "cid")]
    ByCid,
    #[serde(rename = "start")]
    ByStart,
    #[serde(rename = "subs")]
    BySubs,
    #[serde(rename = "pending")]
    ByPending,
    #[serde(rename = "msgs_to")]
    ByOutMsgs,
    #[serde(rename = "msgs_from")]
    ByInMsgs,
    #[serde(rename = "bytes_to")]
    ByOutBytes,
    #[serde(rename = "bytes_from")]
    ByInBytes,
    #[serde(rename = "last")]
    ByLast,
    /// Longest idle first.
    #[serde(rename = "idle")]
    ByIdle,
    #[serde(rename = "uptime")]
    ByUptime,
    #[serde(rename = "stop")]
    ByStop,
    #[serde(rename = "reason")]
    ByReason,
}

/// Ordering applied by a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl SortOpt {
    pub const ALL: [SortOpt; 13] = [
        SortOpt::ByCid,
        SortOpt::ByStart,
        SortOpt::BySubs,
        SortOpt::ByPending,
        SortOpt::ByOutMsgs,
        SortOpt::ByInMsgs,
        SortOpt::ByOutBytes,
        SortOpt::ByInBytes,
        SortOpt::ByLast,
        SortOpt::ByIdle,
        SortOpt::ByUptime,
        SortOpt::ByStop,
        SortOpt::ByReason,
    ];

    /// Query-string name of this key.
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOpt::ByCid => "cid",
            SortOpt::ByStart => "start",
            SortOpt::BySubs => "subs",
            SortOpt::ByPending => "pending",
            SortOpt::ByOutMsgs => "msgs_to",
            SortOpt::ByInMsgs => "msgs_from",
            SortOpt::ByOutBytes => "bytes_to",
            SortOpt::ByInBytes => "bytes_from",
            SortOpt::ByLast => "last",
            SortOpt::ByIdle => "idle",
            SortOpt::ByUptime => "uptime",
            SortOpt::ByStop => "stop",
            SortOpt::ByReason => "reason",
        }
    }

    /// Keys that only make sense for closed connections.
    pub const fn closed_only(self) -> bool {
        matches!(self, SortOpt::ByStop | SortOpt::ByReason)
    }

    /// Order applied by this key. Magnitudes (subs, pending, message and
    /// byte counters, last activity, idle time, stop time) sort descending;
    /// idle puts the longest-idle connection first.
    pub const fn direction(self) -> Direction {
        match self {
            SortOpt::ByCid | SortOpt::ByStart | SortOpt::ByUptime | SortOpt::ByReason => {
                Direction::Ascending
            }
            SortOpt::BySubs
            | SortOpt::ByPending
            | SortOpt::ByOutMsgs
            | SortOpt::ByInMsgs
            | SortOpt::ByOutBytes
            | SortOpt::ByInBytes
            | SortOpt::ByLast
            | SortOpt::ByIdle
            | SortOpt::ByStop => Direction::Descending,
        }
    }

    /// Compare two records by this key only, in ascending key order.
    fn compare_key(self, a: &ConnInfo, b: &ConnInfo, now: DateTime<Utc>) -> Ordering {
        match self {
            SortOpt::ByCid => a.cid.cmp(&b.cid),
            SortOpt::ByStart => a.start.cmp(&b.start),
            SortOpt::BySubs => a.num_subs.cmp(&b.num_subs),
            SortOpt::ByPending => a.pending_bytes.cmp(&b.pending_bytes),
            SortOpt::ByOutMsgs => a.out_msgs.cmp(&b.out_msgs),
            SortOpt::ByInMsgs => a.in_msgs.cmp(&b.in_msgs),
            SortOpt::ByOutBytes => a.out_bytes.cmp(&b.out_bytes),
            SortOpt::ByInBytes => a.in_bytes.cmp(&b.in_bytes),
            SortOpt::ByLast => a.last_activity.cmp(&b.last_activity),
            SortOpt::ByIdle => idle_span(a, now).cmp(&idle_span(b, now)),
            SortOpt::ByUptime => uptime_span(a, now).cmp(&uptime_span(b, now)),
            // Open records have no stop time and sort as the oldest.
            SortOpt::ByStop => a.stop.cmp(&b.stop),
            SortOpt::ByReason => a.reason.as_deref().unwrap_or("").cmp(b.reason.as_deref().unwrap_or("")),
        }
    }
}

fn end_of(info: &ConnInfo, now: DateTime<Utc>) -> DateTime<Utc> {
    info.stop.unwrap_or(now)
}

fn idle_span(info: &ConnInfo, now: DateTime<Utc>) -> chrono::Duration {
    end_of(info, now) - info.last_activity
}

fn uptime_span(info: &ConnInfo, now: DateTime<Utc>) -> chrono::Duration {
    end_of(info, now) - info.start
}

impl fmt::Display for SortOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOpt {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOpt::ALL
            .into_iter()
            .find(|opt| opt.as_str() == s)
            .ok_or_else(|| MonitorError::invalid("sort", s, "unknown sort option"))
    }
}

/// Sort `conns` in place by `sort`, measuring open-connection spans at `now`.
pub fn sort_conns(conns: &mut [ConnInfo], sort: SortOpt, now: DateTime<Utc>) {
    let direction = sort.direction();
    conns.sort_by(|a, b| {
        let key = sort.compare_key(a, b, now);
        let key = match direction {
            Direction::Ascending => key,
            Direction::Descending => key.reverse(),
        };
        key.then_with(|| a.cid.cmp(&b.cid))
    });
}
