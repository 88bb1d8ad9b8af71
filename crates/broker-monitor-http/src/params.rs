// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Query-string parsing into report options.
//!
//! Unparsable values are request errors. Numeric values that merely fall out
//! of range are passed through and clamped by the report builders.

use broker_monitor::{
    ConnState, ConnzOptions, GatewayzOptions, MonitorError, RoutezOptions, SortOpt,
    SubszOptions,
};
use std::collections::HashMap;

pub type Params = HashMap<String, String>;

fn value<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

/// Boolean in any of the spellings `1 t T true TRUE True 0 f F false FALSE False`.
pub fn parse_bool(name: &'static str, raw: &str) -> Result<bool, MonitorError> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(MonitorError::InvalidParameter {
            name,
            value: raw.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

fn bool_param(params: &Params, name: &'static str) -> Result<bool, MonitorError> {
    value(params, name).map_or(Ok(false), |raw| parse_bool(name, raw))
}

fn int_param(params: &Params, name: &'static str) -> Result<i64, MonitorError> {
    value(params, name).map_or(Ok(0), |raw| {
        raw.parse().map_err(|_| MonitorError::InvalidParameter {
            name,
            value: raw.to_string(),
            reason: "expected an integer".into(),
        })
    })
}

fn cid_param(params: &Params) -> Result<u64, MonitorError> {
    value(params, "cid").map_or(Ok(0), |raw| {
        raw.parse().map_err(|_| MonitorError::InvalidParameter {
            name: "cid",
            value: raw.to_string(),
            reason: "expected a connection id".into(),
        })
    })
}

/// JSONP callback name, when one was given.
pub fn callback(params: &Params) -> Result<Option<&str>, MonitorError> {
    let Some(cb) = value(params, "callback") else {
        return Ok(None);
    };
    let valid = cb
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if valid {
        Ok(Some(cb))
    } else {
        Err(MonitorError::InvalidParameter {
            name: "callback",
            value: cb.to_string(),
            reason: "not a valid javascript identifier".into(),
        })
    }
}

pub fn connz_options(params: &Params) -> Result<ConnzOptions, MonitorError> {
    Ok(ConnzOptions {
        sort: value(params, "sort").map_or(Ok(SortOpt::default()), str::parse)?,
        auth: bool_param(params, "auth")?,
        subscriptions: bool_param(params, "subs")?,
        offset: int_param(params, "offset")?,
        limit: int_param(params, "limit")?,
        cid: cid_param(params)?,
        state: value(params, "state").map_or(Ok(ConnState::default()), str::parse)?,
    })
}

pub fn routez_options(params: &Params) -> Result<RoutezOptions, MonitorError> {
    Ok(RoutezOptions {
        subscriptions: bool_param(params, "subs")?,
    })
}

pub fn subsz_options(params: &Params) -> Result<SubszOptions, MonitorError> {
    Ok(SubszOptions {
        subscriptions: bool_param(params, "subs")?,
        offset: int_param(params, "offset")?,
        limit: int_param(params, "limit")?,
        test: value(params, "test").unwrap_or_default().to_string(),
    })
}

pub fn gatewayz_options(params: &Params) -> Result<GatewayzOptions, MonitorError> {
    Ok(GatewayzOptions {
        name: value(params, "gw_name").unwrap_or_default().to_string(),
        accounts: bool_param(params, "accs")?,
        account_name: value(params, "acc_name").unwrap_or_default().to_string(),
        accounts_limit: int_param(params, "accs_limit")?,
    })
}
