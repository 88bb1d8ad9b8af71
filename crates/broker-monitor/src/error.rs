// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for snapshot requests.

use crate::monitor::ConnState;
use crate::sort::SortOpt;
use thiserror::Error;

/// Errors returned by snapshot operations.
///
/// `InvalidParameter` and `IncompatibleScope` are raised before any shared
/// state is touched and map to a client error at the HTTP boundary.
/// `NotFound` only comes from exact single-connection lookups; list queries
/// report a miss as an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("invalid value {value:?} for parameter {name:?}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("sort option {sort:?} is only valid for closed connections, requested state is {state:?}")]
    IncompatibleScope { sort: SortOpt, state: ConnState },

    #[error("{0} not found")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    pub(crate) fn invalid(
        name: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// True when the caller sent a bad request (as opposed to a server fault).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::IncompatibleScope { .. }
        )
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
