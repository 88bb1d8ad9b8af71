// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subject syntax checks and wildcard matching.
//!
//! Subjects are `.`-separated tokens. In a subscription pattern `*` matches
//! exactly one token and a trailing `>` matches one or more tokens. A literal
//! subject (what a publish targets) may contain neither.

use crate::error::{MonitorError, Result};

pub const TOKEN_SEPARATOR: char = '.';
pub const SINGLE_WILDCARD: &str = "*";
pub const FULL_WILDCARD: &str = ">";

/// Check that `subject` is a concrete publish subject.
///
/// Used for the subscriptions report test filter, whose meaning is "would a
/// publish to exactly this subject match".
pub fn validate_literal_subject(subject: &str) -> Result<()> {
    if subject.is_empty() {
        return Err(MonitorError::invalid("test", subject, "empty subject"));
    }
    if subject.chars().any(char::is_whitespace) {
        return Err(MonitorError::invalid(
            "test",
            subject,
            "subject contains whitespace",
        ));
    }
    for token in subject.split(TOKEN_SEPARATOR) {
        if token.is_empty() {
            return Err(MonitorError::invalid("test", subject, "empty token"));
        }
        if token == SINGLE_WILDCARD || token == FULL_WILDCARD {
            return Err(MonitorError::invalid(
                "test",
                subject,
                "wildcards are not allowed in a literal subject",
            ));
        }
    }
    Ok(())
}

/// True when `subject` is a concrete publish subject.
pub fn is_valid_literal_subject(subject: &str) -> bool {
    validate_literal_subject(subject).is_ok()
}

/// True when `subject` is a valid subscription pattern.
///
/// Wildcards must occupy a whole token and `>` may only be the last token.
pub fn is_valid_subject(subject: &str) -> bool {
    if subject.is_empty() || subject.chars().any(char::is_whitespace) {
        return false;
    }
    let mut tokens = subject.split(TOKEN_SEPARATOR).peekable();
    while let Some(token) = tokens.next() {
        if token.is_empty() {
            return false;
        }
        if token == FULL_WILDCARD && tokens.peek().is_some() {
            return false;
        }
    }
    true
}

/// Does subscription `pattern` match the literal subject `literal`?
pub fn matches_literal(pattern: &str, literal: &str) -> bool {
    let mut lit = literal.split(TOKEN_SEPARATOR);
    for token in pattern.split(TOKEN_SEPARATOR) {
        if token == FULL_WILDCARD {
            return lit.next().is_some();
        }
        match lit.next() {
            Some(l) if token == SINGLE_WILDCARD || token == l => {}
            _ => return false,
        }
    }
    lit.next().is_none()
}
