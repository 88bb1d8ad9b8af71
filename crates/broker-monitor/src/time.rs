// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Duration rendering for report fields.

use std::time::Duration;

const SECS_PER_MIN: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MIN;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_YEAR: u64 = 365 * SECS_PER_DAY;

/// Render an uptime/idle duration with whole-second resolution.
///
/// Leading zero units are dropped, inner ones are kept:
/// `22s`, `4m22s`, `1h0m5s`, `32d4h4m22s`, `2y3d0h0m1s`.
pub fn format_uptime(d: Duration) -> String {
    let total = d.as_secs();
    let years = total / SECS_PER_YEAR;
    let days = total / SECS_PER_DAY;
    let hours = total / SECS_PER_HOUR;
    let mins = total / SECS_PER_MIN;

    if years > 0 {
        format!(
            "{}y{}d{}h{}m{}s",
            years,
            days % 365,
            hours % 24,
            mins % 60,
            total % 60
        )
    } else if days > 0 {
        format!("{}d{}h{}m{}s", days, hours % 24, mins % 60, total % 60)
    } else if hours > 0 {
        format!("{}h{}m{}s", hours, mins % 60, total % 60)
    } else if mins > 0 {
        format!("{}m{}s", mins, total % 60)
    } else {
        format!("{}s", total)
    }
}

/// Parse a string produced by [`format_uptime`].
pub fn parse_uptime(s: &str) -> Option<Duration> {
    if s.is_empty() {
        return None;
    }
    let mut total = 0u64;
    let mut digits = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match ch {
            'y' => SECS_PER_YEAR,
            'd' => SECS_PER_DAY,
            'h' => SECS_PER_HOUR,
            'm' => SECS_PER_MIN,
            's' => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }
    if !digits.is_empty() {
        return None;
    }
    Some(Duration::from_secs(total))
}

/// Render a round-trip time in the most compact unit (`ns`, `µs`, `ms`, `s`).
///
/// Sub-unit precision is kept to three decimals with trailing zeros trimmed.
pub fn format_rtt(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{}µs", trim_decimals(nanos as f64 / 1e3))
    } else if nanos < 1_000_000_000 {
        format!("{}ms", trim_decimals(nanos as f64 / 1e6))
    } else {
        format!("{}s", trim_decimals(nanos as f64 / 1e9))
    }
}

fn trim_decimals(value: f64) -> String {
    let s = format!("{:.3}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Convert a signed chrono span into a std duration, clamping negatives to 0.
pub(crate) fn non_negative(span: chrono::Duration) -> Duration {
    span.to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_millis(22_900)), "22s");
        assert_eq!(format_uptime(Duration::from_secs(4 * 60 + 22)), "4m22s");
        assert_eq!(format_uptime(Duration::from_secs(3605)), "1h0m5s");
        assert_eq!(
            format_uptime(Duration::from_secs(32 * SECS_PER_DAY + 4 * 3600 + 4 * 60 + 22)),
            "32d4h4m22s"
        );
        assert_eq!(
            format_uptime(Duration::from_secs(22 * SECS_PER_YEAR + 32 * SECS_PER_DAY + 22)),
            "22y32d0h0m22s"
        );
    }

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime("0s"), Some(Duration::ZERO));
        assert_eq!(parse_uptime("1h0m5s"), Some(Duration::from_secs(3605)));
        assert_eq!(parse_uptime(""), None);
        assert_eq!(parse_uptime("5"), None);
        assert_eq!(parse_uptime("5x"), None);

        for secs in [0, 59, 61, 3600, 90_061, SECS_PER_YEAR + 1] {
            let d = Duration::from_secs(secs);
            assert_eq!(parse_uptime(&format_uptime(d)), Some(d));
        }
    }

    #[test]
    fn test_format_rtt() {
        assert_eq!(format_rtt(Duration::from_nanos(850)), "850ns");
        assert_eq!(format_rtt(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_rtt(Duration::from_micros(1_250)), "1.25ms");
        assert_eq!(format_rtt(Duration::from_millis(2)), "2ms");
        assert_eq!(format_rtt(Duration::from_millis(1_500)), "1.5s");
    }

    #[test]
    fn test_non_negative_clamps() {
        assert_eq!(non_negative(chrono::Duration::seconds(-5)), Duration::ZERO);
        assert_eq!(
            non_negative(chrono::Duration::seconds(5)),
            Duration::from_secs(5)
        );
    }
}
