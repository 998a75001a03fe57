//! Shared formatting helpers for widgets and renderers.
//!
//! All pure formatting functions (no colors, no layout) live here.
//! Functions that differ between compact cells and verbose expanded views
//! are parameterized via [`FmtStyle`].

use chrono::{DateTime, Utc};

/// Controls compact (gauges, table cells) vs verbose (expanded views) output.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FmtStyle {
    /// Compact: no spaces, short suffixes ("1.5G", "3m5s")
    Compact,
    /// Detail: spaces, full suffixes ("1.5 GiB", "3m 5s")
    Detail,
}

// ---------------------------------------------------------------------------
// Style-parameterized functions
// ---------------------------------------------------------------------------

/// Format byte count as human-readable size.
///
/// Compact: `"1.5G"`, `"100.3M"`, `"50.0K"`, `"512B"`
/// Detail:  `"1.5 GiB"`, `"100.3 MiB"`, `"50.0 KiB"`, `"512 B"`
pub fn format_bytes(bytes: u64, style: FmtStyle) -> String {
    let (t, g, m, k, b) = match style {
        FmtStyle::Compact => ("T", "G", "M", "K", "B"),
        FmtStyle::Detail => (" TiB", " GiB", " MiB", " KiB", " B"),
    };
    let f = bytes as f64;
    if bytes >= 1 << 40 {
        format!("{:.1}{}", f / (1u64 << 40) as f64, t)
    } else if bytes >= 1 << 30 {
        format!("{:.1}{}", f / (1u64 << 30) as f64, g)
    } else if bytes >= 1 << 20 {
        format!("{:.1}{}", f / (1u64 << 20) as f64, m)
    } else if bytes >= 1 << 10 {
        format!("{:.1}{}", f / 1024.0, k)
    } else {
        format!("{}{}", bytes, b)
    }
}

/// Format bytes-per-second rate as human-readable.
///
/// Compact: `"1.5G/s"`, `"100.3M/s"`
/// Detail:  `"1.5 GiB/s"`, `"100.3 MiB/s"`
pub fn format_bytes_rate(rate: f64, style: FmtStyle) -> String {
    if rate < 1.0 {
        return "0".to_string();
    }
    let (g, m, k, b) = match style {
        FmtStyle::Compact => ("G/s", "M/s", "K/s", "B/s"),
        FmtStyle::Detail => (" GiB/s", " MiB/s", " KiB/s", " B/s"),
    };
    if rate >= 1024.0 * 1024.0 * 1024.0 {
        format!("{:.1}{}", rate / (1024.0 * 1024.0 * 1024.0), g)
    } else if rate >= 1024.0 * 1024.0 {
        format!("{:.1}{}", rate / (1024.0 * 1024.0), m)
    } else if rate >= 1024.0 {
        format!("{:.1}{}", rate / 1024.0, k)
    } else {
        format!("{:.0}{}", rate, b)
    }
}

/// Format duration in seconds as human-readable.
///
/// Compact: `"3m5s"` (no spaces, `"-"` for negative)
/// Detail:  `"3m 5s"` (with spaces, `"0s"` for `<= 0`)
pub fn format_duration(secs: i64, style: FmtStyle) -> String {
    match style {
        FmtStyle::Compact => {
            if secs < 0 {
                return "-".to_string();
            }
            if secs < 60 {
                format!("{}s", secs)
            } else if secs < 3600 {
                let s = secs % 60;
                if s == 0 {
                    format!("{}m", secs / 60)
                } else {
                    format!("{}m{}s", secs / 60, s)
                }
            } else if secs < 86400 {
                format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
            } else {
                format!("{}d{}h", secs / 86400, (secs % 86400) / 3600)
            }
        }
        FmtStyle::Detail => {
            if secs <= 0 {
                return "0s".to_string();
            }
            if secs < 60 {
                format!("{}s", secs)
            } else if secs < 3600 {
                format!("{}m {}s", secs / 60, secs % 60)
            } else if secs < 86400 {
                format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
            } else {
                format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Style-independent functions
// ---------------------------------------------------------------------------

/// SI-formats a value with K/M/G/T suffixes: `"950"`, `"1.5K"`, `"12.0M"`, `"250G"`.
///
/// Values below 10 keep one decimal, so small axis labels stay distinct.
pub fn format_si(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if abs >= 1e12 {
        (abs / 1e12, "T")
    } else if abs >= 1e9 {
        (abs / 1e9, "G")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    if scaled >= 100.0 || (suffix.is_empty() && scaled >= 10.0) {
        format!("{sign}{scaled:.0}{suffix}")
    } else if scaled == scaled.trunc() && suffix.is_empty() {
        format!("{sign}{scaled:.0}")
    } else {
        format!("{sign}{scaled:.1}{suffix}")
    }
}

/// Format a percentage without decimals: `"73%"`.
pub fn format_pct(pct: f64) -> String {
    if !pct.is_finite() {
        return "-".to_string();
    }
    format!("{:.0}%", pct)
}

/// Format a monetary amount with a currency prefix: `"$12.34"`, `"€1.2K"`.
pub fn format_money(amount: f64, currency: &str) -> String {
    let symbol = match currency.to_ascii_uppercase().as_str() {
        "USD" | "" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        _ => "",
    };
    let body = if amount.abs() >= 10_000.0 {
        format_si(amount)
    } else {
        format!("{:.2}", amount)
    };
    if symbol.is_empty() {
        format!("{body} {currency}")
    } else {
        format!("{symbol}{body}")
    }
}

/// Format a count of tokens or events: `"950"`, `"12.3K"`, `"4.1M"`.
pub fn format_count(n: u64) -> String {
    format_si(n as f64)
}

/// Format a timestamp as compact age relative to `now`: `"3s"`, `"5m"`, `"2h"`, `"7d"`.
/// Future timestamps and `None` render as `"-"`.
pub fn format_age(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = ts else {
        return "-".to_string();
    };
    let age = (now - ts).num_seconds();
    if age < 0 {
        return "-".to_string();
    }
    if age < 60 {
        format!("{}s", age)
    } else if age < 3600 {
        format!("{}m", age / 60)
    } else if age < 86400 {
        format!("{}h", age / 3600)
    } else {
        format!("{}d", age / 86400)
    }
}

/// Format time remaining until `ts` relative to `now`: `"in 2h13m"`, `"now"`.
pub fn format_until(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = ts else {
        return "-".to_string();
    };
    let secs = (ts - now).num_seconds();
    if secs <= 0 {
        "now".to_string()
    } else {
        format!("in {}", format_duration(secs, FmtStyle::Compact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bytes_both_styles() {
        assert_eq!(format_bytes(512, FmtStyle::Compact), "512B");
        assert_eq!(format_bytes(1536, FmtStyle::Compact), "1.5K");
        assert_eq!(format_bytes(3 << 30, FmtStyle::Detail), "3.0 GiB");
        assert_eq!(format_bytes(2 << 40, FmtStyle::Compact), "2.0T");
    }

    #[test]
    fn si_suffixes() {
        assert_eq!(format_si(0.0), "0");
        assert_eq!(format_si(0.5), "0.5");
        assert_eq!(format_si(42.0), "42");
        assert_eq!(format_si(1500.0), "1.5K");
        assert_eq!(format_si(12_000_000.0), "12.0M");
        assert_eq!(format_si(250e9), "250G");
        assert_eq!(format_si(-2500.0), "-2.5K");
        assert_eq!(format_si(3.2e12), "3.2T");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59, FmtStyle::Compact), "59s");
        assert_eq!(format_duration(300, FmtStyle::Compact), "5m");
        assert_eq!(format_duration(150, FmtStyle::Compact), "2m30s");
        assert_eq!(format_duration(7260, FmtStyle::Detail), "2h 1m");
        assert_eq!(format_duration(-1, FmtStyle::Detail), "0s");
    }

    #[test]
    fn money() {
        assert_eq!(format_money(12.5, "USD"), "$12.50");
        assert_eq!(format_money(25_000.0, "EUR"), "€25.0K");
        assert_eq!(format_money(3.0, "CHF"), "3.00 CHF");
    }

    #[test]
    fn ages() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let five_min = Utc.with_ymd_and_hms(2026, 1, 1, 11, 55, 0).unwrap();
        assert_eq!(format_age(Some(five_min), now), "5m");
        assert_eq!(format_age(None, now), "-");
        assert_eq!(format_until(Some(five_min), now), "now");
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 14, 13, 0).unwrap();
        assert_eq!(format_until(Some(later), now), "in 2h13m");
    }
}
