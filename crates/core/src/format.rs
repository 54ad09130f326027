//! Display and export helpers. Pure string functions, no locale support.

#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::normalize::parse_timestamp;
use crate::Entity;

const ELLIPSIS: &str = "...";

/// `abcdef...wxyz`. Strings that would not get shorter are returned as is.
pub fn truncate_middle(s: &str, head: usize, tail: usize) -> String {
    let n = s.chars().count();
    if n <= head + tail + ELLIPSIS.len() {
        return s.to_string();
    }
    let start: String = s.chars().take(head).collect();
    let end: String = s.chars().skip(n - tail).collect();
    format!("{start}{ELLIPSIS}{end}")
}

pub fn truncate_right(s: &str, len: usize) -> String {
    if s.chars().count() <= len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(len).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn short_id(id: &str) -> String { truncate_middle(id, 6, 4) }

fn group_thousands(int_part: u64) -> String {
    let digits = int_part.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Grouped number with at most `max_frac` decimals, trailing zeros dropped.
pub fn format_number(n: f64, max_frac: usize) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", max_frac, n.abs());
    let (int_s, frac_s) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_s = frac_s.trim_end_matches('0');
    let int_part = int_s.parse::<u64>().unwrap_or(0);
    let mut out = String::new();
    if n < 0.0 && (int_part > 0 || !frac_s.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_s.is_empty() {
        out.push('.');
        out.push_str(frac_s);
    }
    out
}

/// `$1,234.50`, always two decimals.
pub fn format_currency(n: f64) -> String {
    let n = if n.is_finite() { n } else { 0.0 };
    let cents = (n.abs() * 100.0).round() as u64;
    let sign = if n < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// `$1,234.5`: like [`format_currency`] but without padding decimals.
pub fn format_balance(n: f64) -> String {
    let s = format_number(n, 2);
    match s.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${s}"),
    }
}

/// `2024-11-05 14:03:00` (UTC). Unparseable input is shown verbatim.
pub fn format_date(s: &str) -> String {
    match parse_timestamp(s) {
        Some(ms) => format_millis(ms).unwrap_or_else(|| s.to_string()),
        None => s.to_string(),
    }
}

pub fn format_millis(ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(ms).single().map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Render a canonical record for the clipboard.
///
/// `Text` gives one `field: value` line per canonical field in declaration
/// order; `Json` is pretty-printed.
pub fn export<E: Entity>(record: &E, fmt: ExportFormat) -> serde_json::Result<String> {
    let value = serde_json::to_value(record)?;
    match fmt {
        ExportFormat::Json => serde_json::to_string_pretty(&value),
        ExportFormat::Text => Ok(export_text(&value)),
    }
}

/// Export several records, separated by a blank line (text) or as one array (JSON).
pub fn export_all<E: Entity>(records: &[E], fmt: ExportFormat) -> serde_json::Result<String> {
    match fmt {
        ExportFormat::Json => serde_json::to_string_pretty(records),
        ExportFormat::Text => {
            let parts = records.iter().map(|r| export(r, fmt)).collect::<serde_json::Result<Vec<_>>>()?;
            Ok(parts.join("\n"))
        }
    }
}

fn export_text(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let _ = writeln!(out, "{k}: {}", scalar_text(v));
            }
        }
        other => {
            let _ = writeln!(out, "{}", scalar_text(other));
        }
    }
    out
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", ")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::User;
    use serde_json::json;

    #[test]
    fn truncation() {
        assert_eq!(truncate_middle("0123456789abcdef", 6, 4), "012345...cdef");
        assert_eq!(truncate_middle("short", 6, 4), "short");
        assert_eq!(truncate_middle("0123456789abc", 6, 4), "0123456789abc");
        assert_eq!(truncate_right("jane.doe@example.com", 12), "jane.doe@exa...");
        assert_eq!(truncate_right("", 12), "");
    }

    #[test]
    fn money() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(-0.004), "$0.00");
        assert_eq!(format_currency(-1000000.0), "-$1,000,000.00");
        assert_eq!(format_balance(1234.5), "$1,234.5");
        assert_eq!(format_balance(12.0), "$12");
        assert_eq!(format_number(15000.0, 3), "15,000");
    }

    #[test]
    fn dates() {
        assert_eq!(format_date("2024-11-05"), "2024-11-05 00:00:00");
        assert_eq!(format_date("2024-11-05T14:03:00Z"), "2024-11-05 14:03:00");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn export_text_and_json() {
        let u = User::normalize(&json!({"userId": "u1", "username": "jane_smith", "balance": 10}));
        let text = export(&u, ExportFormat::Text).unwrap();
        assert!(text.starts_with("id: u1\n"));
        assert!(text.contains("username: jane_smith\n"));
        let js: Value = serde_json::from_str(&export(&u, ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(js["balance"], json!(10.0));
        assert!(js.get("origin").is_none());
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
    }
}
