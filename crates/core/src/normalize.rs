//! Declarative field extraction for loosely shaped records.
//!
//! Every canonical field is described by an ordered list of [`Accessor`]s.
//! Accessors are evaluated left to right and the first one yielding a
//! non-empty, coercible value wins; callers then substitute the field's zero
//! value. Nothing in here can fail.

#![forbid(unsafe_code)]

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use crate::RawRecord;

/// One way of locating a field on a raw record.
#[derive(Clone, Copy)]
pub enum Accessor {
    /// Top-level key.
    Key(&'static str),
    /// JSON pointer into nested objects, e.g. `/user/email`.
    Pointer(&'static str),
    /// Value computed from the whole record.
    Derive(fn(&RawRecord) -> Option<Value>),
}

impl Accessor {
    fn get<'a>(&self, raw: &'a RawRecord) -> Option<Cow<'a, Value>> {
        let v = match self {
            Accessor::Key(k) => raw.get(*k).map(Cow::Borrowed),
            Accessor::Pointer(p) => raw.pointer(p).map(Cow::Borrowed),
            Accessor::Derive(f) => f(raw).map(Cow::Owned),
        };
        v.filter(|v| !v.is_null())
    }

    fn label(&self) -> &'static str {
        match self {
            Accessor::Key(k) | Accessor::Pointer(k) => *k,
            Accessor::Derive(_) => "<derived>",
        }
    }
}

pub use Accessor::{Derive, Key, Pointer};

fn first<T>(raw: &RawRecord, rules: &[Accessor], coerce: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let found = rules.iter().find_map(|r| r.get(raw).and_then(|v| coerce(v.as_ref())));
    if found.is_none() {
        let tried: Vec<&str> = rules.iter().map(|r| r.label()).collect();
        trace!(?tried, "normalize: no alias matched; using default");
        metrics::counter!("normalize_default_total", 1u64);
    }
    found
}

/// String coercion: non-empty strings and numbers (ids are sometimes numeric).
pub fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric coercion: finite JSON numbers and numeric strings.
pub fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

const FALSY_WORDS: &[&str] = &["", "false", "no", "0", "unverified", "pending", "rejected", "none"];

/// Truthiness coercion for flags that arrive as booleans, numbers or status words.
pub fn as_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => Some(!FALSY_WORDS.contains(&s.trim().to_ascii_lowercase().as_str())),
        Value::Array(_) | Value::Object(_) => Some(true),
    }
}

pub fn text(raw: &RawRecord, rules: &[Accessor]) -> Option<String> { first(raw, rules, as_text) }

pub fn text_or(raw: &RawRecord, rules: &[Accessor], default: &str) -> String {
    text(raw, rules).unwrap_or_else(|| default.to_string())
}

/// Like [`text`], but each candidate may also be an object carrying the name
/// under one of `object_keys` (see [`NameOrObject`]).
pub fn named(raw: &RawRecord, rules: &[Accessor], object_keys: &[&str], unnamed: &str) -> Option<String> {
    first(raw, rules, |v| NameOrObject::of(Some(v)).resolve(object_keys, unnamed))
}

pub fn number(raw: &RawRecord, rules: &[Accessor]) -> Option<f64> { first(raw, rules, as_number) }

/// Non-negative whole count; fractional input is truncated, negatives become 0.
pub fn count(raw: &RawRecord, rules: &[Accessor]) -> u64 { first(raw, rules, as_count).unwrap_or(0) }

/// Integers are taken exactly; anything else goes through [`as_number`].
pub fn as_count(v: &Value) -> Option<u64> {
    let exact = match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    exact.or_else(|| as_number(v).map(|n| n.max(0.0) as u64))
}

pub fn flag(raw: &RawRecord, rules: &[Accessor]) -> bool { first(raw, rules, as_flag).unwrap_or(false) }

pub fn list(raw: &RawRecord, rules: &[Accessor]) -> Vec<Value> {
    first(raw, rules, |v| v.as_array().cloned()).unwrap_or_default()
}

pub fn timestamp(raw: &RawRecord, rules: &[Accessor]) -> Option<i64> { first(raw, rules, as_timestamp) }

/// Epoch milliseconds from RFC 3339 strings, `YYYY-MM-DD` dates, or numbers.
/// Instants outside the representable calendar range are rejected.
pub fn as_timestamp(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .filter(|ms| representable(*ms)),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

fn representable(ms: i64) -> bool { Utc.timestamp_millis_opt(ms).single().is_some() }

pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt).timestamp_millis());
    }
    s.parse::<i64>().ok().filter(|ms| representable(*ms))
}

/// RFC 3339 rendering with millisecond precision; round-trips through [`parse_timestamp`].
pub fn render_timestamp(ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(ms).single().map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn now_ms() -> i64 { Utc::now().timestamp_millis() }

/// A field that arrives either as a bare name or as an object carrying one.
///
/// Resolved once at normalization time so nothing downstream has to sniff
/// the shape again.
#[derive(Debug, Clone, PartialEq)]
pub enum NameOrObject<'a> {
    Absent,
    Name(Cow<'a, str>),
    Object(&'a Map<String, Value>),
    Other,
}

impl<'a> NameOrObject<'a> {
    pub fn of(v: Option<&'a Value>) -> Self {
        match v {
            None | Some(Value::Null) => NameOrObject::Absent,
            Some(Value::String(s)) if s.is_empty() => NameOrObject::Absent,
            Some(Value::String(s)) => NameOrObject::Name(Cow::Borrowed(s)),
            Some(Value::Number(n)) => NameOrObject::Name(Cow::Owned(n.to_string())),
            Some(Value::Object(m)) => NameOrObject::Object(m),
            Some(_) => NameOrObject::Other,
        }
    }

    /// Resolve to a display name. Objects try `keys` in order and fall back to
    /// `unnamed`; absent or unusable shapes give `None`.
    pub fn resolve(&self, keys: &[&str], unnamed: &str) -> Option<String> {
        match self {
            NameOrObject::Absent | NameOrObject::Other => None,
            NameOrObject::Name(s) => Some(s.to_string()),
            NameOrObject::Object(m) => Some(
                keys.iter()
                    .find_map(|k| m.get(*k).and_then(as_text))
                    .unwrap_or_else(|| unnamed.to_string()),
            ),
        }
    }
}

/// Media attachments arrive as URL strings or as objects with a `url`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaRef {
    Url(String),
    Object { url: Option<String> },
}

impl MediaRef {
    pub fn of(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) if !s.is_empty() => Some(MediaRef::Url(s.clone())),
            Value::Object(m) => Some(MediaRef::Object { url: m.get("url").and_then(as_text) }),
            _ => None,
        }
    }

    pub fn url(self) -> Option<String> {
        match self {
            MediaRef::Url(u) => Some(u),
            MediaRef::Object { url } => url,
        }
    }
}

pub fn media_urls(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(MediaRef::of).filter_map(MediaRef::url).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &[Accessor] = &[Key("userId"), Key("_id"), Key("id")];

    #[test]
    fn first_non_empty_alias_wins() {
        assert_eq!(text(&json!({"_id": "b", "id": "c"}), ID).as_deref(), Some("b"));
        assert_eq!(text(&json!({"userId": "", "id": "c"}), ID).as_deref(), Some("c"));
        assert_eq!(text(&json!({"userId": null, "id": 7}), ID).as_deref(), Some("7"));
        assert_eq!(text(&json!({}), ID), None);
        assert_eq!(text(&json!("not an object"), ID), None);
    }

    #[test]
    fn pointer_and_derive_rules() {
        fn shout(raw: &RawRecord) -> Option<Value> {
            raw.get("name").and_then(|v| v.as_str()).map(|s| Value::String(s.to_uppercase()))
        }
        let rules = [Pointer("/user/email"), Derive(shout)];
        assert_eq!(text(&json!({"user": {"email": "a@x"}}), &rules).as_deref(), Some("a@x"));
        assert_eq!(text(&json!({"name": "bob"}), &rules).as_deref(), Some("BOB"));
    }

    #[test]
    fn numbers_accept_numeric_strings_only() {
        assert_eq!(as_number(&json!("12.5")), Some(12.5));
        assert_eq!(as_number(&json!("NaN")), None);
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(count(&json!({"n": -4}), &[Key("n")]), 0);
    }

    #[test]
    fn counts_keep_large_integers_exact() {
        let big = 9_007_199_254_740_993u64;
        assert_eq!(as_count(&json!(big)), Some(big));
        assert_eq!(as_count(&json!("12")), Some(12));
        assert_eq!(as_count(&json!(3.9)), Some(3));
        assert_eq!(as_count(&json!(-2)), Some(0));
        assert_eq!(as_count(&json!("x")), None);
    }

    #[test]
    fn out_of_range_instants_are_rejected() {
        assert_eq!(as_timestamp(&json!(9_000_000_000_000_000i64)), None);
        assert_eq!(as_timestamp(&json!(1e300)), None);
        assert_eq!(parse_timestamp("9000000000000000"), None);
        assert_eq!(as_timestamp(&json!(1_700_000_000_000i64)), Some(1_700_000_000_000));
    }

    #[test]
    fn flags_follow_truthiness() {
        assert_eq!(as_flag(&json!(true)), Some(true));
        assert_eq!(as_flag(&json!(0)), Some(false));
        assert_eq!(as_flag(&json!("verified")), Some(true));
        assert_eq!(as_flag(&json!("pending")), Some(false));
        assert_eq!(as_flag(&json!(null)), None);
    }

    #[test]
    fn timestamps_round_trip() {
        let ms = parse_timestamp("2024-11-01").unwrap();
        assert_eq!(parse_timestamp(&render_timestamp(ms).unwrap()), Some(ms));
        let ms2 = parse_timestamp("2024-11-01T10:20:30.123Z").unwrap();
        assert_eq!(ms2 - ms, ((10 * 60 + 20) * 60 + 30) * 1000 + 123);
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn name_or_object_resolution() {
        let keys = ["planName", "name"];
        assert_eq!(NameOrObject::of(Some(&json!("Premium"))).resolve(&keys, "x").as_deref(), Some("Premium"));
        assert_eq!(NameOrObject::of(Some(&json!({"name": "VIP"}))).resolve(&keys, "x").as_deref(), Some("VIP"));
        assert_eq!(NameOrObject::of(Some(&json!({}))).resolve(&keys, "x").as_deref(), Some("x"));
        assert_eq!(NameOrObject::of(Some(&json!([1]))).resolve(&keys, "x"), None);
        assert_eq!(NameOrObject::of(None).resolve(&keys, "x"), None);
    }

    #[test]
    fn media_accepts_both_shapes() {
        let items = vec![json!("a.png"), json!({"url": "b.png"}), json!({"alt": "x"}), json!(5)];
        assert_eq!(media_urls(&items), vec!["a.png".to_string(), "b.png".to_string()]);
    }
}
