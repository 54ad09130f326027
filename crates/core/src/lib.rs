//! Roster core types: raw records, canonical entities and their schemas.

#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod dashboard;
pub mod entities;
pub mod format;
pub mod normalize;

pub use dashboard::{Dashboard, DashboardSummary, GrowthPoint, PlanRevenue};
pub use entities::{Download, DownloadStatus, Message, Post, Report, Ticket, TicketStatus, Transaction, User};

/// Loosely shaped input record as delivered by a data source.
pub type RawRecord = serde_json::Value;

/// Identifier of a canonical record. Never empty once inside a collection.
pub type RecordId = String;

/// Back-reference to the raw input a canonical record was built from.
///
/// Kept for fields that were not promoted to canonical status. It never takes
/// part in equality: two records with the same canonical fields compare equal
/// regardless of where they came from.
#[derive(Clone, Default)]
pub struct Origin(Arc<RawRecord>);

impl Origin {
    pub fn new(raw: &RawRecord) -> Self { Self(Arc::new(raw.clone())) }
    pub fn raw(&self) -> &RawRecord { &self.0 }
    /// Look up a non-promoted field on the original input.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> { self.0.get(key) }
}

impl PartialEq for Origin {
    fn eq(&self, _other: &Self) -> bool { true }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Origin({})", self.0) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Transaction,
    Report,
    Ticket,
    Post,
    Download,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Transaction,
        EntityKind::Report,
        EntityKind::Ticket,
        EntityKind::Post,
        EntityKind::Download,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Transaction => "transaction",
            EntityKind::Report => "report",
            EntityKind::Ticket => "ticket",
            EntityKind::Post => "post",
            EntityKind::Download => "download",
        }
    }

    /// Query-string key used when mirroring a selected id of this kind.
    pub fn selection_key(&self) -> &'static str { self.as_str() }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let k = s.trim().to_ascii_lowercase();
        let k = k.strip_suffix('s').unwrap_or(&k);
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == k)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Value a record exposes for ordering. Missing orders below everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Missing,
    Num(f64),
    Time(i64),
    Text(String),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Num(_) => 1,
            SortValue::Time(_) => 2,
            SortValue::Text(_) => 3,
        }
    }

    /// Total order used by the view pipeline; text compares case-insensitively.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Num(a), SortValue::Num(b)) => a.total_cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// A named ordering offered by an entity (e.g. `newest` = joined date, descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub field: &'static str,
    pub descending: bool,
}

pub const fn sort(key: &'static str, field: &'static str, descending: bool) -> SortSpec {
    SortSpec { key, field, descending }
}

/// Per-entity configuration consumed by the view pipeline.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Fields matched by free-text search (OR semantics).
    pub searchable: &'static [&'static str],
    /// Fields that accept an equality filter.
    pub filters: &'static [&'static str],
    pub sorts: &'static [SortSpec],
    pub default_sort: &'static str,
    pub page_size: usize,
}

impl EntitySchema {
    pub fn sort_spec(&self, key: &str) -> Option<&SortSpec> { self.sorts.iter().find(|s| s.key == key) }
}

/// A canonical record type produced by normalization.
pub trait Entity: Clone + fmt::Debug + PartialEq + Serialize + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Total, pure normalization. Missing or malformed fields fall back to defaults.
    fn normalize(raw: &RawRecord) -> Self;

    /// Canonical record coerced back to raw shape under its primary field names.
    fn to_raw(&self) -> RawRecord;

    fn id(&self) -> &str;

    fn origin(&self) -> &Origin;

    fn schema() -> &'static EntitySchema;

    /// Text of a searchable or filterable field, `None` when the entity has no such field.
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>>;

    fn sort_value(&self, field: &str) -> SortValue;
}

pub mod prelude {
    pub use super::{Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortSpec, SortValue};
    pub use super::entities::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_singular_and_plural() {
        assert_eq!("users".parse::<EntityKind>().unwrap(), EntityKind::User);
        assert_eq!("Ticket".parse::<EntityKind>().unwrap(), EntityKind::Ticket);
        assert!("widgets".parse::<EntityKind>().is_err());
    }

    #[test]
    fn missing_sorts_first() {
        assert_eq!(SortValue::Missing.total_cmp(&SortValue::Time(0)), Ordering::Less);
        assert_eq!(SortValue::Num(2.0).total_cmp(&SortValue::Num(10.0)), Ordering::Less);
        assert_eq!(SortValue::Text("b".into()).total_cmp(&SortValue::Text("A".into())), Ordering::Greater);
    }

    #[test]
    fn origin_never_affects_equality() {
        let a = Origin::new(&serde_json::json!({"x": 1}));
        let b = Origin::new(&serde_json::json!({"y": 2}));
        assert_eq!(a, b);
        assert_eq!(a.get("x"), Some(&serde_json::json!(1)));
    }
}
