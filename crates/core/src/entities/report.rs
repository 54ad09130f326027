#![forbid(unsafe_code)]

use std::borrow::Cow;

use serde::Serialize;
use serde_json::json;

use crate::normalize::{self, parse_timestamp, Accessor, Key};
use crate::{sort, Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortValue};

use super::time_or_missing;

const ID: &[Accessor] = &[Key("id"), Key("date")];
const DATE: &[Accessor] = &[Key("date")];
const USERS: &[Accessor] = &[Key("users")];
const DEPOSITS: &[Accessor] = &[Key("deposits")];
const WITHDRAWALS: &[Accessor] = &[Key("withdrawals")];
const POSTS: &[Accessor] = &[Key("posts")];
const AFFILIATE: &[Accessor] = &[Key("affiliateBonuses")];

/// Drillable metrics of a daily report row, in display order.
pub const REPORT_METRICS: [&str; 5] = ["users", "deposits", "withdrawals", "posts", "affiliateBonuses"];

/// Which entity kind backs a metric's drill-down list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailSource {
    pub metric: &'static str,
    pub kind: EntityKind,
}

static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Report,
    searchable: &["date"],
    filters: &[],
    sorts: &[
        sort("newest", "date", true),
        sort("oldest", "date", false),
        sort("deposits", "deposits", true),
    ],
    default_sort: "newest",
    page_size: 10,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: RecordId,
    pub date: String,
    pub users: u64,
    pub deposits: f64,
    pub withdrawals: f64,
    pub posts: u64,
    pub affiliate_bonuses: f64,
    #[serde(skip)]
    pub origin: Origin,
}

impl Report {
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "users" => Some(self.users as f64),
            "deposits" => Some(self.deposits),
            "withdrawals" => Some(self.withdrawals),
            "posts" => Some(self.posts as f64),
            "affiliateBonuses" => Some(self.affiliate_bonuses),
            _ => None,
        }
    }

    /// A metric with no activity has nothing to drill into.
    pub fn is_drillable(&self, name: &str) -> bool { self.metric(name).map(|v| v > 0.0).unwrap_or(false) }

    pub fn detail_source(name: &str) -> Option<DetailSource> {
        let (metric, kind) = match name {
            "users" => ("users", EntityKind::User),
            "deposits" => ("deposits", EntityKind::Transaction),
            "withdrawals" => ("withdrawals", EntityKind::Transaction),
            "affiliateBonuses" => ("affiliateBonuses", EntityKind::Transaction),
            "posts" => ("posts", EntityKind::Post),
            _ => return None,
        };
        Some(DetailSource { metric, kind })
    }
}

impl Entity for Report {
    const KIND: EntityKind = EntityKind::Report;

    fn normalize(raw: &RawRecord) -> Self {
        Report {
            id: normalize::text_or(raw, ID, ""),
            date: normalize::text_or(raw, DATE, ""),
            users: normalize::count(raw, USERS),
            deposits: normalize::number(raw, DEPOSITS).unwrap_or(0.0),
            withdrawals: normalize::number(raw, WITHDRAWALS).unwrap_or(0.0),
            posts: normalize::count(raw, POSTS),
            affiliate_bonuses: normalize::number(raw, AFFILIATE).unwrap_or(0.0),
            origin: Origin::new(raw),
        }
    }

    fn to_raw(&self) -> RawRecord {
        json!({
            "id": self.id,
            "date": self.date,
            "users": self.users,
            "deposits": self.deposits,
            "withdrawals": self.withdrawals,
            "posts": self.posts,
            "affiliateBonuses": self.affiliate_bonuses,
        })
    }

    fn id(&self) -> &str { &self.id }
    fn origin(&self) -> &Origin { &self.origin }
    fn schema() -> &'static EntitySchema { &SCHEMA }

    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "date" => Some(Cow::Borrowed(self.date.as_str())),
            m => self.metric(m).map(|v| Cow::Owned(v.to_string())),
        }
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "date" => time_or_missing(parse_timestamp(&self.date)),
            m => self.metric(m).map(SortValue::Num).unwrap_or(SortValue::Missing),
        }
    }
}
