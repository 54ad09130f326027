#![forbid(unsafe_code)]

use std::borrow::Cow;

use serde::Serialize;
use serde_json::json;

use crate::normalize::{self, parse_timestamp, Accessor, Key};
use crate::{sort, Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortValue};

use super::time_or_missing;

const ID: &[Accessor] = &[Key("_id"), Key("id"), Key("transactionId")];
const USER: &[Accessor] = &[Key("user"), Key("username"), Key("email")];
const AMOUNT: &[Accessor] = &[Key("transactionAmount"), Key("balance"), Key("amount")];
const KIND: &[Accessor] = &[Key("type")];
const STATUS: &[Accessor] = &[Key("status")];
const DATE: &[Accessor] = &[Key("date"), Key("createdAt")];
const DETAILS: &[Accessor] = &[Key("name"), Key("details")];

static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Transaction,
    searchable: &["id", "user", "type", "status"],
    filters: &["type", "status"],
    sorts: &[
        sort("newest", "date", true),
        sort("oldest", "date", false),
        sort("amount", "amount", true),
    ],
    default_sort: "newest",
    page_size: 10,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: RecordId,
    pub user: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    /// As delivered; parsed on demand for ordering.
    pub date: String,
    pub details: String,
    #[serde(skip)]
    pub origin: Origin,
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn normalize(raw: &RawRecord) -> Self {
        Transaction {
            id: normalize::text_or(raw, ID, ""),
            user: normalize::text_or(raw, USER, ""),
            amount: normalize::number(raw, AMOUNT).unwrap_or(0.0),
            kind: normalize::text_or(raw, KIND, ""),
            status: normalize::text_or(raw, STATUS, ""),
            date: normalize::text_or(raw, DATE, ""),
            details: normalize::text_or(raw, DETAILS, ""),
            origin: Origin::new(raw),
        }
    }

    fn to_raw(&self) -> RawRecord {
        json!({
            "_id": self.id,
            "user": self.user,
            "amount": self.amount,
            "type": self.kind,
            "status": self.status,
            "date": self.date,
            "details": self.details,
        })
    }

    fn id(&self) -> &str { &self.id }
    fn origin(&self) -> &Origin { &self.origin }
    fn schema() -> &'static EntitySchema { &SCHEMA }

    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let v = match field {
            "id" => &self.id,
            "user" => &self.user,
            "type" => &self.kind,
            "status" => &self.status,
            "date" => &self.date,
            "details" => &self.details,
            _ => return None,
        };
        Some(Cow::Borrowed(v.as_str()))
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "date" => time_or_missing(parse_timestamp(&self.date)),
            "amount" => SortValue::Num(self.amount),
            _ => SortValue::Missing,
        }
    }
}
