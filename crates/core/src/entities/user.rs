#![forbid(unsafe_code)]

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{json, Value};

use crate::normalize::{self, render_timestamp, Accessor, Derive, Key};
use crate::{sort, Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortValue};

use super::{text_or_missing, time_or_missing};

pub const DEFAULT_PLAN: &str = "Free";
pub const SUSPENDED_PLAN: &str = "Suspended";

const ID: &[Accessor] = &[Key("userId"), Key("_id"), Key("id")];
const USERNAME: &[Accessor] = &[Key("username"), Derive(email_local_part)];
const FULL_NAME: &[Accessor] = &[Key("fullName"), Derive(first_and_last)];
const FIRST: &[Accessor] = &[Key("firstName"), Key("first")];
const LAST: &[Accessor] = &[Key("lastName"), Key("last")];
const PICTURE: &[Accessor] = &[Key("picture"), Key("profilePic")];
const EMAIL: &[Accessor] = &[Key("email")];
// string, or { planName | name }
const PLAN: &[Accessor] = &[Key("subscriptionPlan"), Key("plan")];
const PLAN_OBJECT_KEYS: &[&str] = &["planName", "name"];
const BALANCE: &[Accessor] = &[Key("balance"), Key("rawBalance")];
const DISABLED: &[Accessor] = &[Key("isDisabled")];
const VERIFIED: &[Accessor] = &[Key("verified"), Key("isVerified"), Key("profileVerification")];
const JOINED: &[Accessor] = &[Key("dateJoined")];
const COUNTRY: &[Accessor] = &[Key("country")];

fn email_local_part(raw: &RawRecord) -> Option<Value> {
    let email = raw.get("email")?.as_str()?;
    let local = email.split('@').next().unwrap_or("");
    (!local.is_empty()).then(|| Value::String(local.to_string()))
}

fn first_and_last(raw: &RawRecord) -> Option<Value> {
    let first = normalize::text(raw, FIRST).unwrap_or_default();
    let last = normalize::text(raw, LAST).unwrap_or_default();
    let joined = format!("{} {}", first, last);
    let joined = joined.trim();
    (!joined.is_empty()).then(|| Value::String(joined.to_string()))
}

static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::User,
    searchable: &["id", "username", "fullName", "email", "plan"],
    filters: &["plan", "verified", "status"],
    sorts: &[
        sort("newest", "joined", true),
        sort("oldest", "joined", false),
        sort("balance", "balance", true),
        sort("name", "fullName", false),
    ],
    default_sort: "newest",
    page_size: 20,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub full_name: String,
    pub profile_pic: String,
    pub email: String,
    pub plan: String,
    pub balance: f64,
    pub is_disabled: bool,
    pub verified: bool,
    /// Epoch milliseconds.
    pub joined_at: Option<i64>,
    pub country: String,
    #[serde(skip)]
    pub origin: Origin,
}

impl User {
    pub fn status(&self) -> &'static str { if self.is_disabled { "disabled" } else { "active" } }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn normalize(raw: &RawRecord) -> Self {
        let username = normalize::text_or(raw, USERNAME, "");
        let full_name = normalize::text(raw, FULL_NAME).unwrap_or_else(|| username.clone());
        User {
            id: normalize::text_or(raw, ID, ""),
            full_name,
            username,
            profile_pic: normalize::text_or(raw, PICTURE, ""),
            email: normalize::text_or(raw, EMAIL, ""),
            plan: normalize::named(raw, PLAN, PLAN_OBJECT_KEYS, DEFAULT_PLAN).unwrap_or_else(|| DEFAULT_PLAN.to_string()),
            balance: normalize::number(raw, BALANCE).unwrap_or(0.0),
            is_disabled: normalize::flag(raw, DISABLED),
            verified: normalize::flag(raw, VERIFIED),
            joined_at: normalize::timestamp(raw, JOINED),
            country: normalize::text_or(raw, COUNTRY, ""),
            origin: Origin::new(raw),
        }
    }

    fn to_raw(&self) -> RawRecord {
        let mut out = json!({
            "userId": self.id,
            "username": self.username,
            "fullName": self.full_name,
            "picture": self.profile_pic,
            "email": self.email,
            "subscriptionPlan": self.plan,
            "balance": self.balance,
            "isDisabled": self.is_disabled,
            "verified": self.verified,
            "country": self.country,
        });
        if let Some(ts) = self.joined_at.and_then(render_timestamp) {
            out["dateJoined"] = Value::String(ts);
        }
        out
    }

    fn id(&self) -> &str { &self.id }
    fn origin(&self) -> &Origin { &self.origin }
    fn schema() -> &'static EntitySchema { &SCHEMA }

    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let v = match field {
            "id" => &self.id,
            "username" => &self.username,
            "fullName" => &self.full_name,
            "email" => &self.email,
            "plan" => &self.plan,
            "country" => &self.country,
            "verified" => return Some(Cow::Borrowed(if self.verified { "verified" } else { "unverified" })),
            "status" => return Some(Cow::Borrowed(self.status())),
            _ => return None,
        };
        Some(Cow::Borrowed(v.as_str()))
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "joined" => time_or_missing(self.joined_at),
            "balance" => SortValue::Num(self.balance),
            "fullName" => text_or_missing(&self.full_name),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_shapes_collapse_to_one_user() {
        let u = User::normalize(&json!({
            "_id": "abc",
            "email": "jane.doe@example.com",
            "first": "Jane",
            "subscriptionPlan": { "planName": "Premium" },
            "rawBalance": "42.5",
            "profileVerification": true,
            "dateJoined": "2024-01-02T00:00:00Z",
        }));
        assert_eq!(u.id, "abc");
        assert_eq!(u.username, "jane.doe");
        assert_eq!(u.full_name, "Jane");
        assert_eq!(u.plan, "Premium");
        assert_eq!(u.balance, 42.5);
        assert!(u.verified);
        assert!(u.joined_at.is_some());
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let u = User::normalize(&json!({ "username": "bob_wilson" }));
        assert_eq!(u.full_name, "bob_wilson");
        assert_eq!(u.plan, DEFAULT_PLAN);
        assert_eq!(u.status(), "active");
    }

    #[test]
    fn plan_object_without_name_defaults() {
        let u = User::normalize(&json!({ "subscriptionPlan": { "tier": 3 } }));
        assert_eq!(u.plan, DEFAULT_PLAN);
    }
}
