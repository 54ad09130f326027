#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::normalize::{self, parse_timestamp, Accessor, Key};
use crate::{sort, Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortValue};

use super::time_or_missing;

pub const DEFAULT_SUBJECT: &str = "Support Request";
pub const UNKNOWN_USER: &str = "Unknown";

const ID: &[Accessor] = &[Key("ticketId"), Key("id")];
// string, or { userName | email }
const USER: &[Accessor] = &[Key("user")];
const USER_OBJECT_KEYS: &[&str] = &["userName", "email"];
const SUBJECT: &[Accessor] = &[Key("description"), Key("subject"), Key("issueLabel")];
const CATEGORY: &[Accessor] = &[Key("issueLabel"), Key("category")];
const ISSUE_TYPE: &[Accessor] = &[Key("issueType")];
const PRIORITY: &[Accessor] = &[Key("priority")];
const STATUS: &[Accessor] = &[Key("status")];
const THREAD: &[Accessor] = &[Key("messages"), Key("thread")];
const CREATED: &[Accessor] = &[Key("createdAt")];
const UPDATED: &[Accessor] = &[Key("updatedAt")];
const CLOSE_REASON: &[Accessor] = &[Key("closeReason")];

const MSG_ID: &[Accessor] = &[Key("id"), Key("_id")];
const MSG_FROM: &[Accessor] = &[Key("from"), Key("role")];
const MSG_BODY: &[Accessor] = &[Key("message"), Key("text")];
const MSG_SENDER: &[Accessor] = &[Key("sender")];
const MSG_TS: &[Accessor] = &[Key("timestamp"), Key("createdAt")];

static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Ticket,
    searchable: &["id", "subject", "user", "category"],
    filters: &["status", "category"],
    sorts: &[
        sort("updated", "updated", true),
        sort("created", "created", true),
        sort("priority", "priority", true),
    ],
    default_sort: "updated",
    page_size: 10,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
    /// Unrecognized upstream status, kept verbatim.
    Other(String),
}

impl TicketStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "open" => TicketStatus::Open,
            "in-progress" | "in_progress" | "inprogress" => TicketStatus::InProgress,
            "closed" => TicketStatus::Closed,
            _ => TicketStatus::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Closed => "closed",
            TicketStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Serialize for TicketStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.serialize_str(self.as_str()) }
}

/// One entry of a ticket's conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    #[serde(rename = "message")]
    pub body: String,
    pub sender: String,
    pub timestamp: String,
}

impl Message {
    pub fn normalize(raw: &RawRecord) -> Self {
        Message {
            id: normalize::text_or(raw, MSG_ID, ""),
            from: normalize::text_or(raw, MSG_FROM, "user"),
            body: normalize::text_or(raw, MSG_BODY, ""),
            sender: normalize::text_or(raw, MSG_SENDER, ""),
            timestamp: normalize::text_or(raw, MSG_TS, ""),
        }
    }

    pub fn to_raw(&self) -> RawRecord {
        json!({
            "id": self.id,
            "from": self.from,
            "message": self.body,
            "sender": self.sender,
            "timestamp": self.timestamp,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: RecordId,
    pub user: String,
    pub subject: String,
    pub category: String,
    pub issue_type: String,
    pub priority: String,
    pub status: TicketStatus,
    pub thread: Vec<Message>,
    pub created_at: String,
    pub updated_at: String,
    pub close_reason: Option<String>,
    #[serde(skip)]
    pub origin: Origin,
}

impl Ticket {
    pub fn category_label(&self) -> String {
        let key = if self.category.is_empty() { &self.issue_type } else { &self.category };
        category_label(key)
    }

    fn priority_rank(&self) -> SortValue {
        match self.priority.to_ascii_lowercase().as_str() {
            "high" => SortValue::Num(3.0),
            "medium" => SortValue::Num(2.0),
            "low" => SortValue::Num(1.0),
            _ => SortValue::Missing,
        }
    }
}

/// Human label for an issue category; unknown categories pass through.
pub fn category_label(key: &str) -> String {
    let label = match key {
        "deposit" => "Deposit",
        "withdrawal" => "Withdrawal",
        "subscription" => "Subscription",
        "kyc" => "KYC",
        "password" => "Password",
        "account" => "Account",
        "payment" => "Payment",
        "technical" => "Technical",
        "billing" => "Billing",
        "" | "other" => "Issue",
        other => other,
    };
    label.to_string()
}

impl Entity for Ticket {
    const KIND: EntityKind = EntityKind::Ticket;

    fn normalize(raw: &RawRecord) -> Self {
        let status = normalize::text(raw, STATUS).map(|s| TicketStatus::parse(&s)).unwrap_or(TicketStatus::Open);
        Ticket {
            id: normalize::text_or(raw, ID, ""),
            user: normalize::named(raw, USER, USER_OBJECT_KEYS, UNKNOWN_USER).unwrap_or_default(),
            subject: normalize::text_or(raw, SUBJECT, DEFAULT_SUBJECT),
            category: normalize::text_or(raw, CATEGORY, ""),
            issue_type: normalize::text_or(raw, ISSUE_TYPE, ""),
            priority: normalize::text_or(raw, PRIORITY, ""),
            status,
            thread: normalize::list(raw, THREAD).iter().map(Message::normalize).collect(),
            created_at: normalize::text_or(raw, CREATED, ""),
            updated_at: normalize::text_or(raw, UPDATED, ""),
            close_reason: normalize::text(raw, CLOSE_REASON),
            origin: Origin::new(raw),
        }
    }

    fn to_raw(&self) -> RawRecord {
        let mut out = json!({
            "ticketId": self.id,
            "user": self.user,
            "subject": self.subject,
            "category": self.category,
            "issueType": self.issue_type,
            "priority": self.priority,
            "status": self.status.as_str(),
            "messages": self.thread.iter().map(Message::to_raw).collect::<Vec<_>>(),
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        });
        if let Some(reason) = &self.close_reason {
            out["closeReason"] = Value::String(reason.clone());
        }
        out
    }

    fn id(&self) -> &str { &self.id }
    fn origin(&self) -> &Origin { &self.origin }
    fn schema() -> &'static EntitySchema { &SCHEMA }

    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let v = match field {
            "id" => &self.id,
            "user" => &self.user,
            "subject" => &self.subject,
            "category" => &self.category,
            "issueType" => &self.issue_type,
            "priority" => &self.priority,
            "status" => return Some(Cow::Borrowed(self.status.as_str())),
            _ => return None,
        };
        Some(Cow::Borrowed(v.as_str()))
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "updated" => {
                let at = if self.updated_at.is_empty() { &self.created_at } else { &self.updated_at };
                time_or_missing(parse_timestamp(at))
            }
            "created" => time_or_missing(parse_timestamp(&self.created_at)),
            "priority" => self.priority_rank(),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_object_resolves_to_name() {
        let t = Ticket::normalize(&json!({"id": "T1", "user": {"userName": "jd", "email": "j@x"}}));
        assert_eq!(t.user, "jd");
        let t = Ticket::normalize(&json!({"id": "T1", "user": {"avatar": null}}));
        assert_eq!(t.user, UNKNOWN_USER);
    }

    #[test]
    fn defaults_for_empty_ticket() {
        let t = Ticket::normalize(&json!({}));
        assert_eq!(t.status, TicketStatus::Open);
        assert_eq!(t.subject, DEFAULT_SUBJECT);
        assert!(t.thread.is_empty());
        assert_eq!(t.category_label(), "Issue");
    }

    #[test]
    fn thread_accepts_either_key() {
        let t = Ticket::normalize(&json!({"thread": [{"text": "hi", "role": "admin"}]}));
        assert_eq!(t.thread.len(), 1);
        assert_eq!(t.thread[0].body, "hi");
        assert_eq!(t.thread[0].from, "admin");
    }

    #[test]
    fn statuses_parse_leniently() {
        assert_eq!(TicketStatus::parse("In_Progress"), TicketStatus::InProgress);
        assert_eq!(TicketStatus::parse("escalated"), TicketStatus::Other("escalated".into()));
        assert_eq!(category_label("kyc"), "KYC");
        assert_eq!(category_label("refund"), "refund");
    }
}
