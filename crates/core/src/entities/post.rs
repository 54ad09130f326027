#![forbid(unsafe_code)]

use std::borrow::Cow;

use serde::Serialize;
use serde_json::json;

use crate::normalize::{self, parse_timestamp, Accessor, Key};
use crate::{sort, Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortValue};

use super::time_or_missing;

pub const UNKNOWN_AUTHOR: &str = "Unknown";

const ID: &[Accessor] = &[Key("_id"), Key("id")];
// string, or { username }
const AUTHOR: &[Accessor] = &[Key("user")];
const AUTHOR_OBJECT_KEYS: &[&str] = &["username"];
const CONTENT: &[Accessor] = &[Key("content")];
const STATUS: &[Accessor] = &[Key("status")];
const APPROVED: &[Accessor] = &[Key("approved")];
const CREATED: &[Accessor] = &[Key("createdAt")];
const MEDIA: &[Accessor] = &[Key("media")];

static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Post,
    searchable: &["author", "content", "status"],
    filters: &["status"],
    sorts: &[sort("newest", "created", true), sort("oldest", "created", false)],
    default_sort: "newest",
    page_size: 10,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: RecordId,
    pub author: String,
    pub content: String,
    pub status: String,
    pub approved: bool,
    pub created_at: String,
    pub media: Vec<String>,
    #[serde(skip)]
    pub origin: Origin,
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn normalize(raw: &RawRecord) -> Self {
        Post {
            id: normalize::text_or(raw, ID, ""),
            author: normalize::named(raw, AUTHOR, AUTHOR_OBJECT_KEYS, UNKNOWN_AUTHOR)
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            content: normalize::text_or(raw, CONTENT, ""),
            status: normalize::text_or(raw, STATUS, ""),
            approved: normalize::flag(raw, APPROVED),
            created_at: normalize::text_or(raw, CREATED, ""),
            media: normalize::media_urls(&normalize::list(raw, MEDIA)),
            origin: Origin::new(raw),
        }
    }

    fn to_raw(&self) -> RawRecord {
        json!({
            "_id": self.id,
            "user": self.author,
            "content": self.content,
            "status": self.status,
            "approved": self.approved,
            "createdAt": self.created_at,
            "media": self.media,
        })
    }

    fn id(&self) -> &str { &self.id }
    fn origin(&self) -> &Origin { &self.origin }
    fn schema() -> &'static EntitySchema { &SCHEMA }

    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let v = match field {
            "id" => &self.id,
            "author" => &self.author,
            "content" => &self.content,
            "status" => &self.status,
            _ => return None,
        };
        Some(Cow::Borrowed(v.as_str()))
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "created" => time_or_missing(parse_timestamp(&self.created_at)),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_and_media_shapes() {
        let p = Post::normalize(&json!({
            "_id": "p1",
            "user": {"username": "alice"},
            "media": ["a.png", {"url": "b.png"}, {"alt": "no url"}, 3],
        }));
        assert_eq!(p.author, "alice");
        assert_eq!(p.media, vec!["a.png".to_string(), "b.png".to_string()]);
    }

    #[test]
    fn author_defaults_to_unknown() {
        assert_eq!(Post::normalize(&json!({})).author, UNKNOWN_AUTHOR);
        assert_eq!(Post::normalize(&json!({"user": {}})).author, UNKNOWN_AUTHOR);
    }
}
