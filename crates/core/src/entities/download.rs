#![forbid(unsafe_code)]

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use serde_json::json;

use crate::normalize::{self, Accessor, Key};
use crate::{sort, Entity, EntityKind, EntitySchema, Origin, RawRecord, RecordId, SortValue};

const ID: &[Accessor] = &[Key("id")];
const TITLE: &[Accessor] = &[Key("title")];
const PROGRESS: &[Accessor] = &[Key("progress")];
const STATUS: &[Accessor] = &[Key("status")];

pub const MAX_PROGRESS: f64 = 100.0;

static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Download,
    searchable: &["title", "status"],
    filters: &["status"],
    sorts: &[sort("progress", "progress", true)],
    default_sort: "progress",
    page_size: 10,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Completed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Download {
    pub id: RecordId,
    pub title: String,
    /// Percent, always within `0..=100`.
    pub progress: f64,
    pub status: DownloadStatus,
    #[serde(skip)]
    pub origin: Origin,
}

impl Download {
    /// Advance by `delta` percent. Reaching 100 completes the download.
    pub fn advanced(&self, delta: f64) -> Self {
        let mut next = self.clone();
        next.progress = clamp_progress(self.progress + delta);
        next.status = status_for(next.progress, self.status);
        next
    }
}

fn clamp_progress(p: f64) -> f64 { if p.is_finite() { p.clamp(0.0, MAX_PROGRESS) } else { 0.0 } }

fn status_for(progress: f64, declared: DownloadStatus) -> DownloadStatus {
    if progress >= MAX_PROGRESS { DownloadStatus::Completed } else { declared }
}

impl Entity for Download {
    const KIND: EntityKind = EntityKind::Download;

    fn normalize(raw: &RawRecord) -> Self {
        let progress = clamp_progress(normalize::number(raw, PROGRESS).unwrap_or(0.0));
        let declared = match normalize::text(raw, STATUS).as_deref() {
            Some("completed") => DownloadStatus::Completed,
            _ => DownloadStatus::Downloading,
        };
        Download {
            id: normalize::text_or(raw, ID, ""),
            title: normalize::text_or(raw, TITLE, ""),
            progress,
            status: status_for(progress, declared),
            origin: Origin::new(raw),
        }
    }

    fn to_raw(&self) -> RawRecord {
        json!({
            "id": self.id,
            "title": self.title,
            "progress": self.progress,
            "status": self.status.as_str(),
        })
    }

    fn id(&self) -> &str { &self.id }
    fn origin(&self) -> &Origin { &self.origin }
    fn schema() -> &'static EntitySchema { &SCHEMA }

    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "title" => Some(Cow::Borrowed(self.title.as_str())),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "progress" => SortValue::Num(self.progress),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_completes() {
        let d = Download::normalize(&json!({"id": 4, "title": "Aurora", "progress": 140}));
        assert_eq!(d.id, "4");
        assert_eq!(d.progress, 100.0);
        assert_eq!(d.status, DownloadStatus::Completed);

        let d = Download::normalize(&json!({"id": "x", "progress": -5}));
        assert_eq!(d.progress, 0.0);
        assert_eq!(d.status, DownloadStatus::Downloading);
    }

    #[test]
    fn advancing_caps_at_hundred() {
        let d = Download::normalize(&json!({"id": "x", "progress": 90}));
        let next = d.advanced(25.0);
        assert_eq!(next.progress, 100.0);
        assert_eq!(next.status, DownloadStatus::Completed);
        assert_eq!(d.advanced(5.0).status, DownloadStatus::Downloading);
    }
}
