//! Canonical entity types and their alias tables.

#![forbid(unsafe_code)]

mod download;
mod post;
mod report;
mod ticket;
mod transaction;
mod user;

pub use download::{Download, DownloadStatus};
pub use post::Post;
pub use report::{DetailSource, Report, REPORT_METRICS};
pub use ticket::{category_label, Message, Ticket, TicketStatus};
pub use transaction::Transaction;
pub use user::{User, DEFAULT_PLAN, SUSPENDED_PLAN};

use crate::SortValue;

pub(crate) fn time_or_missing(ts: Option<i64>) -> SortValue { ts.map(SortValue::Time).unwrap_or(SortValue::Missing) }

pub(crate) fn text_or_missing(s: &str) -> SortValue {
    if s.is_empty() { SortValue::Missing } else { SortValue::Text(s.to_string()) }
}
