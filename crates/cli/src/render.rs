//! Human-readable table rows per entity.

use roster_core::format::{format_balance, format_currency, format_date, format_number, short_id, truncate_right};
use roster_core::normalize::render_timestamp;
use roster_core::{Download, Post, Report, Ticket, Transaction, User};

pub trait Row {
    fn header() -> String;
    fn row(&self) -> String;
}

fn joined(ms: Option<i64>) -> String { ms.and_then(render_timestamp).map(|s| format_date(&s)).unwrap_or_else(|| "-".into()) }

impl Row for User {
    fn header() -> String { format!("{:<12} {:<16} {:<20} {:<10} {:>10} {:<8} {}", "ID", "USERNAME", "NAME", "PLAN", "BALANCE", "STATUS", "JOINED") }
    fn row(&self) -> String {
        format!(
            "{:<12} {:<16} {:<20} {:<10} {:>10} {:<8} {}",
            short_id(&self.id),
            truncate_right(&self.username, 12),
            truncate_right(&self.full_name, 16),
            self.plan,
            format_balance(self.balance),
            self.status(),
            joined(self.joined_at),
        )
    }
}

impl Row for Transaction {
    fn header() -> String { format!("{:<12} {:<20} {:>12} {:<12} {:<10} {}", "ID", "USER", "AMOUNT", "TYPE", "STATUS", "DATE") }
    fn row(&self) -> String {
        format!(
            "{:<12} {:<20} {:>12} {:<12} {:<10} {}",
            short_id(&self.id),
            truncate_right(&self.user, 16),
            format_currency(self.amount),
            self.kind,
            self.status,
            format_date(&self.date),
        )
    }
}

impl Row for Report {
    fn header() -> String { format!("{:<12} {:>6} {:>12} {:>12} {:>6} {:>10}", "DATE", "USERS", "DEPOSITS", "WITHDRAWALS", "POSTS", "AFFILIATE") }
    fn row(&self) -> String {
        format!(
            "{:<12} {:>6} {:>12} {:>12} {:>6} {:>10}",
            self.date,
            format_number(self.users as f64, 0),
            format_currency(self.deposits),
            format_currency(self.withdrawals),
            format_number(self.posts as f64, 0),
            format_currency(self.affiliate_bonuses),
        )
    }
}

impl Row for Ticket {
    fn header() -> String { format!("{:<12} {:<14} {:<12} {:<12} {:<8} {:>4} {}", "ID", "USER", "CATEGORY", "STATUS", "PRIORITY", "MSGS", "SUBJECT") }
    fn row(&self) -> String {
        format!(
            "{:<12} {:<14} {:<12} {:<12} {:<8} {:>4} {}",
            short_id(&self.id),
            truncate_right(&self.user, 12),
            self.category_label(),
            self.status,
            self.priority,
            self.thread.len(),
            truncate_right(&self.subject, 40),
        )
    }
}

impl Row for Post {
    fn header() -> String { format!("{:<12} {:<14} {:<10} {:>5} {}", "ID", "AUTHOR", "STATUS", "MEDIA", "CONTENT") }
    fn row(&self) -> String {
        format!(
            "{:<12} {:<14} {:<10} {:>5} {}",
            short_id(&self.id),
            truncate_right(&self.author, 12),
            self.status,
            self.media.len(),
            truncate_right(&self.content, 40),
        )
    }
}

impl Row for Download {
    fn header() -> String { format!("{:<6} {:<24} {:>8} {}", "ID", "TITLE", "PROGRESS", "STATUS") }
    fn row(&self) -> String {
        format!("{:<6} {:<24} {:>7}% {}", self.id, truncate_right(&self.title, 20), self.progress.round(), self.status)
    }
}
