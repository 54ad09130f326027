#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use roster_core::prelude::*;
use roster_search::{derive, derive_clamped, select, Debounce, ViewState};
use roster_store::Collection;
use serde_json::json;

fn tx(id: usize, kind: &str, amount: f64) -> RawRecord {
    json!({ "_id": format!("t{id}"), "user": format!("user{id}"), "amount": amount, "type": kind, "status": "completed" })
}

fn transactions(n: usize) -> Collection<Transaction> {
    let mut c = Collection::new();
    c.load(&(0..n).map(|i| tx(i, if i % 2 == 0 { "deposit" } else { "withdrawal" }, 10.0)).collect::<Vec<_>>());
    c
}

#[test]
fn pagination_bounds() {
    let c = transactions(25);
    let mut v = ViewState::for_entity::<Transaction>();
    assert_eq!(v.page_size(), 10);

    let s = derive(c.items(), &v);
    assert_eq!(s.total_pages, 3);
    assert_eq!(s.items.len(), 10);

    v.set_page(3);
    assert_eq!(derive(c.items(), &v).items.len(), 5);

    v.set_page(4);
    let s = derive_clamped(c.items(), &mut v);
    assert_eq!(s.items.len(), 0);
    assert_eq!(s.total_pages, 3);
    assert_eq!(v.page(), 4);
}

#[test]
fn page_clamps_when_collection_shrinks() {
    let mut c = transactions(25);
    let mut v = ViewState::for_entity::<Transaction>();
    v.set_page(3);
    assert_eq!(derive_clamped(c.items(), &mut v).items.len(), 5);

    for i in 15..25 {
        c.remove(&format!("t{i}"));
    }
    let s = derive_clamped(c.items(), &mut v);
    assert_eq!(v.page(), 2);
    assert_eq!(s.page, 2);
    assert_eq!(s.items.len(), 5);
}

#[test]
fn page_known_valid_at_set_time_clamps_without_prior_derive() {
    let mut c = transactions(25);
    let mut v = ViewState::for_entity::<Transaction>();
    v.set_page_within(3, 3);
    for i in 15..25 {
        c.remove(&format!("t{i}"));
    }
    let s = derive_clamped(c.items(), &mut v);
    assert_eq!(s.page, 2);
    assert_eq!(s.items.len(), 5);

    v.set_page_within(5, 2);
    let s = derive_clamped(c.items(), &mut v);
    assert_eq!(s.page, 5);
    assert!(s.items.is_empty());
}

#[test]
fn search_is_case_insensitive_or_over_fields() {
    let mut c = Collection::<User>::new();
    c.load(&[
        json!({ "userId": "1", "username": "jane_smith", "fullName": "J. Smith", "email": "js@example.com" }),
        json!({ "userId": "2", "username": "bob_wilson", "fullName": "Bob Wilson", "email": "bob@example.com" }),
    ]);
    let mut v = ViewState::for_entity::<User>();
    v.set_search("JANE");
    let s = derive(c.items(), &v);
    assert_eq!(s.items.len(), 1);
    assert_eq!(s.items[0].username, "jane_smith");

    v.set_search("");
    assert_eq!(derive(c.items(), &v).total_matches, 2);
    v.set_search("   ");
    assert_eq!(derive(c.items(), &v).total_matches, 2);
}

#[test]
fn filters_only_narrow() {
    let c = transactions(20);
    let mut v = ViewState::for_entity::<Transaction>();
    let all = derive(c.items(), &v).total_matches;
    v.set_filter("type", "deposit");
    let one = derive(c.items(), &v).total_matches;
    v.set_filter("status", "completed");
    let two = derive(c.items(), &v).total_matches;
    v.set_search("user1");
    let three = derive(c.items(), &v).total_matches;
    assert!(all <= c.len());
    assert!(one <= all && two <= one && three <= two);
    assert_eq!(one, 10);
}

#[test]
fn sort_is_stable() {
    let mut c = Collection::<Transaction>::new();
    c.load(&[tx(1, "deposit", 5.0), tx(2, "deposit", 9.0), tx(3, "deposit", 5.0), tx(4, "deposit", 9.0)]);
    let mut v = ViewState::for_entity::<Transaction>();
    v.set_sort("amount");
    let ids: Vec<String> = derive(c.items(), &v).items.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["t2", "t4", "t1", "t3"]);

    // missing dates order lowest: last under newest-first
    v.set_sort("newest");
    let (order, info) = select(c.items(), &v);
    assert_eq!(order, vec![0, 1, 2, 3]);
    assert_eq!(info.after_search, 4);
}

#[test]
fn ticket_status_filter() {
    let mut c = Collection::<Ticket>::new();
    c.load(&[
        json!({ "ticketId": "1", "status": "open" }),
        json!({ "ticketId": "2", "status": "open" }),
        json!({ "ticketId": "3", "status": "closed" }),
    ]);
    let mut v = ViewState::for_entity::<Ticket>();
    v.set_filter("status", "open");
    let ids: Vec<String> = derive(c.items(), &v).items.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn debounce_coalesces_keystrokes() {
    let t0 = Instant::now();
    let ms = |n| t0 + Duration::from_millis(n);
    let mut d = Debounce::<String>::new(300);

    d.push("j".into(), ms(0));
    d.push("ja".into(), ms(100));
    d.push("jan".into(), ms(200));
    assert_eq!(d.poll(ms(400)), None);
    assert_eq!(d.deadline(), Some(ms(500)));
    assert_eq!(d.poll(ms(500)).as_deref(), Some("jan"));
    assert!(!d.is_pending());
    assert_eq!(d.poll(ms(900)), None);

    d.push("jane".into(), ms(1000));
    assert_eq!(d.flush().as_deref(), Some("jane"));
}
