#![forbid(unsafe_code)]

use roster_core::prelude::*;
use roster_store::{Collection, LoadReport, SnapshotPublisher};
use serde_json::json;

fn user(id: &str, name: &str) -> RawRecord { json!({ "userId": id, "username": name, "balance": 10 }) }

#[test]
fn load_rejects_empty_ids_and_collapses_duplicates() {
    let mut c = Collection::<User>::new();
    let report = c.load(&[
        user("1", "a"),
        json!({ "username": "nobody" }),
        user("2", "b"),
        user("1", "a2"),
    ]);
    assert_eq!(report, LoadReport { accepted: 2, rejected: 1, duplicates: 1 });
    let names: Vec<&str> = c.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["a2", "b"]);
}

#[test]
fn replace_touches_only_the_matching_record() {
    let mut c = Collection::<User>::new();
    c.load(&[user("1", "a"), user("2", "b"), user("3", "c")]);
    let before = c.items().to_vec();
    let epoch = c.epoch();

    let mut changed = c.get("2").cloned().unwrap();
    changed.verified = true;
    assert!(c.replace(changed));
    assert_eq!(c.epoch(), epoch + 1);
    for (old, new) in before.iter().zip(c.items()) {
        if old.id != "2" {
            assert_eq!(old, new);
        }
    }
    assert!(c.items()[1].verified);

    let ghost = User::normalize(&user("9", "ghost"));
    assert!(!c.replace(ghost));
    assert_eq!(c.len(), 3);
}

#[test]
fn load_replaces_wholesale() {
    let mut c = Collection::<User>::new();
    c.load(&[user("1", "a"), user("2", "b")]);
    c.load(&[user("3", "c")]);
    assert_eq!(c.len(), 1);
    assert!(!c.contains("1"));
    c.clear();
    assert!(c.is_empty());
}

#[tokio::test]
async fn publisher_swaps_snapshots_and_signals_epoch() {
    let publisher = SnapshotPublisher::<User>::new();
    let handle = publisher.handle();
    let mut rx = handle.subscribe_epoch();
    assert_eq!(handle.current().items.len(), 0);

    let mut c = Collection::<User>::new();
    c.load(&[user("1", "a"), user("2", "b")]);
    publisher.publish(&c);

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), c.epoch());
    let snap = handle.current();
    assert_eq!(snap.epoch, c.epoch());
    assert_eq!(snap.items.len(), 2);

    c.remove("1");
    publisher.publish(&c);
    assert_eq!(handle.current().items.len(), 1);
    // earlier snapshots stay intact for readers still holding them
    assert_eq!(snap.items.len(), 2);
}
