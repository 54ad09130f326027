use roster_core::prelude::*;
use serde_json::{json, Value};

fn odd_inputs() -> Vec<Value> {
    vec![
        json!({}),
        json!(null),
        json!(42),
        json!("a string"),
        json!([1, 2, 3]),
        json!({"id": null, "user": [], "balance": "abc", "progress": {}, "messages": "nope"}),
    ]
}

fn assert_idempotent<E: Entity>(raw: &Value) {
    let once = E::normalize(raw);
    let twice = E::normalize(&once.to_raw());
    assert_eq!(once, twice, "{} not idempotent for {raw}", E::KIND);
}

#[test]
fn normalization_is_total() {
    for raw in odd_inputs() {
        let u = User::normalize(&raw);
        assert_eq!(u.id, "");
        assert_eq!(u.plan, "Free");
        assert_eq!(u.balance, 0.0);
        let _ = Transaction::normalize(&raw);
        let _ = Report::normalize(&raw);
        let t = Ticket::normalize(&raw);
        assert_eq!(t.status, TicketStatus::Open);
        let _ = Post::normalize(&raw);
        let d = Download::normalize(&raw);
        assert_eq!(d.progress, 0.0);
    }
}

#[test]
fn normalization_is_idempotent() {
    let mut inputs = odd_inputs();
    inputs.push(json!({
        "_id": "u-9",
        "email": "sam@example.com",
        "firstName": "Sam",
        "lastName": "Lee",
        "plan": {"name": "Pro"},
        "rawBalance": "1200.75",
        "isVerified": "yes",
        "isDisabled": 1,
        "dateJoined": "2023-06-01",
    }));
    inputs.push(json!({
        "transactionId": "t-1",
        "email": "sam@example.com",
        "transactionAmount": "99.5",
        "type": "deposit",
        "createdAt": "2024-01-01T10:00:00Z",
    }));
    inputs.push(json!({"date": "2024-11-05", "users": 25, "deposits": 15000, "posts": 3}));
    inputs.push(json!({"userId": "u-far", "dateJoined": 9_000_000_000_000_000i64}));
    inputs.push(json!({"userId": "u-neg", "dateJoined": -9_000_000_000_000_000i64}));
    inputs.push(json!({"date": "2024-11-06", "users": 9_007_199_254_740_993u64, "posts": "18446744073709551615"}));
    inputs.push(json!({
        "id": 7,
        "user": {"email": "x@y.z"},
        "issueLabel": "kyc",
        "status": "In Review",
        "closeReason": "done",
        "thread": [{"role": "admin", "text": "hello", "_id": "m1"}],
    }));
    inputs.push(json!({"id": "p", "user": "alice", "media": [{"url": "a.png"}], "approved": "true"}));
    inputs.push(json!({"id": 3, "title": "Ocean", "progress": "42", "status": "completed"}));

    for raw in &inputs {
        assert_idempotent::<User>(raw);
        assert_idempotent::<Transaction>(raw);
        assert_idempotent::<Report>(raw);
        assert_idempotent::<Ticket>(raw);
        assert_idempotent::<Post>(raw);
        assert_idempotent::<Download>(raw);
    }
}

#[test]
fn aliases_follow_priority_order() {
    let u = User::normalize(&json!({"userId": "a", "_id": "b", "id": "c"}));
    assert_eq!(u.id, "a");
    let u = User::normalize(&json!({"verified": false, "isVerified": true}));
    assert!(!u.verified);
    let t = Transaction::normalize(&json!({"balance": 5, "amount": 9}));
    assert_eq!(t.amount, 5.0);
    let t = Ticket::normalize(&json!({"description": "Card declined", "subject": "other"}));
    assert_eq!(t.subject, "Card declined");
}

#[test]
fn origin_keeps_unpromoted_fields() {
    let u = User::normalize(&json!({"userId": "a", "referralCode": "XYZ"}));
    assert_eq!(u.origin().get("referralCode"), Some(&json!("XYZ")));
    let v = User::normalize(&json!({"userId": "a"}));
    assert_eq!(u, v);
}

#[test]
fn schemas_are_consistent() {
    fn check<E: Entity>() {
        let s = E::schema();
        assert_eq!(s.kind, E::KIND);
        assert!(s.page_size > 0);
        assert!(s.sort_spec(s.default_sort).is_some(), "{}", E::KIND);
    }
    check::<User>();
    check::<Transaction>();
    check::<Report>();
    check::<Ticket>();
    check::<Post>();
    check::<Download>();
}
