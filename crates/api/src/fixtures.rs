//! Canned records served by [`MockSource`](crate::MockSource).
//!
//! Shapes are deliberately mixed (alias keys, nested objects, numeric
//! strings) the way the admin backend delivers them.

use roster_core::{EntityKind, RawRecord};
use serde_json::json;

pub fn records(kind: EntityKind) -> Vec<RawRecord> {
    match kind {
        EntityKind::User => users(),
        EntityKind::Transaction => transactions(),
        EntityKind::Report => reports(),
        EntityKind::Ticket => tickets(),
        EntityKind::Post => posts(),
        EntityKind::Download => downloads(),
    }
}

pub fn users() -> Vec<RawRecord> {
    vec![
        json!({
            "userId": "1",
            "username": "john_doe",
            "firstName": "John",
            "lastName": "Doe",
            "email": "john@example.com",
            "subscriptionPlan": "Premium",
            "balance": 150,
            "verified": true,
            "dateJoined": "2025-09-18T09:30:00Z",
            "isDisabled": false,
        }),
        json!({
            "userId": "2",
            "username": "jane_smith",
            "firstName": "Jane",
            "lastName": "Smith",
            "email": "jane@example.com",
            "subscriptionPlan": { "planName": "Basic" },
            "balance": "50",
            "verified": false,
            "dateJoined": "2025-08-19T14:00:00Z",
            "isDisabled": false,
        }),
        json!({
            "_id": "3",
            "email": "bob_wilson@example.com",
            "first": "Bob",
            "last": "Wilson",
            "plan": "Free",
            "rawBalance": 0,
            "profileVerification": "verified",
            "dateJoined": "2025-07-20",
            "isDisabled": true,
        }),
    ]
}

pub fn transactions() -> Vec<RawRecord> {
    vec![
        json!({
            "_id": "1",
            "user": "user1@example.com",
            "transactionAmount": 50,
            "type": "deposit",
            "status": "completed",
            "createdAt": "2025-10-18T08:00:00Z",
            "details": "Deposit via PayPal",
        }),
        json!({
            "_id": "2",
            "user": "user2@example.com",
            "transactionAmount": 25,
            "type": "withdrawal",
            "status": "pending",
            "createdAt": "2025-10-17T08:00:00Z",
            "details": "Withdrawal to bank",
        }),
        json!({
            "id": "3",
            "email": "user3@example.com",
            "amount": "100",
            "type": "subscription",
            "status": "completed",
            "date": "2025-10-16T08:00:00Z",
            "name": "Monthly subscription",
        }),
    ]
}

pub fn reports() -> Vec<RawRecord> {
    vec![
        json!({ "date": "2025-10-18", "users": 25, "deposits": 15000, "withdrawals": 8500, "posts": 45, "affiliateBonuses": 1200 }),
        json!({ "date": "2025-10-17", "users": 18, "deposits": 12000, "withdrawals": 9200, "posts": 32, "affiliateBonuses": 950 }),
        json!({ "date": "2025-10-16", "users": 22, "deposits": 18000, "withdrawals": 11000, "posts": 0, "affiliateBonuses": 1450 }),
    ]
}

pub fn tickets() -> Vec<RawRecord> {
    vec![
        json!({
            "ticketId": "TICKET001",
            "user": "john_doe",
            "description": "Deposit issue - payment not reflecting",
            "issueLabel": "deposit",
            "status": "open",
            "priority": "medium",
            "issueType": "deposit",
            "createdAt": "2025-10-18T07:00:00Z",
            "updatedAt": "2025-10-18T07:30:00Z",
            "messages": [
                { "id": "msg1", "from": "user", "message": "I made a deposit but it is not showing in my balance.", "sender": "john_doe", "timestamp": "2025-10-18T07:00:00Z" },
                { "id": "msg2", "from": "admin", "message": "Checking your deposit. Can you share the transaction id?", "sender": "Admin", "timestamp": "2025-10-18T07:30:00Z" },
            ],
        }),
        json!({
            "id": "TICKET002",
            "user": { "userName": "jane_smith", "email": "jane@example.com" },
            "subject": "Account verification taking too long",
            "category": "kyc",
            "status": "in-progress",
            "priority": "high",
            "createdAt": "2025-10-17T08:00:00Z",
            "updatedAt": "2025-10-17T20:00:00Z",
            "thread": [
                { "_id": "msg3", "role": "user", "text": "My verification has been pending for 3 days.", "sender": "jane_smith", "timestamp": "2025-10-17T08:00:00Z" },
            ],
        }),
        json!({
            "ticketId": "TICKET003",
            "user": "bob_wilson",
            "subject": "Unable to reset password",
            "category": "password",
            "status": "closed",
            "priority": "low",
            "closeReason": "Password reset sent",
            "createdAt": "2025-10-16T08:00:00Z",
            "updatedAt": "2025-10-17T08:00:00Z",
            "messages": [],
        }),
    ]
}

pub fn posts() -> Vec<RawRecord> {
    vec![
        json!({
            "_id": "1",
            "content": "Sample post content about technology",
            "user": { "username": "john_doe", "userAvatar": null },
            "status": "approved",
            "approved": true,
            "createdAt": "2025-10-18T10:00:00Z",
            "media": ["https://cdn.example.com/p1.jpg"],
        }),
        json!({
            "_id": "2",
            "content": "Another interesting post",
            "user": { "username": "jane_smith", "userAvatar": null },
            "status": "pending",
            "approved": false,
            "createdAt": "2025-10-17T10:00:00Z",
            "media": [{ "url": "https://cdn.example.com/p2.mp4", "type": "video" }],
        }),
    ]
}

pub fn downloads() -> Vec<RawRecord> {
    vec![
        json!({ "id": 1, "title": "Mountain Landscape", "progress": 0, "status": "downloading" }),
        json!({ "id": 2, "title": "Ocean Waves", "progress": 64.5, "status": "downloading" }),
        json!({ "id": 3, "title": "Space Nebula", "progress": 100, "status": "completed" }),
    ]
}

/// Drill-down rows behind one report metric.
pub fn report_detail(metric: &str) -> Vec<RawRecord> {
    match metric {
        "users" => vec![
            json!({ "_id": "1", "id": "ST20250001", "username": "john_doe", "email": "john@example.com", "balance": 150 }),
            json!({ "_id": "2", "id": "ST20250002", "username": "jane_smith", "email": "jane@example.com", "balance": 200 }),
            json!({ "_id": "3", "id": "ST20250003", "username": "bob_wilson", "email": "bob@example.com", "balance": 75 }),
        ],
        "deposits" => vec![
            json!({ "_id": "TXN001", "user": "john_doe", "amount": 500, "type": "deposit", "status": "completed" }),
            json!({ "_id": "TXN002", "user": "jane_smith", "amount": 300, "type": "deposit", "status": "completed" }),
            json!({ "_id": "TXN003", "user": "bob_wilson", "amount": 150, "type": "deposit", "status": "pending" }),
        ],
        "withdrawals" => vec![
            json!({ "_id": "TXN004", "user": "john_doe", "amount": 200, "type": "withdrawal", "status": "completed" }),
            json!({ "_id": "TXN005", "user": "jane_smith", "amount": 100, "type": "withdrawal", "status": "pending" }),
        ],
        "affiliateBonuses" => vec![
            json!({ "_id": "AFF001", "user": "john_doe", "amount": 50, "type": "bonus", "status": "paid" }),
            json!({ "_id": "AFF002", "user": "jane_smith", "amount": 75, "type": "bonus", "status": "pending" }),
        ],
        "posts" => posts(),
        _ => Vec::new(),
    }
}

/// Dashboard overview: headline summary, user growth and revenue per plan.
pub fn dashboard() -> RawRecord {
    json!({
        "summary": { "data": { "totalUsers": 1250, "postsToday": 45, "totalRevenue": 15750, "newSignups": 23 } },
        "userGrowth": [
            { "date": "2025-10-08", "users": 1000 },
            { "date": "2025-10-09", "users": 1020 },
            { "date": "2025-10-10", "users": 1050 },
            { "date": "2025-10-11", "users": 1080 },
            { "date": "2025-10-12", "users": 1100 },
            { "date": "2025-10-13", "users": 1125 },
            { "date": "2025-10-14", "users": 1150 },
            { "date": "2025-10-15", "users": 1175 },
            { "date": "2025-10-16", "users": 1200 },
            { "date": "2025-10-17", "users": 1225 },
            { "date": "2025-10-18", "users": 1250 },
        ],
        "subscriptionRevenue": [
            { "plan": "Basic", "revenue": 5000 },
            { "plan": "Premium", "revenue": 7500 },
            { "plan": "VIP", "revenue": 3250 },
        ],
    })
}
