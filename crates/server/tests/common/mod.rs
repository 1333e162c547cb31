//! Shared fixtures: an in-memory SQLite database with the analytics tables.
#![allow(dead_code)]

use email_analytics::entity::{EmailStatus, email_send, member, post};
use email_analytics::webhook::{ClickData, WebhookData, WebhookPayload};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    Statement,
};
use std::sync::Arc;
use time::OffsetDateTime;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE post (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        emails_sent INTEGER NOT NULL DEFAULT 0,
        emails_delivered INTEGER NOT NULL DEFAULT 0,
        emails_opened INTEGER NOT NULL DEFAULT 0,
        unique_opens INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );"#,
    r#"CREATE TABLE member (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NULL,
        unsubscribed INTEGER NOT NULL DEFAULT 0,
        total_emails_received INTEGER NOT NULL DEFAULT 0,
        total_emails_opened INTEGER NOT NULL DEFAULT 0,
        total_emails_clicked INTEGER NOT NULL DEFAULT 0,
        total_bounces INTEGER NOT NULL DEFAULT 0,
        last_email_opened_at TEXT NULL,
        engagement_score REAL NOT NULL DEFAULT 0,
        open_rate TEXT NULL,
        created_at TEXT NOT NULL
    );"#,
    r#"CREATE TABLE email_send (
        id TEXT PRIMARY KEY,
        resend_email_id TEXT NOT NULL UNIQUE,
        broadcast_id TEXT NULL,
        post_id TEXT NULL,
        subject TEXT NOT NULL,
        from_email TEXT NOT NULL,
        recipient_count INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'sent',
        sent_at TEXT NOT NULL,
        delivered_at TEXT NULL,
        opened_at TEXT NULL,
        clicked_at TEXT NULL,
        bounced_at TEXT NULL,
        last_event_at TEXT NULL
    );"#,
    r#"CREATE TABLE email_recipient (
        id TEXT PRIMARY KEY,
        email_send_id TEXT NOT NULL,
        email TEXT NOT NULL,
        member_id TEXT NULL,
        delivered INTEGER NOT NULL DEFAULT 0,
        opened INTEGER NOT NULL DEFAULT 0,
        clicked INTEGER NOT NULL DEFAULT 0,
        bounced INTEGER NOT NULL DEFAULT 0,
        open_count INTEGER NOT NULL DEFAULT 0,
        click_count INTEGER NOT NULL DEFAULT 0,
        first_opened_at TEXT NULL,
        last_opened_at TEXT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (email_send_id, email)
    );"#,
    r#"CREATE TABLE email_event (
        id TEXT PRIMARY KEY,
        email_send_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        event_id TEXT NOT NULL UNIQUE,
        recipient_email TEXT NULL,
        link_url TEXT NULL,
        raw_payload TEXT NOT NULL,
        processed_at TEXT NOT NULL
    );"#,
];

/// Create an in-memory SQLite database with required tables.
pub async fn setup_test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    for sql in SCHEMA {
        db.execute(Statement::from_string(DbBackend::Sqlite, *sql))
            .await
            .expect("Failed to create table");
    }
    Arc::new(db)
}

pub async fn create_post(db: &DatabaseConnection, id: &str) -> post::Model {
    post::ActiveModel {
        id: Set(id.to_string()),
        title: Set(format!("Post {id}")),
        emails_sent: Set(0),
        emails_delivered: Set(0),
        emails_opened: Set(0),
        unique_opens: Set(0),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(db)
    .await
    .expect("Failed to create test post")
}

pub async fn create_member(db: &DatabaseConnection, id: &str, email: &str) -> member::Model {
    member::ActiveModel {
        id: Set(id.to_string()),
        email: Set(email.to_string()),
        name: Set(None),
        unsubscribed: Set(false),
        total_emails_received: Set(0),
        total_emails_opened: Set(0),
        total_emails_clicked: Set(0),
        total_bounces: Set(0),
        last_email_opened_at: Set(None),
        engagement_score: Set(0.0),
        open_rate: Set(None),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(db)
    .await
    .expect("Failed to create test member")
}

/// Insert a send directly, bypassing `create_email_send_record`.
pub async fn create_send(
    db: &DatabaseConnection,
    id: &str,
    resend_email_id: &str,
    post_id: Option<&str>,
    status: EmailStatus,
    sent_at: OffsetDateTime,
) -> email_send::Model {
    email_send::ActiveModel {
        id: Set(id.to_string()),
        resend_email_id: Set(resend_email_id.to_string()),
        broadcast_id: Set(None),
        post_id: Set(post_id.map(String::from)),
        subject: Set("Weekly digest".to_string()),
        from_email: Set("news@example.com".to_string()),
        recipient_count: Set(1),
        status: Set(status),
        sent_at: Set(sent_at),
        delivered_at: Set(None),
        opened_at: Set(None),
        clicked_at: Set(None),
        bounced_at: Set(None),
        last_event_at: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to create test send")
}

/// Build a provider payload for `email_id` addressed to `to`.
pub fn payload(event_type: &str, email_id: &str, to: &str) -> WebhookPayload {
    let click = (event_type == "email.clicked").then(|| ClickData {
        link: Some("https://blog.example.com/posts/hello".to_string()),
        timestamp: "2025-03-01T10:05:00.000Z".to_string(),
    });
    WebhookPayload {
        event_type: event_type.to_string(),
        created_at: "2025-03-01T10:00:00.000Z".to_string(),
        data: WebhookData {
            email_id: email_id.to_string(),
            from: "news@example.com".to_string(),
            to: vec![to.to_string()],
            subject: "Weekly digest".to_string(),
            created_at: Some("2025-03-01T09:59:00.000Z".to_string()),
            click,
        },
        raw_body: None,
    }
}
