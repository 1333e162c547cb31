use goose::prelude::*;
use serde_json::json;
use std::env;

fn resend_email_id() -> String {
    env::var("RESEND_EMAIL_ID").unwrap_or_else(|_| "loadtest-send".to_string())
}

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn get_overview(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/analytics/overview").await?;
    Ok(())
}

/// Posts an unsigned webhook; run the server without `webhook.signing_secret`.
async fn post_webhook(user: &mut GooseUser, event_type: &str) -> TransactionResult {
    let recipient = format!("loadtest+{}@example.com", user.weighted_users_index);
    let payload = json!({
        "type": event_type,
        "created_at": "2025-01-01T00:00:00.000Z",
        "data": {
            "email_id": resend_email_id(),
            "from": "newsletter@example.com",
            "to": [recipient],
            "subject": "Load test",
            "click": { "link": "https://example.com/", "timestamp": "2025-01-01T00:00:00.000Z" }
        }
    });
    let request_builder = user
        .get_request_builder(&GooseMethod::Post, "/api/webhooks/email")?
        .header("svix-id", format!("msg_{}", uuid::Uuid::new_v4()))
        .json(&payload);
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

async fn webhook_delivered(user: &mut GooseUser) -> TransactionResult {
    post_webhook(user, "email.delivered").await
}

async fn webhook_opened(user: &mut GooseUser) -> TransactionResult {
    post_webhook(user, "email.opened").await
}

async fn webhook_clicked(user: &mut GooseUser) -> TransactionResult {
    post_webhook(user, "email.clicked").await
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    println!("EmailSend resend id for webhooks: {}", resend_email_id());

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("Webhooks")
                .register_transaction(transaction!(webhook_delivered))
                .register_transaction(transaction!(webhook_opened))
                .register_transaction(transaction!(webhook_clicked)),
        )
        .register_scenario(
            scenario!("Analytics").register_transaction(transaction!(get_overview)),
        )
        .execute()
        .await?;

    Ok(())
}
