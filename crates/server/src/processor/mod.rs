//! Applies provider delivery events to the send/recipient ledger.
//!
//! Webhooks are delivered at least once, so every event passes an
//! idempotency gate on its `event_id` before anything is written. All writes
//! for one event share a single transaction.

mod handlers;
mod ledger;

use std::sync::Arc;

use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

pub use handlers::Outcome;

use crate::entity::{EmailStatus, email_event, email_send, post};
use crate::error::ProcessError;
use crate::webhook::{EmailEventKind, WebhookPayload};
use handlers::EventContext;

/// Result reported back to the webhook caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProcessResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A dispatch registered by the newsletter sending flow.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewEmailSend {
    pub resend_email_id: String,
    #[serde(default)]
    pub broadcast_id: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,
    pub subject: String,
    pub from_email: String,
    #[serde(default)]
    pub recipient_count: i32,
}

#[derive(Clone, Debug)]
pub struct EventProcessor {
    db: Arc<DatabaseConnection>,
}

impl EventProcessor {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Processes one webhook event. Never fails: errors are logged and
    /// reported in the returned [`ProcessResult`].
    #[tracing::instrument(skip(self, payload), fields(email_id = %payload.data.email_id))]
    pub async fn process_email_event(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &WebhookPayload,
    ) -> ProcessResult {
        match self.try_process(event_id, event_type, payload).await {
            Ok(outcome) => {
                tracing::debug!(
                    name = "processor.process_email_event.done",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    event_id = %event_id,
                    event_type = %event_type,
                    outcome = ?outcome,
                    message = "Email event handled"
                );
                ProcessResult::ok()
            }
            Err(e @ ProcessError::SendNotFound { .. }) => {
                tracing::warn!(
                    name = "processor.process_email_event.send_not_found",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    event_id = %event_id,
                    event_type = %event_type,
                    email_id = %payload.data.email_id,
                    message = "No EmailSend for webhook email_id"
                );
                ProcessResult::failed(e.public_message())
            }
            Err(e) => {
                tracing::error!(
                    name = "processor.process_email_event.failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    event_id = %event_id,
                    event_type = %event_type,
                    email_id = %payload.data.email_id,
                    message = "Failed to process email event"
                );
                ProcessResult::failed(e.public_message())
            }
        }
    }

    /// Same as [`Self::process_email_event`] but surfaces the typed error.
    pub async fn try_process(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &WebhookPayload,
    ) -> Result<Outcome, ProcessError> {
        let db = self.db.as_ref();

        let seen = email_event::Entity::find()
            .filter(email_event::Column::EventId.eq(event_id))
            .one(db)
            .await?;
        if seen.is_some() {
            return Ok(Outcome::Duplicate);
        }

        let send = email_send::Entity::find()
            .filter(email_send::Column::ResendEmailId.eq(payload.data.email_id.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| ProcessError::SendNotFound {
                email_id: payload.data.email_id.clone(),
            })?;

        let kind = EmailEventKind::decode(event_type, payload);
        let ctx = EventContext {
            send: &send,
            event_id,
            kind: &kind,
            recipient: payload.recipient(),
            raw_payload: payload.audit_json()?,
            now: OffsetDateTime::now_utc(),
        };

        let txn = db.begin().await?;
        let outcome = handlers::apply(&txn, &ctx).await?;
        if outcome == Outcome::Duplicate {
            txn.rollback().await?;
        } else {
            txn.commit().await?;
        }
        Ok(outcome)
    }

    /// Registers a new dispatch so later webhooks can be correlated to it.
    /// When linked to a post, its `emails_sent` grows by `recipient_count`.
    #[tracing::instrument(skip(self, new), fields(resend_email_id = %new.resend_email_id, post_id = ?new.post_id))]
    pub async fn create_email_send_record(&self, new: NewEmailSend) -> Result<String, ProcessError> {
        let id = uuid::Uuid::new_v4().to_string();
        let model = email_send::ActiveModel {
            id: Set(id.clone()),
            resend_email_id: Set(new.resend_email_id),
            broadcast_id: Set(new.broadcast_id),
            post_id: Set(new.post_id.clone()),
            subject: Set(new.subject),
            from_email: Set(new.from_email),
            recipient_count: Set(new.recipient_count),
            status: Set(EmailStatus::Sent),
            sent_at: Set(OffsetDateTime::now_utc()),
            delivered_at: Set(None),
            opened_at: Set(None),
            clicked_at: Set(None),
            bounced_at: Set(None),
            last_event_at: Set(None),
        };

        let txn = self.db.begin().await?;
        email_send::Entity::insert(model)
            .exec_without_returning(&txn)
            .await?;
        if let Some(post_id) = new.post_id.as_deref() {
            ledger::increment_post(
                &txn,
                post_id,
                &[post::Column::EmailsSent],
                new.recipient_count,
            )
            .await?;
        }
        txn.commit().await?;

        tracing::info!(
            name = "processor.create_email_send_record.done",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            email_send_id = %id,
            message = "Registered email send"
        );
        Ok(id)
    }
}
