//! Per-kind event handlers.
//!
//! Every handler follows the same order: audit row, send, recipient, member,
//! post. Member and post steps only run when the entity exists.

use sea_orm::{ActiveValue::Set, DatabaseTransaction, DbErr};
use time::OffsetDateTime;

use super::ledger::{self, RecipientChange, StatusWrite};
use crate::entity::{EmailStatus, email_event, email_send, member, post};
use crate::webhook::EmailEventKind;

/// Everything a handler needs about one inbound event.
pub(crate) struct EventContext<'a> {
    pub send: &'a email_send::Model,
    pub event_id: &'a str,
    pub kind: &'a EmailEventKind,
    pub recipient: Option<String>,
    pub raw_payload: String,
    pub now: OffsetDateTime,
}

/// Result of applying one event inside its transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Unknown kind, stored for audit only.
    Audited,
    /// Same `event_id` already stored.
    Duplicate,
}

pub(crate) async fn apply(txn: &DatabaseTransaction, ctx: &EventContext<'_>) -> Result<Outcome, DbErr> {
    let audit = email_event::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        email_send_id: Set(ctx.send.id.clone()),
        event_type: Set(ctx.kind.as_str().to_string()),
        event_id: Set(ctx.event_id.to_string()),
        recipient_email: Set(ctx.recipient.clone()),
        link_url: Set(ctx.kind.link().map(str::to_string)),
        raw_payload: Set(ctx.raw_payload.clone()),
        processed_at: Set(ctx.now),
    };
    if !ledger::record_event(txn, audit).await? {
        return Ok(Outcome::Duplicate);
    }

    match ctx.kind {
        EmailEventKind::Delivered => delivered(txn, ctx).await?,
        EmailEventKind::Opened => opened(txn, ctx).await?,
        EmailEventKind::Clicked { .. } => clicked(txn, ctx).await?,
        EmailEventKind::Bounced => bounced(txn, ctx).await?,
        EmailEventKind::Complained => complained(txn, ctx).await?,
        EmailEventKind::Unknown(_) => return Ok(Outcome::Audited),
    }
    Ok(Outcome::Applied)
}

async fn delivered(txn: &DatabaseTransaction, ctx: &EventContext<'_>) -> Result<(), DbErr> {
    ledger::update_send(
        txn,
        &ctx.send.id,
        EmailStatus::Delivered,
        StatusWrite::Always,
        Some(email_send::Column::DeliveredAt),
        ctx.now,
    )
    .await?;

    let Some(email) = ctx.recipient.as_deref() else {
        return Ok(());
    };
    let member = ledger::find_member(txn, email).await?;
    ledger::upsert_recipient(
        txn,
        &ctx.send.id,
        email,
        member.as_ref().map(|m| m.id.as_str()),
        RecipientChange {
            delivered: true,
            ..Default::default()
        },
        ctx.now,
    )
    .await?;
    if let Some(member) = member {
        ledger::increment_member(
            txn,
            &member.id,
            &[member::Column::TotalEmailsReceived],
            None,
        )
        .await?;
    }
    if let Some(post_id) = ctx.send.post_id.as_deref() {
        ledger::increment_post(txn, post_id, &[post::Column::EmailsDelivered], 1).await?;
    }
    Ok(())
}

async fn opened(txn: &DatabaseTransaction, ctx: &EventContext<'_>) -> Result<(), DbErr> {
    ledger::update_send(
        txn,
        &ctx.send.id,
        EmailStatus::Opened,
        StatusWrite::UnlessClicked,
        Some(email_send::Column::OpenedAt),
        ctx.now,
    )
    .await?;

    let Some(email) = ctx.recipient.as_deref() else {
        return Ok(());
    };
    let member = ledger::find_member(txn, email).await?;
    let member_id = member.as_ref().map(|m| m.id.as_str());
    // The row lock taken by the conditional flip decides which event is first.
    ledger::ensure_recipient(txn, &ctx.send.id, email, member_id, ctx.now).await?;
    let is_first_open = ledger::mark_first_open(txn, &ctx.send.id, email).await?;
    ledger::upsert_recipient(
        txn,
        &ctx.send.id,
        email,
        member_id,
        RecipientChange {
            opened: true,
            ..Default::default()
        },
        ctx.now,
    )
    .await?;
    if let Some(member) = member {
        ledger::increment_member(
            txn,
            &member.id,
            &[member::Column::TotalEmailsOpened],
            Some(ctx.now),
        )
        .await?;
    }
    if let Some(post_id) = ctx.send.post_id.as_deref() {
        let counters: &[post::Column] = if is_first_open {
            &[post::Column::EmailsOpened, post::Column::UniqueOpens]
        } else {
            &[post::Column::EmailsOpened]
        };
        ledger::increment_post(txn, post_id, counters, 1).await?;
    }
    Ok(())
}

async fn clicked(txn: &DatabaseTransaction, ctx: &EventContext<'_>) -> Result<(), DbErr> {
    ledger::update_send(
        txn,
        &ctx.send.id,
        EmailStatus::Clicked,
        StatusWrite::Always,
        Some(email_send::Column::ClickedAt),
        ctx.now,
    )
    .await?;

    let Some(email) = ctx.recipient.as_deref() else {
        return Ok(());
    };
    let member = ledger::find_member(txn, email).await?;
    ledger::upsert_recipient(
        txn,
        &ctx.send.id,
        email,
        member.as_ref().map(|m| m.id.as_str()),
        RecipientChange {
            clicked: true,
            ..Default::default()
        },
        ctx.now,
    )
    .await?;
    if let Some(member) = member {
        ledger::increment_member(
            txn,
            &member.id,
            &[member::Column::TotalEmailsClicked],
            None,
        )
        .await?;
    }
    Ok(())
}

async fn bounced(txn: &DatabaseTransaction, ctx: &EventContext<'_>) -> Result<(), DbErr> {
    ledger::update_send(
        txn,
        &ctx.send.id,
        EmailStatus::Bounced,
        StatusWrite::Always,
        Some(email_send::Column::BouncedAt),
        ctx.now,
    )
    .await?;

    let Some(email) = ctx.recipient.as_deref() else {
        return Ok(());
    };
    let member = ledger::find_member(txn, email).await?;
    ledger::upsert_recipient(
        txn,
        &ctx.send.id,
        email,
        member.as_ref().map(|m| m.id.as_str()),
        RecipientChange {
            bounced: true,
            ..Default::default()
        },
        ctx.now,
    )
    .await?;
    if let Some(member) = member {
        ledger::increment_member(txn, &member.id, &[member::Column::TotalBounces], None).await?;
    }
    Ok(())
}

async fn complained(txn: &DatabaseTransaction, ctx: &EventContext<'_>) -> Result<(), DbErr> {
    ledger::update_send(
        txn,
        &ctx.send.id,
        EmailStatus::Complained,
        StatusWrite::Always,
        None,
        ctx.now,
    )
    .await?;

    let Some(email) = ctx.recipient.as_deref() else {
        return Ok(());
    };
    if let Some(member) = ledger::find_member(txn, email).await? {
        ledger::unsubscribe_member(txn, &member.id).await?;
    }
    Ok(())
}
