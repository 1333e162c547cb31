//! Read-only reporting over the send ledger and post counters.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{EmailStatus, email_recipient, email_send, post};

#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct EmailAnalyticsOverview {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_opened: u64,
    pub total_clicked: u64,
    pub total_bounced: u64,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub bounce_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct NewsletterPerformance {
    pub post_id: String,
    pub total_sent: i64,
    pub delivered: i64,
    pub opened: i64,
    pub unique_opens: i64,
    pub clicked: i64,
    pub bounced: i64,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub bounce_rate: f64,
}

/// `part` as a percentage of `total`, treating an empty total as one.
pub fn percentage(part: f64, total: f64) -> f64 {
    100.0 * part / total.max(1.0)
}

#[tracing::instrument(skip(db))]
pub async fn fetch_email_analytics_overview(
    db: &DatabaseConnection,
) -> Result<EmailAnalyticsOverview, DbErr> {
    let sends = || email_send::Entity::find();

    let total_sent = sends().count(db).await?;
    let total_delivered = sends()
        .filter(email_send::Column::Status.is_in(EmailStatus::DELIVERED_OR_BETTER))
        .count(db)
        .await?;
    let total_opened = sends()
        .filter(email_send::Column::Status.is_in(EmailStatus::OPENED_OR_BETTER))
        .count(db)
        .await?;
    let total_clicked = sends()
        .filter(email_send::Column::Status.eq(EmailStatus::Clicked))
        .count(db)
        .await?;
    let total_bounced = sends()
        .filter(email_send::Column::Status.eq(EmailStatus::Bounced))
        .count(db)
        .await?;

    let sent = total_sent as f64;
    Ok(EmailAnalyticsOverview {
        total_sent,
        total_delivered,
        total_opened,
        total_clicked,
        total_bounced,
        delivery_rate: percentage(total_delivered as f64, sent),
        open_rate: percentage(total_opened as f64, sent),
        click_rate: percentage(total_clicked as f64, sent),
        bounce_rate: percentage(total_bounced as f64, sent),
    })
}

/// Performance of one newsletter, or `None` if it was never sent.
///
/// Totals come from the post's rolling counters; clicks and bounces are
/// counted on the recipients of its first send.
#[tracing::instrument(skip(db))]
pub async fn fetch_newsletter_performance(
    db: &DatabaseConnection,
    post_id: &str,
) -> Result<Option<NewsletterPerformance>, DbErr> {
    let Some(first_send) = email_send::Entity::find()
        .filter(email_send::Column::PostId.eq(post_id))
        .order_by_asc(email_send::Column::SentAt)
        .order_by_asc(email_send::Column::Id)
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    let Some(post) = post::Entity::find_by_id(post_id.to_string()).one(db).await? else {
        return Ok(None);
    };

    let recipients = || {
        email_recipient::Entity::find()
            .filter(email_recipient::Column::EmailSendId.eq(first_send.id.as_str()))
    };
    let clicked = recipients()
        .filter(email_recipient::Column::Clicked.eq(true))
        .count(db)
        .await? as i64;
    let bounced = recipients()
        .filter(email_recipient::Column::Bounced.eq(true))
        .count(db)
        .await? as i64;

    let sent = f64::from(post.emails_sent);
    Ok(Some(NewsletterPerformance {
        post_id: post.id,
        total_sent: post.emails_sent.into(),
        delivered: post.emails_delivered.into(),
        opened: post.emails_opened.into(),
        unique_opens: post.unique_opens.into(),
        clicked,
        bounced,
        delivery_rate: percentage(f64::from(post.emails_delivered), sent),
        open_rate: percentage(f64::from(post.unique_opens), sent),
        click_rate: percentage(clicked as f64, sent),
        bounce_rate: percentage(bounced as f64, sent),
    }))
}
