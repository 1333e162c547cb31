//! One outbound dispatch registered with the email provider.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Delivery status of a send.
///
/// Moves forward as events arrive. `Opened` never replaces `Clicked`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "opened")]
    Opened,
    #[sea_orm(string_value = "clicked")]
    Clicked,
    #[sea_orm(string_value = "bounced")]
    Bounced,
    #[sea_orm(string_value = "complained")]
    Complained,
}

impl EmailStatus {
    /// Statuses that imply the message reached the inbox.
    pub const DELIVERED_OR_BETTER: [EmailStatus; 3] = [
        EmailStatus::Delivered,
        EmailStatus::Opened,
        EmailStatus::Clicked,
    ];

    /// Statuses that imply the message was opened.
    pub const OPENED_OR_BETTER: [EmailStatus; 2] = [EmailStatus::Opened, EmailStatus::Clicked];
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "email_send")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub resend_email_id: String,
    pub broadcast_id: Option<String>,
    pub post_id: Option<String>,
    pub subject: String,
    pub from_email: String,
    pub recipient_count: i32,
    pub status: EmailStatus,
    pub sent_at: OffsetDateTime,
    pub delivered_at: Option<OffsetDateTime>,
    pub opened_at: Option<OffsetDateTime>,
    pub clicked_at: Option<OffsetDateTime>,
    pub bounced_at: Option<OffsetDateTime>,
    pub last_event_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
