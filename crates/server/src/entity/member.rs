use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    pub unsubscribed: bool,
    pub total_emails_received: i32,
    pub total_emails_opened: i32,
    pub total_emails_clicked: i32,
    pub total_bounces: i32,
    pub last_email_opened_at: Option<OffsetDateTime>,
    pub engagement_score: f64,
    pub open_rate: Option<String>, // e.g. "42.5%"
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
