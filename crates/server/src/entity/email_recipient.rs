//! Per-recipient outcome ledger, one row per `(email_send_id, email)`.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "email_recipient")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email_send_id: String,
    pub email: String,
    pub member_id: Option<String>,
    pub delivered: bool,
    pub opened: bool,
    pub clicked: bool,
    pub bounced: bool,
    pub open_count: i32,
    pub click_count: i32,
    pub first_opened_at: Option<OffsetDateTime>,
    pub last_opened_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
