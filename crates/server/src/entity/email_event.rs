//! Append-only audit log of every provider webhook applied to the ledger.
//!
//! `event_id` carries a unique constraint and is the only idempotency key.
//! Rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "email_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email_send_id: String,
    pub event_type: String, // "delivered", "opened", "clicked", "bounced", "complained" or the raw provider type
    #[sea_orm(unique)]
    pub event_id: String,
    pub recipient_email: Option<String>,
    pub link_url: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub raw_payload: String,
    pub processed_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
