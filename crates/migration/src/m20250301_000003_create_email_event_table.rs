use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Append-only webhook audit log. The unique `event_id` is the idempotency key.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailEvent::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailEvent::EmailSendId).string().not_null())
                    .col(ColumnDef::new(EmailEvent::EventType).string().not_null())
                    .col(
                        ColumnDef::new(EmailEvent::EventId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(EmailEvent::RecipientEmail).string().null())
                    .col(ColumnDef::new(EmailEvent::LinkUrl).text().null())
                    .col(ColumnDef::new(EmailEvent::RawPayload).text().not_null())
                    .col(
                        ColumnDef::new(EmailEvent::ProcessedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_email_event_email_send_id")
                    .table(EmailEvent::Table)
                    .col(EmailEvent::EmailSendId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailEvent::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum EmailEvent {
    Table,
    Id,
    EmailSendId,
    EventType,
    EventId,
    RecipientEmail,
    LinkUrl,
    RawPayload,
    ProcessedAt,
}
