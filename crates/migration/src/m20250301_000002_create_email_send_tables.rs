//! Send ledger: one `email_send` per dispatch, one `email_recipient` per
//! `(send, address)` pair.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailSend::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailSend::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailSend::ResendEmailId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(EmailSend::BroadcastId).string().null())
                    .col(ColumnDef::new(EmailSend::PostId).string().null())
                    .col(ColumnDef::new(EmailSend::Subject).string().not_null())
                    .col(ColumnDef::new(EmailSend::FromEmail).string().not_null())
                    .col(
                        ColumnDef::new(EmailSend::RecipientCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EmailSend::Status)
                            .text()
                            .not_null()
                            .default("sent")
                            .comment("sent, delivered, opened, clicked, bounced or complained"),
                    )
                    .col(
                        ColumnDef::new(EmailSend::SentAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_null(EmailSend::DeliveredAt))
                    .col(timestamp_null(EmailSend::OpenedAt))
                    .col(timestamp_null(EmailSend::ClickedAt))
                    .col(timestamp_null(EmailSend::BouncedAt))
                    .col(timestamp_null(EmailSend::LastEventAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_send_post_id")
                    .table(EmailSend::Table)
                    .col(EmailSend::PostId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_email_send_status")
                    .table(EmailSend::Table)
                    .col(EmailSend::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailRecipient::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailRecipient::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailRecipient::EmailSendId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailRecipient::Email).string().not_null())
                    .col(ColumnDef::new(EmailRecipient::MemberId).string().null())
                    .col(flag(EmailRecipient::Delivered))
                    .col(flag(EmailRecipient::Opened))
                    .col(flag(EmailRecipient::Clicked))
                    .col(flag(EmailRecipient::Bounced))
                    .col(
                        ColumnDef::new(EmailRecipient::OpenCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EmailRecipient::ClickCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(timestamp_null(EmailRecipient::FirstOpenedAt))
                    .col(timestamp_null(EmailRecipient::LastOpenedAt))
                    .col(
                        ColumnDef::new(EmailRecipient::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_recipient_email_send")
                            .from(EmailRecipient::Table, EmailRecipient::EmailSendId)
                            .to(EmailSend::Table, EmailSend::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Upserts conflict on this key
        manager
            .create_index(
                Index::create()
                    .name("idx_email_recipient_send_email_unique")
                    .table(EmailRecipient::Table)
                    .col(EmailRecipient::EmailSendId)
                    .col(EmailRecipient::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_email_recipient_member_id")
                    .table(EmailRecipient::Table)
                    .col(EmailRecipient::MemberId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailRecipient::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmailSend::Table).to_owned())
            .await
    }
}

fn timestamp_null<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .null()
        .to_owned()
}

fn flag<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .boolean()
        .not_null()
        .default(false)
        .to_owned()
}

#[derive(Iden)]
pub enum EmailSend {
    Table,
    Id,
    ResendEmailId,
    BroadcastId,
    PostId,
    Subject,
    FromEmail,
    RecipientCount,
    Status,
    SentAt,
    DeliveredAt,
    OpenedAt,
    ClickedAt,
    BouncedAt,
    LastEventAt,
}

#[derive(Iden)]
pub enum EmailRecipient {
    Table,
    Id,
    EmailSendId,
    Email,
    MemberId,
    Delivered,
    Opened,
    Clicked,
    Bounced,
    OpenCount,
    ClickCount,
    FirstOpenedAt,
    LastOpenedAt,
    CreatedAt,
}
