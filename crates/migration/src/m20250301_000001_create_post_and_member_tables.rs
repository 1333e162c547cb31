//! Minimal `post` and `member` tables.
//!
//! Both are owned by the authoring and member-management features; only the
//! columns the email analytics pipeline reads or writes are created here.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Post::Title).string().not_null())
                    .col(counter(Post::EmailsSent))
                    .col(counter(Post::EmailsDelivered))
                    .col(counter(Post::EmailsOpened))
                    .col(counter(Post::UniqueOpens))
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Member::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Member::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Member::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Member::Name).string().null())
                    .col(
                        ColumnDef::new(Member::Unsubscribed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(counter(Member::TotalEmailsReceived))
                    .col(counter(Member::TotalEmailsOpened))
                    .col(counter(Member::TotalEmailsClicked))
                    .col(counter(Member::TotalBounces))
                    .col(
                        ColumnDef::new(Member::LastEmailOpenedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Member::EngagementScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Member::OpenRate).string().null())
                    .col(
                        ColumnDef::new(Member::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Member::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

fn counter<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().default(0).to_owned()
}

#[derive(Iden)]
pub enum Post {
    Table,
    Id,
    Title,
    EmailsSent,
    EmailsDelivered,
    EmailsOpened,
    UniqueOpens,
    CreatedAt,
}

#[derive(Iden)]
pub enum Member {
    Table,
    Id,
    Email,
    Name,
    Unsubscribed,
    TotalEmailsReceived,
    TotalEmailsOpened,
    TotalEmailsClicked,
    TotalBounces,
    LastEmailOpenedAt,
    EngagementScore,
    OpenRate,
    CreatedAt,
}
