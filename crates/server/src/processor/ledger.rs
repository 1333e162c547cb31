//! Store primitives used inside the per-event transaction.
//!
//! Counters are bumped in SQL (`c = c + 1`) and recipients are written with
//! `INSERT .. ON CONFLICT DO UPDATE`, so concurrent events for the same row
//! never lose an increment.

use sea_orm::sea_query::{Expr, Func, OnConflict, SimpleExpr};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, Order, QueryFilter,
    QueryOrder, SqlErr,
};
use time::OffsetDateTime;

use crate::entity::{EmailStatus, email_event, email_recipient, email_send, member, post};

/// Inserts the audit row. Returns `false` if another delivery with the same
/// `event_id` committed first.
pub(crate) async fn record_event<C: ConnectionTrait>(
    db: &C,
    model: email_event::ActiveModel,
) -> Result<bool, DbErr> {
    match email_event::Entity::insert(model)
        .exec_without_returning(db)
        .await
    {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(false),
        Err(e) => Err(e),
    }
}

/// How a status write treats the current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusWrite {
    Always,
    /// Leaves a `clicked` send untouched.
    UnlessClicked,
}

/// Updates the send for one event: status, `last_event_at`, and optionally a
/// first-write-wins timestamp column.
pub(crate) async fn update_send<C: ConnectionTrait>(
    db: &C,
    send_id: &str,
    status: EmailStatus,
    write: StatusWrite,
    first_seen: Option<email_send::Column>,
    now: OffsetDateTime,
) -> Result<(), DbErr> {
    email_send::Entity::update_many()
        .col_expr(email_send::Column::LastEventAt, Expr::value(now))
        .filter(email_send::Column::Id.eq(send_id))
        .exec(db)
        .await?;

    let mut status_update = email_send::Entity::update_many()
        .col_expr(email_send::Column::Status, Expr::value(status))
        .filter(email_send::Column::Id.eq(send_id));
    if write == StatusWrite::UnlessClicked {
        status_update = status_update.filter(email_send::Column::Status.ne(EmailStatus::Clicked));
    }
    status_update.exec(db).await?;

    if let Some(column) = first_seen {
        email_send::Entity::update_many()
            .col_expr(column, Expr::value(now))
            .filter(email_send::Column::Id.eq(send_id))
            .filter(column.is_null())
            .exec(db)
            .await?;
    }
    Ok(())
}

/// Flags an event sets on the recipient row.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RecipientChange {
    pub delivered: bool,
    pub opened: bool,
    pub clicked: bool,
    pub bounced: bool,
}

/// Inserts an all-false `(send, email)` row unless one exists.
pub(crate) async fn ensure_recipient<C: ConnectionTrait>(
    db: &C,
    send_id: &str,
    email: &str,
    member_id: Option<&str>,
    now: OffsetDateTime,
) -> Result<(), DbErr> {
    use email_recipient::Column as Col;

    let model = email_recipient::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        email_send_id: Set(send_id.to_string()),
        email: Set(email.to_string()),
        member_id: Set(member_id.map(str::to_string)),
        delivered: Set(false),
        opened: Set(false),
        clicked: Set(false),
        bounced: Set(false),
        open_count: Set(0),
        click_count: Set(0),
        first_opened_at: Set(None),
        last_opened_at: Set(None),
        created_at: Set(now),
    };
    email_recipient::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([Col::EmailSendId, Col::Email])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Flips `opened` on an existing recipient. Returns `true` only for the
/// event that performed the flip, so concurrent first opens count once.
pub(crate) async fn mark_first_open<C: ConnectionTrait>(
    db: &C,
    send_id: &str,
    email: &str,
) -> Result<bool, DbErr> {
    let result = email_recipient::Entity::update_many()
        .col_expr(email_recipient::Column::Opened, Expr::value(true))
        .filter(email_recipient::Column::EmailSendId.eq(send_id))
        .filter(email_recipient::Column::Email.eq(email))
        .filter(email_recipient::Column::Opened.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Creates the `(send, email)` row on first sight, otherwise applies `change`
/// on top of the stored row.
pub(crate) async fn upsert_recipient<C: ConnectionTrait>(
    db: &C,
    send_id: &str,
    email: &str,
    member_id: Option<&str>,
    change: RecipientChange,
    now: OffsetDateTime,
) -> Result<(), DbErr> {
    use email_recipient::Column as Col;

    let opened_at = change.opened.then_some(now);
    let model = email_recipient::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        email_send_id: Set(send_id.to_string()),
        email: Set(email.to_string()),
        member_id: Set(member_id.map(str::to_string)),
        delivered: Set(change.delivered),
        opened: Set(change.opened),
        clicked: Set(change.clicked),
        bounced: Set(change.bounced),
        open_count: Set(i32::from(change.opened)),
        click_count: Set(i32::from(change.clicked)),
        first_opened_at: Set(opened_at),
        last_opened_at: Set(opened_at),
        created_at: Set(now),
    };

    let mut on_conflict = OnConflict::columns([Col::EmailSendId, Col::Email]);
    on_conflict.value(
        Col::MemberId,
        coalesce(Col::MemberId, Expr::value(member_id.map(str::to_string))),
    );
    if change.delivered {
        on_conflict.value(Col::Delivered, Expr::value(true));
    }
    if change.opened {
        on_conflict
            .value(Col::Opened, Expr::value(true))
            .value(Col::OpenCount, increment_qualified(Col::OpenCount))
            .value(Col::FirstOpenedAt, coalesce(Col::FirstOpenedAt, Expr::value(now)))
            .value(Col::LastOpenedAt, Expr::value(now));
    }
    if change.clicked {
        on_conflict
            .value(Col::Clicked, Expr::value(true))
            .value(Col::ClickCount, increment_qualified(Col::ClickCount));
    }
    if change.bounced {
        on_conflict.value(Col::Bounced, Expr::value(true));
    }

    email_recipient::Entity::insert(model)
        .on_conflict(on_conflict.to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Resolves a subscriber by address, ignoring case.
///
/// `member.email` is only unique as stored, so an exact match on the
/// normalized address wins over other casings, then the lowest id.
pub(crate) async fn find_member<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<member::Model>, DbErr> {
    member::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(member::Column::Email))).eq(email))
        .order_by(Expr::col(member::Column::Email).eq(email), Order::Desc)
        .order_by_asc(member::Column::Id)
        .one(db)
        .await
}

/// Adds one to each listed member counter.
pub(crate) async fn increment_member<C: ConnectionTrait>(
    db: &C,
    member_id: &str,
    counters: &[member::Column],
    last_opened: Option<OffsetDateTime>,
) -> Result<(), DbErr> {
    let mut update = member::Entity::update_many().filter(member::Column::Id.eq(member_id));
    for &counter in counters {
        update = update.col_expr(counter, Expr::col(counter).add(1));
    }
    if let Some(at) = last_opened {
        update = update.col_expr(member::Column::LastEmailOpenedAt, Expr::value(at));
    }
    update.exec(db).await?;
    Ok(())
}

pub(crate) async fn unsubscribe_member<C: ConnectionTrait>(
    db: &C,
    member_id: &str,
) -> Result<(), DbErr> {
    member::Entity::update_many()
        .col_expr(member::Column::Unsubscribed, Expr::value(true))
        .filter(member::Column::Id.eq(member_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Adds `by` to each listed post counter. Missing posts are skipped silently.
pub(crate) async fn increment_post<C: ConnectionTrait>(
    db: &C,
    post_id: &str,
    counters: &[post::Column],
    by: i32,
) -> Result<(), DbErr> {
    if counters.is_empty() {
        return Ok(());
    }
    let mut update = post::Entity::update_many().filter(post::Column::Id.eq(post_id));
    for &counter in counters {
        update = update.col_expr(counter, Expr::col(counter).add(by));
    }
    update.exec(db).await?;
    Ok(())
}

fn increment_qualified(column: email_recipient::Column) -> SimpleExpr {
    Expr::col((email_recipient::Entity, column)).add(1)
}

fn coalesce(column: email_recipient::Column, fallback: SimpleExpr) -> SimpleExpr {
    Func::coalesce([
        SimpleExpr::from(Expr::col((email_recipient::Entity, column))),
        fallback,
    ])
    .into()
}
