//! Subscriber engagement scoring.
//!
//! The score is a pure function of a member's current counters and the age
//! of their last open, so recalculating with unchanged data is a no-op.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::AppResources;
use crate::entity::member;

pub const MAX_SCORE: f64 = 100.0;

const OPEN_WEIGHT: f64 = 0.4;
const CLICK_WEIGHT: f64 = 0.6;

/// Member counters the score is derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngagementCounters {
    pub received: i32,
    pub opened: i32,
    pub clicked: i32,
    pub bounces: i32,
}

impl From<&member::Model> for EngagementCounters {
    fn from(m: &member::Model) -> Self {
        Self {
            received: m.total_emails_received,
            opened: m.total_emails_opened,
            clicked: m.total_emails_clicked,
            bounces: m.total_bounces,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct EngagementScore {
    /// Always within `0..=100`.
    pub score: f64,
    /// Open rate as a percentage, unformatted.
    pub open_rate: f64,
}

impl EngagementScore {
    /// Display form stored on the member, e.g. `"42.5%"`.
    pub fn open_rate_display(&self) -> String {
        format!("{:.1}%", self.open_rate)
    }
}

/// Computes the score for the given counters as of `now`.
pub fn compute_engagement(
    counters: EngagementCounters,
    last_opened_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> EngagementScore {
    let received = f64::from(counters.received.max(1));
    let open_rate = 100.0 * f64::from(counters.opened) / received;
    let click_rate = 100.0 * f64::from(counters.clicked) / received;
    let mut score = open_rate * OPEN_WEIGHT + click_rate * CLICK_WEIGHT;

    if counters.bounces > 0 {
        let bounce_rate = 100.0 * f64::from(counters.bounces) / received;
        score *= 1.0 - bounce_rate / 100.0;
    }

    if let Some(last) = last_opened_at {
        score *= recency_multiplier((now - last).whole_days());
    }

    let score = if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    };
    EngagementScore { score, open_rate }
}

fn recency_multiplier(days_since_open: i64) -> f64 {
    match days_since_open {
        d if d < 7 => 1.2,
        d if d < 30 => 1.1,
        d if d > 90 => 0.8,
        _ => 1.0,
    }
}

/// Recomputes and stores the score of one member.
///
/// Returns `None` without writing anything if the member does not exist.
#[tracing::instrument(skip(db))]
pub async fn recalculate_member_engagement(
    db: &DatabaseConnection,
    member_id: &str,
) -> Result<Option<EngagementScore>, DbErr> {
    let Some(model) = member::Entity::find_by_id(member_id.to_string())
        .one(db)
        .await?
    else {
        tracing::debug!(
            name = "engagement.recalculate_member.not_found",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            member_id = %member_id,
            message = "Member not found; skipping engagement recalculation"
        );
        return Ok(None);
    };
    persist(db, model, OffsetDateTime::now_utc()).await.map(Some)
}

/// Recomputes every subscribed member, one at a time. Returns how many were updated.
#[tracing::instrument(skip(db))]
pub async fn recalculate_all_member_engagement(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let members = member::Entity::find()
        .filter(member::Column::Unsubscribed.eq(false))
        .order_by_asc(member::Column::Id)
        .all(db)
        .await?;
    let now = OffsetDateTime::now_utc();
    let total = members.len();
    for model in members {
        persist(db, model, now).await?;
    }
    tracing::info!(
        name = "engagement.recalculate_all.done",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        members = total,
        message = "Recalculated member engagement"
    );
    Ok(total)
}

async fn persist(
    db: &DatabaseConnection,
    model: member::Model,
    now: OffsetDateTime,
) -> Result<EngagementScore, DbErr> {
    let result = compute_engagement(
        EngagementCounters::from(&model),
        model.last_email_opened_at,
        now,
    );
    let mut active: member::ActiveModel = model.into();
    active.engagement_score = Set(result.score);
    active.open_rate = Set(Some(result.open_rate_display()));
    active.update(db).await?;
    Ok(result)
}

/// Spawns the periodic batch recalculation if enabled in the configuration.
pub fn spawn_batch_task(resources: Arc<AppResources>) {
    let secs = resources.config.engagement.batch_interval_secs;
    if secs == 0 {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        loop {
            interval.tick().await;
            if let Err(e) = recalculate_all_member_engagement(&resources.db).await {
                tracing::warn!(
                    name = "engagement.batch_task.failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    message = "Batch engagement recalculation failed"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

    fn counters(received: i32, opened: i32, clicked: i32, bounces: i32) -> EngagementCounters {
        EngagementCounters {
            received,
            opened,
            clicked,
            bounces,
        }
    }

    #[test]
    fn weights_opens_and_clicks() {
        // 50% opens, 20% clicks: 50*0.4 + 20*0.6 = 32
        let r = compute_engagement(counters(10, 5, 2, 0), None, NOW);
        assert!((r.score - 32.0).abs() < 1e-9);
        assert_eq!(r.open_rate_display(), "50.0%");
    }

    #[test]
    fn zero_received_uses_one() {
        let r = compute_engagement(counters(0, 0, 0, 0), None, NOW);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.open_rate_display(), "0.0%");
    }

    #[test]
    fn bounces_scale_down() {
        // 32 * (1 - 0.1) = 28.8
        let r = compute_engagement(counters(10, 5, 2, 1), None, NOW);
        assert!((r.score - 28.8).abs() < 1e-9);
    }

    #[test]
    fn recency_brackets() {
        let c = counters(10, 5, 2, 0);
        let at = |days: i64| Some(NOW - time::Duration::days(days));
        assert!((compute_engagement(c, at(0), NOW).score - 38.4).abs() < 1e-9);
        assert!((compute_engagement(c, at(6), NOW).score - 38.4).abs() < 1e-9);
        assert!((compute_engagement(c, at(7), NOW).score - 35.2).abs() < 1e-9);
        assert!((compute_engagement(c, at(29), NOW).score - 35.2).abs() < 1e-9);
        assert!((compute_engagement(c, at(30), NOW).score - 32.0).abs() < 1e-9);
        assert!((compute_engagement(c, at(90), NOW).score - 32.0).abs() < 1e-9);
        assert!((compute_engagement(c, at(91), NOW).score - 25.6).abs() < 1e-9);
    }

    #[test]
    fn partial_days_round_down() {
        let c = counters(10, 5, 2, 0);
        let last = NOW - time::Duration::hours(7 * 24 - 1);
        assert!((compute_engagement(c, Some(last), NOW).score - 38.4).abs() < 1e-9);
    }

    #[test]
    fn clamped_to_bounds() {
        // opens and clicks above received, recent open: far above 100
        let high = compute_engagement(counters(1, 5, 5, 0), Some(NOW), NOW);
        assert_eq!(high.score, MAX_SCORE);
        // more bounces than deliveries drives the factor negative
        let low = compute_engagement(counters(1, 1, 1, 5), None, NOW);
        assert_eq!(low.score, 0.0);
    }

    #[test]
    fn always_in_range() {
        for received in [0, 1, 3, 50] {
            for opened in [0, 1, 7, 120] {
                for clicked in [0, 2, 60] {
                    for bounces in [0, 1, 4, 200] {
                        for days in [None, Some(0), Some(10), Some(45), Some(365), Some(-3)] {
                            let last = days.map(|d| NOW - time::Duration::days(d));
                            let r = compute_engagement(
                                counters(received, opened, clicked, bounces),
                                last,
                                NOW,
                            );
                            assert!((0.0..=MAX_SCORE).contains(&r.score), "{r:?}");
                        }
                    }
                }
            }
        }
    }
}
