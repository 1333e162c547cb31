mod common;

use common::{create_member, setup_test_db};
use email_analytics::engagement::{
    recalculate_all_member_engagement, recalculate_member_engagement,
};
use email_analytics::entity::member;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

async fn set_counters(
    db: &DatabaseConnection,
    id: &str,
    received: i32,
    opened: i32,
    clicked: i32,
    bounces: i32,
    last_opened: Option<OffsetDateTime>,
) {
    let model = member::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: member::ActiveModel = model.into();
    active.total_emails_received = Set(received);
    active.total_emails_opened = Set(opened);
    active.total_emails_clicked = Set(clicked);
    active.total_bounces = Set(bounces);
    active.last_email_opened_at = Set(last_opened);
    active.update(db).await.unwrap();
}

async fn load(db: &DatabaseConnection, id: &str) -> member::Model {
    member::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn persists_score_and_open_rate() {
    let db = setup_test_db().await;
    create_member(&db, "m-1", "a@x.com").await;
    set_counters(&db, "m-1", 10, 5, 2, 0, None).await;

    let score = recalculate_member_engagement(&db, "m-1")
        .await
        .unwrap()
        .expect("member exists");
    assert!((score.score - 32.0).abs() < 1e-9);

    let m = load(&db, "m-1").await;
    assert!((m.engagement_score - 32.0).abs() < 1e-9);
    assert_eq!(m.open_rate.as_deref(), Some("50.0%"));
}

#[tokio::test]
async fn recent_open_boosts_score() {
    let db = setup_test_db().await;
    create_member(&db, "m-1", "a@x.com").await;
    set_counters(&db, "m-1", 10, 5, 2, 0, Some(OffsetDateTime::now_utc())).await;

    recalculate_member_engagement(&db, "m-1").await.unwrap();
    let m = load(&db, "m-1").await;
    assert!((m.engagement_score - 38.4).abs() < 1e-9);
}

#[tokio::test]
async fn recalculation_is_stable() {
    let db = setup_test_db().await;
    create_member(&db, "m-1", "a@x.com").await;
    set_counters(&db, "m-1", 4, 3, 1, 1, None).await;

    let first = recalculate_member_engagement(&db, "m-1").await.unwrap();
    let second = recalculate_member_engagement(&db, "m-1").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_member_is_not_an_error() {
    let db = setup_test_db().await;
    assert_eq!(recalculate_member_engagement(&db, "nobody").await.unwrap(), None);
}

#[tokio::test]
async fn batch_skips_unsubscribed_members() {
    let db = setup_test_db().await;
    create_member(&db, "m-1", "a@x.com").await;
    create_member(&db, "m-2", "b@x.com").await;
    let gone = create_member(&db, "m-3", "c@x.com").await;
    set_counters(&db, "m-1", 2, 2, 0, 0, None).await;
    set_counters(&db, "m-2", 2, 0, 0, 0, None).await;
    set_counters(&db, "m-3", 2, 2, 2, 0, None).await;

    let mut active: member::ActiveModel = load(&db, &gone.id).await.into();
    active.unsubscribed = Set(true);
    active.update(db.as_ref()).await.unwrap();

    let updated = recalculate_all_member_engagement(&db).await.unwrap();
    assert_eq!(updated, 2);

    assert!((load(&db, "m-1").await.engagement_score - 40.0).abs() < 1e-9);
    assert_eq!(load(&db, "m-2").await.open_rate.as_deref(), Some("0.0%"));
    let untouched = load(&db, "m-3").await;
    assert_eq!(untouched.engagement_score, 0.0);
    assert_eq!(untouched.open_rate, None);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn recalculation_logs_are_structured() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let db = setup_test_db().await;
    create_member(&db, "m-1", "a@x.com").await;
    recalculate_member_engagement(&db, "nobody").await.unwrap();
    recalculate_all_member_engagement(&db).await.unwrap();

    let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(out.contains("engagement.recalculate_member.not_found"), "{out}");
    assert!(out.contains("member_id=nobody"), "{out}");
    assert!(out.contains("engagement.recalculate_all.done"), "{out}");
    assert!(out.contains("members=1"), "{out}");
}
