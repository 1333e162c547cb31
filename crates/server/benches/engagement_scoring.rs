use criterion::{Criterion, black_box, criterion_group, criterion_main};
use email_analytics::engagement::{EngagementCounters, compute_engagement};
use email_analytics::signature::WebhookVerifier;
use email_analytics::webhook::{EmailEventKind, WebhookPayload};
use time::{Duration, OffsetDateTime};

const SECRET: &str = "whsec_dGVzdC1zaWduaW5nLWtleS0wMTIzNDU2Nzg5YWJjZGVm";

const BODY: &[u8] = br#"{
    "type": "email.clicked",
    "created_at": "2025-03-01T10:00:00.000Z",
    "data": {
        "email_id": "4ef9a417-02e9-4d39-ad75-9611e0fcc33c",
        "from": "news@example.com",
        "to": ["reader@example.com"],
        "subject": "Weekly digest",
        "click": {"link": "https://blog.example.com/posts/hello", "timestamp": "2025-03-01T10:05:00.000Z"}
    }
}"#;

// CI-friendly benchmark configuration
fn is_ci_mode() -> bool {
    std::env::var("CI").is_ok() || std::env::var("QUICK_BENCH").is_ok()
}

fn benchmark_engagement_scoring(c: &mut Criterion) {
    let now = OffsetDateTime::now_utc();
    let counters = EngagementCounters {
        received: 120,
        opened: 64,
        clicked: 17,
        bounces: 2,
    };

    c.bench_function("compute_engagement_recent_open", |b| {
        let last = Some(now - Duration::days(3));
        b.iter(|| black_box(compute_engagement(black_box(counters), last, now)));
    });

    c.bench_function("compute_engagement_member_sweep", |b| {
        // roughly what one batch pass over a small list does in memory
        let members: Vec<(EngagementCounters, Option<OffsetDateTime>)> = (0..1_000)
            .map(|i| {
                let c = EngagementCounters {
                    received: i % 50,
                    opened: i % 37,
                    clicked: i % 11,
                    bounces: i % 5,
                };
                (c, (i % 3 != 0).then(|| now - Duration::days(i64::from(i % 120))))
            })
            .collect();
        b.iter(|| {
            for (c, last) in &members {
                black_box(compute_engagement(*c, *last, now));
            }
        });
    });
}

fn benchmark_webhook_ingress(c: &mut Criterion) {
    let verifier = WebhookVerifier::new(SECRET, 300).expect("valid secret");
    let ts = OffsetDateTime::now_utc().unix_timestamp();
    let signature = verifier.sign("msg_bench", ts, BODY).expect("sign");
    let ts = ts.to_string();

    c.bench_function("verify_signature", |b| {
        b.iter(|| {
            verifier
                .verify(black_box("msg_bench"), &ts, &signature, black_box(BODY))
                .expect("valid signature")
        });
    });

    c.bench_function("decode_payload", |b| {
        b.iter(|| {
            let payload = WebhookPayload::from_slice(black_box(BODY)).expect("valid body");
            black_box(EmailEventKind::decode(&payload.event_type, &payload))
        });
    });
}

fn configured() -> Criterion {
    if is_ci_mode() {
        Criterion::default()
            .sample_size(10)
            .warm_up_time(std::time::Duration::from_millis(200))
            .measurement_time(std::time::Duration::from_secs(1))
    } else {
        Criterion::default()
    }
}

criterion_group!(
    name = benches;
    config = configured();
    targets = benchmark_engagement_scoring, benchmark_webhook_ingress
);
criterion_main!(benches);
