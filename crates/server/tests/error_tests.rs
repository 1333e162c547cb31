use email_analytics::error::{ProcessError, SignatureError, WebhookError};
use email_analytics::webhook::WebhookPayload;
use hyper::StatusCode;

#[test]
fn test_process_error_display_and_public_message() {
    let not_found = ProcessError::SendNotFound {
        email_id: "r-1".to_string(),
    };
    assert_eq!(not_found.to_string(), "EmailSend record not found");
    assert_eq!(not_found.public_message(), "EmailSend record not found");

    let db_err = ProcessError::from(sea_orm::DbErr::Custom("connection reset".to_string()));
    assert!(db_err.to_string().contains("connection reset"));
    // internal details are never handed to the caller
    assert_eq!(db_err.public_message(), "Failed to process event");
}

#[test]
fn test_signature_error_display() {
    assert_eq!(
        SignatureError::MissingHeader("svix-id").to_string(),
        "Missing header: svix-id"
    );
    assert!(
        SignatureError::TimestampOutOfTolerance { skew_secs: -900 }
            .to_string()
            .contains("-900s")
    );
    assert_eq!(SignatureError::Mismatch.to_string(), "No matching signature");
}

#[test]
fn test_webhook_error_status_codes() {
    let missing: WebhookError = SignatureError::MissingHeader("svix-id").into();
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

    for err in [
        SignatureError::Mismatch,
        SignatureError::InvalidTimestamp("soon".into()),
        SignatureError::TimestampOutOfTolerance { skew_secs: 301 },
    ] {
        assert_eq!(WebhookError::from(err).status_code(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(
        WebhookError::MissingField("data.email_id").status_code(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_payload_decoding_errors() {
    match WebhookPayload::from_slice(b"{\"type\":") {
        Err(e @ WebhookError::InvalidJson(_)) => {
            assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
            assert!(e.to_string().starts_with("Invalid JSON body"));
        }
        other => panic!("Unexpected result: {other:?}"),
    }

    let blank_id = br#"{"type":"email.sent","created_at":"2025-01-01T00:00:00Z","data":{"email_id":"  "}}"#;
    assert!(matches!(
        WebhookPayload::from_slice(blank_id),
        Err(WebhookError::MissingField("data.email_id"))
    ));
}
