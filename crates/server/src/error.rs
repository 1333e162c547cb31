use hyper::StatusCode;
use thiserror::Error;

/// Reported when the processor cannot apply an event.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("EmailSend record not found")]
    SendNotFound { email_id: String },
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProcessError {
    /// Message handed back to the webhook caller. Internal details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProcessError::SendNotFound { .. } => "EmailSend record not found",
            ProcessError::Database(_) | ProcessError::Serialization(_) => {
                "Failed to process event"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Timestamp outside tolerance window ({skew_secs}s skew)")]
    TimestampOutOfTolerance { skew_secs: i64 },
    #[error("No matching signature")]
    Mismatch,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Signature(SignatureError::MissingHeader(_)) => StatusCode::BAD_REQUEST,
            WebhookError::Signature(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidJson(_) | WebhookError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
