//! Inbound webhook payloads from the email provider.
//!
//! The provider posts a JSON envelope with a `type` string such as
//! `email.delivered`. It is decoded here into [`EmailEventKind`] so the
//! processor only ever sees the five known kinds plus a catch-all.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::WebhookError;

/// Raw webhook envelope as posted by the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub created_at: String,
    pub data: WebhookData,
    /// Request body as received. Set by [`WebhookPayload::from_slice`].
    #[serde(skip)]
    pub raw_body: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookData {
    /// Correlates to `email_send.resend_email_id`.
    pub email_id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClickData {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl WebhookPayload {
    /// Decodes a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        let mut payload: WebhookPayload = serde_json::from_slice(body)?;
        if payload.data.email_id.trim().is_empty() {
            return Err(WebhookError::MissingField("data.email_id"));
        }
        payload.raw_body = Some(String::from_utf8_lossy(body).into_owned());
        Ok(payload)
    }

    /// JSON kept in the audit log. Fields this type does not model survive
    /// only when the payload came from [`WebhookPayload::from_slice`].
    pub fn audit_json(&self) -> Result<String, serde_json::Error> {
        match &self.raw_body {
            Some(raw) => Ok(raw.clone()),
            None => serde_json::to_string(self),
        }
    }

    /// The recipient address this event concerns, normalized for lookups.
    ///
    /// Only the first `to` entry is considered.
    pub fn recipient(&self) -> Option<String> {
        self.data
            .to
            .first()
            .map(|addr| normalize_email(addr))
            .filter(|addr| !addr.is_empty())
    }
}

/// Lowercases and trims an address so ledger keys and member lookups agree.
pub fn normalize_email(addr: &str) -> String {
    addr.trim().to_lowercase()
}

/// The kinds of delivery outcome the ledger understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmailEventKind {
    Delivered,
    Opened,
    Clicked { link: Option<String> },
    Bounced,
    Complained,
    /// Any other provider type. Audited, never applied.
    Unknown(String),
}

impl EmailEventKind {
    /// Decodes an event type (`email.opened` or plain `opened`) against its payload.
    pub fn decode(event_type: &str, payload: &WebhookPayload) -> Self {
        let bare = event_type.strip_prefix("email.").unwrap_or(event_type);
        match bare {
            "delivered" => EmailEventKind::Delivered,
            "opened" => EmailEventKind::Opened,
            "clicked" => EmailEventKind::Clicked {
                link: payload.data.click.as_ref().and_then(|c| c.link.clone()),
            },
            "bounced" => EmailEventKind::Bounced,
            "complained" => EmailEventKind::Complained,
            _ => EmailEventKind::Unknown(event_type.to_string()),
        }
    }

    /// Value stored in `email_event.event_type`.
    pub fn as_str(&self) -> &str {
        match self {
            EmailEventKind::Delivered => "delivered",
            EmailEventKind::Opened => "opened",
            EmailEventKind::Clicked { .. } => "clicked",
            EmailEventKind::Bounced => "bounced",
            EmailEventKind::Complained => "complained",
            EmailEventKind::Unknown(raw) => raw,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            EmailEventKind::Clicked { link } => link.as_deref(),
            _ => None,
        }
    }
}
