//! Webhook signature verification.
//!
//! The provider signs each delivery Svix-style: the signed content is
//! `"{svix-id}.{svix-timestamp}.{body}"`, HMAC-SHA256 keyed with the base64
//! part of a `whsec_...` secret, and `svix-signature` carries one or more
//! space-separated `v1,<base64>` entries (several during key rotation).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";

#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Builds a verifier from a `whsec_<base64>` secret. The prefix is optional.
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, SignatureError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret("empty key".into()));
        }
        Ok(Self {
            key,
            tolerance_secs,
        })
    }

    pub fn verify(
        &self,
        msg_id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        self.verify_at(
            msg_id,
            timestamp,
            signature_header,
            body,
            OffsetDateTime::now_utc(),
        )
    }

    pub fn verify_at(
        &self,
        msg_id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
        now: OffsetDateTime,
    ) -> Result<(), SignatureError> {
        let ts: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_string()))?;
        // `ts` is caller controlled; an overflowing skew is out of any window
        let skew = now.unix_timestamp().checked_sub(ts).ok_or(
            SignatureError::TimestampOutOfTolerance {
                skew_secs: if ts < 0 { i64::MAX } else { i64::MIN },
            },
        )?;
        if skew.unsigned_abs() > self.tolerance_secs {
            return Err(SignatureError::TimestampOutOfTolerance { skew_secs: skew });
        }

        for entry in signature_header.split_whitespace() {
            let Some((version, sig)) = entry.split_once(',') else {
                continue;
            };
            if version != "v1" {
                continue;
            }
            let Ok(sig_bytes) = STANDARD.decode(sig) else {
                continue;
            };
            // verify_slice compares in constant time
            if self.mac(msg_id, ts, body)?.verify_slice(&sig_bytes).is_ok() {
                return Ok(());
            }
        }
        Err(SignatureError::Mismatch)
    }

    /// Produces a `v1,<base64>` signature entry for the given message.
    pub fn sign(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
        let tag = self.mac(msg_id, timestamp, body)?.finalize().into_bytes();
        Ok(format!("v1,{}", STANDARD.encode(tag)))
    }

    fn mac(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}
