//! Email delivery analytics for a newsletter platform.
//!
//! Ingests delivery, open, click, bounce and complaint webhooks from the
//! email provider, applies each exactly once to the send/recipient ledger and
//! the post and member counters, and derives per-subscriber engagement scores.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::processor::EventProcessor;
use crate::signature::WebhookVerifier;

pub mod analytics;
pub mod api;
pub mod config;
pub mod engagement;
pub mod entity;
pub mod error;
pub mod processor;
pub mod signature;
pub mod webhook;

#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub processor: EventProcessor,
    /// `None` when no signing secret is configured.
    pub verifier: Option<Arc<WebhookVerifier>>,
}

impl AppResources {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
    ) -> Result<Self, config::ConfigError> {
        let verifier = config.webhook.verifier()?.map(Arc::new);
        Ok(Self {
            processor: EventProcessor::new(db.clone()),
            db,
            config,
            verifier,
        })
    }
}
