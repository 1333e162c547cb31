use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

use crate::signature::WebhookVerifier;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Deserialize)]
pub struct WebhookConfig {
    /// `whsec_...` secret from the provider dashboard. Unset disables verification.
    #[serde(default)]
    pub signing_secret: Option<String>,
    /// Maximum allowed clock skew for `svix-timestamp`, in seconds.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            tolerance_secs: default_tolerance_secs(),
        }
    }
}

impl WebhookConfig {
    /// Builds the verifier, or `None` when no secret is configured.
    pub fn verifier(&self) -> Result<Option<WebhookVerifier>, ConfigError> {
        match self.signing_secret.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(secret) => WebhookVerifier::new(secret, self.tolerance_secs)
                .map(Some)
                .map_err(|e| ConfigError::Validation(format!("webhook.signing_secret: {e}"))),
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct EngagementConfig {
    /// Interval of the background recalculation over all subscribed members.
    /// 0 disables the task.
    #[serde(default)]
    pub batch_interval_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub engagement: EngagementConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Validation("database_url must be set".into()));
        }
        self.listen_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Validation(format!("listen_addr '{}': {e}", self.listen_addr))
        })?;
        if self.webhook.tolerance_secs == 0 {
            return Err(ConfigError::Validation(
                "webhook.tolerance_secs must be > 0".into(),
            ));
        }
        self.webhook.verifier()?;
        Ok(())
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_tolerance_secs() -> u64 {
    300
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any var matching the key path separated by double underscores
/// (e.g. `WEBHOOK__SIGNING_SECRET`) overrides the file value.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

/// Same as [`load_config`] with an explicit file path. The file may be absent
/// when everything is supplied through the environment.
pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
