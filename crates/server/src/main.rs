use email_analytics::AppResources;
use email_analytics::api::start_webserver;
use email_analytics::config::load_config_or_panic;
use email_analytics::engagement;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "email_analytics=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    initialize_tracing();

    let config = Arc::new(load_config_or_panic());

    let db = Arc::new(Database::connect(&config.database_url).await?);

    let resources = Arc::new(AppResources::new(db, config)?);
    tracing::info!(
        name = "main.config_loaded",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        listen_addr = %resources.config.listen_addr,
        signature_verification = resources.verifier.is_some(),
        engagement_batch_interval_secs = resources.config.engagement.batch_interval_secs,
        message = "Email analytics configuration"
    );
    if resources.verifier.is_none() {
        tracing::warn!(
            name = "main.signature_verification_disabled",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            message = "webhook.signing_secret is not set; webhook signatures will not be verified"
        );
    }

    engagement::spawn_batch_task(resources.clone());

    start_webserver((*resources).clone()).await?;
    Ok(())
}
