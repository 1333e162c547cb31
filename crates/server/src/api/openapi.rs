//! OpenAPI/Utoipa configuration.

use crate::api::{
    analytics::ANALYTICS_TAG, health::MISC_TAG, members::MEMBERS_TAG, sends::SENDS_TAG,
    webhooks::WEBHOOKS_TAG,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Documents the provider signature header.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    #[tracing::instrument(skip(self, openapi))]
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "WebhookSignature",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "svix-signature",
                    "HMAC-SHA256 over `{svix-id}.{svix-timestamp}.{body}` with the webhook signing secret.",
                ))),
            );
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Email Analytics API",
        version = "1.0.0",
        description = "Email delivery event ingestion and newsletter engagement reporting."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = WEBHOOKS_TAG, description = "Email provider webhooks"),
        (name = SENDS_TAG, description = "Outbound send registration"),
        (name = ANALYTICS_TAG, description = "Delivery and engagement reporting"),
        (name = MEMBERS_TAG, description = "Subscriber engagement scoring")
    )
)]
pub struct ApiDoc;
