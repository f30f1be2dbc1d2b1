use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
/// OpenAPI documentation for Atelier Studio Service
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atelier Studio Service API",
        version = "1.0.0",
        description = "Content studio backend for multi-brand social publishing. Manages brands, connected social accounts, hashtag presets, media uploads, and content items composed, scheduled, and published across Instagram, Facebook, TikTok, LinkedIn, X, YouTube, and Pinterest.",
        contact(
            name = "Atelier Team",
            email = "support@atelier.dev"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8084", description = "Development server"),
        (url = "https://api.atelier.dev", description = "Production server"),
    ),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "brands", description = "Brand lifecycle, profile, and publishing defaults"),
        (name = "social-accounts", description = "Connected platform accounts and the OAuth popup flow"),
        (name = "hashtag-presets", description = "Reusable tag sets per brand"),
        (name = "media", description = "Presigned direct uploads"),
        (name = "content", description = "Compose, schedule, publish, and archive content"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn title() -> &'static str {
        "Atelier Studio Service"
    }

    pub fn version() -> &'static str {
        "1.0.0"
    }

    pub fn openapi_json_path() -> &'static str {
        "/v1/openapi.json"
    }
}
