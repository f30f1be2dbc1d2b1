/// OAuth handlers - popup connect flow endpoints
///
/// `authorize` runs inside the auth scope and returns the provider URL for
/// the popup. `callback` is mounted outside it: the popup redirect carries no
/// bearer token, the one-time state token is the credential. The callback
/// always answers 200 with an HTML page that `postMessage`s the outcome to
/// the opener, because the browser renders it, not an API client.
use crate::cache::StudioCache;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::services::oauth::{error_page, success_page};
use crate::services::OAuthService;
use actix_web::{web, HttpResponse};
use credential_vault::CredentialVault;
use platform_rules::Platform;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub brand_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub authorize_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn parse_platform(raw: &str) -> Result<Platform> {
    Platform::from_str(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown platform: {raw}")))
}

/// Start the OAuth connect flow for a platform
/// GET /v1/oauth/{platform}/authorize?brand_id=
pub async fn oauth_authorize(
    pool: web::Data<PgPool>,
    redis: web::Data<Arc<Mutex<ConnectionManager>>>,
    vault: web::Data<Arc<CredentialVault>>,
    config: web::Data<Config>,
    auth: AuthContext,
    platform: web::Path<String>,
    query: web::Query<AuthorizeQuery>,
) -> Result<HttpResponse> {
    let platform = parse_platform(&platform)?;

    let service = OAuthService::new(
        (**pool).clone(),
        redis.get_ref().clone(),
        vault.get_ref().clone(),
        config.oauth.redirect_base_url.clone(),
    );
    let authorize_url = service
        .start_connect(auth.workspace_id, auth.user_id, platform, query.brand_id)
        .await?;

    Ok(HttpResponse::Ok().json(AuthorizeResponse { authorize_url }))
}

/// Provider redirect target for the popup
/// GET /v1/oauth/{platform}/callback
pub async fn oauth_callback(
    pool: web::Data<PgPool>,
    redis: web::Data<Arc<Mutex<ConnectionManager>>>,
    vault: web::Data<Arc<CredentialVault>>,
    cache: web::Data<Arc<StudioCache>>,
    config: web::Data<Config>,
    platform: web::Path<String>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let query = query.into_inner();

    let page = if let Some(error) = query.error {
        let message = query.error_description.unwrap_or(error);
        error_page("oauth_denied", &message)
    } else if parse_platform(&platform).is_err() {
        error_page("bad_request", &format!("Unknown platform: {platform}"))
    } else if let (Some(state), Some(code)) = (query.state.as_deref(), query.code.as_deref()) {
        let service = OAuthService::with_cache(
            (**pool).clone(),
            redis.get_ref().clone(),
            vault.get_ref().clone(),
            config.oauth.redirect_base_url.clone(),
            cache.get_ref().clone(),
        );
        match service.complete_connect(state, code).await {
            Ok(account) => {
                tracing::info!(
                    account_id = %account.id,
                    platform = %account.platform,
                    "OAuth connect completed"
                );
                success_page()
            }
            Err(err) => {
                tracing::warn!(platform = %platform, "OAuth connect failed: {}", err);
                error_page(err.code(), &err.to_string())
            }
        }
    } else {
        error_page("bad_request", "Missing state or code parameter")
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}
