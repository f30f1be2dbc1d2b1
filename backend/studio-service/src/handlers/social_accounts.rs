/// Social account handlers - connect, inspect, disconnect, remove
///
/// The connect endpoint here takes tokens directly (for platforms where the
/// operator provisions a long-lived token by hand); the interactive path is
/// the OAuth popup flow in `handlers::oauth`. Responses always go through
/// `SocialAccountResponse`, which carries no credential material.
use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::models::SocialAccountResponse;
use crate::services::social_accounts::{ConnectAccount, SocialAccountService};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use credential_vault::{AccountCredentials, CredentialVault};
use platform_rules::Platform;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ConnectAccountRequest {
    pub brand_id: Uuid,
    pub platform: String,
    #[validate(length(min = 1))]
    pub external_id: String,
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[validate(length(min = 1))]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    pub brand_id: Option<Uuid>,
}

/// Connect a social account with caller-supplied tokens
/// POST /v1/social-accounts
pub async fn connect_account(
    pool: web::Data<PgPool>,
    vault: web::Data<Arc<CredentialVault>>,
    auth: AuthContext,
    req: web::Json<ConnectAccountRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let req = req.into_inner();
    let platform = Platform::from_str(&req.platform).ok_or_else(|| {
        AppError::ValidationError(format!("Unknown platform: {}", req.platform))
    })?;

    let service = SocialAccountService::new((**pool).clone(), vault.get_ref().clone());
    let account = service
        .connect_account(
            auth.workspace_id,
            auth.user_id,
            ConnectAccount {
                brand_id: req.brand_id,
                platform,
                external_id: req.external_id,
                display_name: req.display_name,
                avatar_url: req.avatar_url,
                credentials: AccountCredentials {
                    access_token: req.access_token,
                    refresh_token: req.refresh_token,
                    expires_at: req.expires_at,
                    scopes: req.scopes,
                },
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(SocialAccountResponse::from(account)))
}

/// List connected accounts, optionally narrowed to one brand
/// GET /v1/social-accounts?brand_id=
pub async fn list_accounts(
    pool: web::Data<PgPool>,
    vault: web::Data<Arc<CredentialVault>>,
    auth: AuthContext,
    query: web::Query<AccountListQuery>,
) -> Result<HttpResponse> {
    let service = SocialAccountService::new((**pool).clone(), vault.get_ref().clone());
    let accounts = service
        .list_accounts(auth.workspace_id, query.brand_id)
        .await?;

    let accounts: Vec<SocialAccountResponse> =
        accounts.into_iter().map(SocialAccountResponse::from).collect();

    Ok(HttpResponse::Ok().json(accounts))
}

/// Get a social account by ID
/// GET /v1/social-accounts/{id}
pub async fn get_account(
    pool: web::Data<PgPool>,
    vault: web::Data<Arc<CredentialVault>>,
    auth: AuthContext,
    account_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = SocialAccountService::new((**pool).clone(), vault.get_ref().clone());
    let account = service.get_account(auth.workspace_id, *account_id).await?;

    Ok(HttpResponse::Ok().json(SocialAccountResponse::from(account)))
}

/// Disconnect an active account, keeping its history
/// POST /v1/social-accounts/{id}/disconnect
pub async fn disconnect_account(
    pool: web::Data<PgPool>,
    vault: web::Data<Arc<CredentialVault>>,
    auth: AuthContext,
    account_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = SocialAccountService::new((**pool).clone(), vault.get_ref().clone());
    let account = service
        .disconnect_account(auth.workspace_id, auth.user_id, *account_id)
        .await?;

    Ok(HttpResponse::Ok().json(SocialAccountResponse::from(account)))
}

/// Remove an account for good
/// POST /v1/social-accounts/{id}/remove
pub async fn remove_account(
    pool: web::Data<PgPool>,
    vault: web::Data<Arc<CredentialVault>>,
    auth: AuthContext,
    account_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = SocialAccountService::new((**pool).clone(), vault.get_ref().clone());
    let account = service
        .remove_account(auth.workspace_id, auth.user_id, *account_id)
        .await?;

    Ok(HttpResponse::Ok().json(SocialAccountResponse::from(account)))
}
