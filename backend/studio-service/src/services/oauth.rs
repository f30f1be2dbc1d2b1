//! OAuth connect flow for social accounts.
//!
//! The composer opens a popup on the provider's authorize URL; the provider
//! redirects back to our callback, which exchanges the code, fetches the
//! external profile, and hands the tokens to `SocialAccountService`. The
//! `state` token is the only credential crossing the popup boundary: it is
//! random, stored in Redis with a 10-minute TTL, and consumed on first use.

use crate::cache::StudioCache;
use crate::db::brand_repo;
use crate::error::{AppError, Result};
use crate::models::{BrandStatus, SocialAccount};
use crate::services::social_accounts::{ConnectAccount, SocialAccountService};
use chrono::{DateTime, Duration, Utc};
use credential_vault::{AccountCredentials, CredentialVault};
use platform_rules::Platform;
use redis::aio::ConnectionManager;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// State tokens outlive one redirect round trip, nothing more.
const STATE_TTL_SECONDS: u64 = 600;

fn state_key(state: &str) -> String {
    format!("atelier:oauth:state:{state}")
}

/// Provider endpoints are part of the platform contract and do not vary per
/// deployment; only client credentials come from the environment.
struct ProviderEndpoints {
    authorize_url: &'static str,
    token_url: &'static str,
    profile_url: &'static str,
    scopes: &'static str,
}

fn endpoints(platform: Platform) -> ProviderEndpoints {
    match platform {
        Platform::Instagram => ProviderEndpoints {
            authorize_url: "https://www.facebook.com/v19.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
            profile_url: "https://graph.facebook.com/v19.0/me",
            scopes: "instagram_basic instagram_content_publish pages_show_list",
        },
        Platform::Facebook => ProviderEndpoints {
            authorize_url: "https://www.facebook.com/v19.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
            profile_url: "https://graph.facebook.com/v19.0/me",
            scopes: "pages_manage_posts pages_read_engagement",
        },
        Platform::TikTok => ProviderEndpoints {
            authorize_url: "https://www.tiktok.com/v2/auth/authorize/",
            token_url: "https://open.tiktokapis.com/v2/oauth/token/",
            profile_url: "https://open.tiktokapis.com/v2/user/info/",
            scopes: "user.info.basic video.publish",
        },
        Platform::LinkedIn => ProviderEndpoints {
            authorize_url: "https://www.linkedin.com/oauth/v2/authorization",
            token_url: "https://www.linkedin.com/oauth/v2/accessToken",
            profile_url: "https://api.linkedin.com/v2/userinfo",
            scopes: "openid profile w_member_social",
        },
        Platform::X => ProviderEndpoints {
            authorize_url: "https://twitter.com/i/oauth2/authorize",
            token_url: "https://api.twitter.com/2/oauth2/token",
            profile_url: "https://api.twitter.com/2/users/me",
            scopes: "tweet.read tweet.write users.read offline.access",
        },
        Platform::YouTube => ProviderEndpoints {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            profile_url: "https://www.googleapis.com/oauth2/v2/userinfo",
            scopes: "https://www.googleapis.com/auth/youtube.upload openid profile",
        },
        Platform::Pinterest => ProviderEndpoints {
            authorize_url: "https://www.pinterest.com/oauth/",
            token_url: "https://api.pinterest.com/v5/oauth/token",
            profile_url: "https://api.pinterest.com/v5/user_account",
            scopes: "boards:read pins:read pins:write",
        },
    }
}

/// Context persisted alongside the state token.
#[derive(Debug, Serialize, Deserialize)]
struct StateContext {
    workspace_id: Uuid,
    brand_id: Uuid,
    actor_id: Uuid,
    platform: Platform,
}

/// OAuth2 token endpoint response, common subset.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
}

/// The profile fields we keep from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExternalProfile {
    external_id: String,
    display_name: String,
    avatar_url: Option<String>,
}

/// Providers disagree on profile field names and wrapping; try the common
/// spellings rather than carrying one parser per platform.
fn parse_profile(value: &serde_json::Value) -> Option<ExternalProfile> {
    let data = value.get("data").unwrap_or(value);
    let data = data.get("user").unwrap_or(data);

    let external_id = string_field(data, &["id", "sub", "user_id", "open_id"])?;
    let display_name = string_field(data, &["name", "display_name", "username", "login"])
        .unwrap_or_else(|| external_id.clone());
    let avatar_url = string_field(
        data,
        &["picture", "avatar_url", "profile_image_url", "avatar"],
    );

    Some(ExternalProfile {
        external_id,
        display_name,
        avatar_url,
    })
}

fn string_field(value: &serde_json::Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| value.get(*name).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

/// Scope strings come back space-separated (RFC 6749) or comma-separated
/// (several providers); accept both.
fn split_scopes(scope: Option<&str>) -> Vec<String> {
    scope
        .unwrap_or("")
        .split([' ', ','])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn to_expiry(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
}

fn build_authorize_url(
    platform: Platform,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> String {
    let provider = endpoints(platform);
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        provider.authorize_url,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(provider.scopes),
        state
    )
}

fn client_credentials(platform: Platform) -> Result<(String, String)> {
    let upper = platform.as_str().to_uppercase();
    let client_id = std::env::var(format!("OAUTH_{upper}_CLIENT_ID")).map_err(|_| {
        AppError::OAuthError(format!("{} client id not configured", platform.as_str()))
    })?;
    let client_secret = std::env::var(format!("OAUTH_{upper}_CLIENT_SECRET")).map_err(|_| {
        AppError::OAuthError(format!("{} client secret not configured", platform.as_str()))
    })?;
    Ok((client_id, client_secret))
}

/// Minimal popup-callback page: report the outcome to `window.opener` and
/// close. The payload is JSON-encoded to keep provider-supplied text from
/// breaking out of the script.
pub fn success_page() -> String {
    callback_page(&serde_json::json!({ "type": "OAUTH_SUCCESS" }))
}

pub fn error_page(code: &str, message: &str) -> String {
    callback_page(&serde_json::json!({
        "type": "OAUTH_ERROR",
        "code": code,
        "message": message,
    }))
}

fn callback_page(payload: &serde_json::Value) -> String {
    format!(
        "<!DOCTYPE html>\n<html><body><script>\n\
         if (window.opener) {{ window.opener.postMessage({payload}, \"*\"); }}\n\
         window.close();\n\
         </script></body></html>"
    )
}

pub struct OAuthService {
    pool: PgPool,
    redis: Arc<Mutex<ConnectionManager>>,
    vault: Arc<CredentialVault>,
    http: Client,
    redirect_base_url: String,
    cache: Option<Arc<StudioCache>>,
}

impl OAuthService {
    pub fn new(
        pool: PgPool,
        redis: Arc<Mutex<ConnectionManager>>,
        vault: Arc<CredentialVault>,
        redirect_base_url: String,
    ) -> Self {
        Self {
            pool,
            redis,
            vault,
            http: Client::new(),
            redirect_base_url,
            cache: None,
        }
    }

    pub fn with_cache(
        pool: PgPool,
        redis: Arc<Mutex<ConnectionManager>>,
        vault: Arc<CredentialVault>,
        redirect_base_url: String,
        cache: Arc<StudioCache>,
    ) -> Self {
        Self {
            pool,
            redis,
            vault,
            http: Client::new(),
            redirect_base_url,
            cache: Some(cache),
        }
    }

    fn redirect_uri(&self, platform: Platform) -> String {
        format!(
            "{}/v1/oauth/{}/callback",
            self.redirect_base_url,
            platform.as_str()
        )
    }

    /// Begin the connect flow: validate the brand, persist a one-time state
    /// token, and return the provider authorize URL for the popup.
    pub async fn start_connect(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        platform: Platform,
        brand_id: Uuid,
    ) -> Result<String> {
        let brand = brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;
        if brand.get_status() == BrandStatus::Archived {
            return Err(AppError::Conflict(
                "Cannot connect accounts to an archived brand".to_string(),
            ));
        }

        let (client_id, _) = client_credentials(platform)?;

        let state = Uuid::new_v4().simple().to_string();
        let context = StateContext {
            workspace_id,
            brand_id,
            actor_id,
            platform,
        };
        let payload = serde_json::to_string(&context)
            .map_err(|e| AppError::Internal(format!("Failed to serialize OAuth state: {e}")))?;

        let mut conn = self.redis.lock().await.clone();
        redis::cmd("SET")
            .arg(state_key(&state))
            .arg(payload)
            .arg("EX")
            .arg(STATE_TTL_SECONDS)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::CacheError(format!("Failed to store OAuth state: {e}")))?;

        tracing::info!(
            workspace_id = %workspace_id,
            brand_id = %brand_id,
            platform = %platform.as_str(),
            "OAuth connect flow started"
        );

        Ok(build_authorize_url(
            platform,
            &client_id,
            &self.redirect_uri(platform),
            &state,
        ))
    }

    /// Finish the connect flow after the provider redirected back. Consumes
    /// the state token, exchanges the code, fetches the profile, and
    /// connects (or reconnects) the account.
    pub async fn complete_connect(&self, state: &str, code: &str) -> Result<SocialAccount> {
        let context = self.consume_state(state).await?;
        let platform = context.platform;
        let (client_id, client_secret) = client_credentials(platform)?;
        let provider = endpoints(platform);
        let redirect_uri = self.redirect_uri(platform);

        let token = self
            .http
            .post(provider.token_url)
            .form(&[
                ("code", code),
                ("client_id", &client_id),
                ("client_secret", &client_secret),
                ("redirect_uri", &redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuthError(format!("Token exchange failed: {e}")))?
            .json::<TokenResponse>()
            .await
            .map_err(|e| AppError::OAuthError(format!("Malformed token response: {e}")))?;

        let profile_json = self
            .http
            .get(provider.profile_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::OAuthError(format!("Profile fetch failed: {e}")))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AppError::OAuthError(format!("Malformed profile response: {e}")))?;

        let profile = parse_profile(&profile_json)
            .ok_or_else(|| AppError::OAuthError("Provider profile missing an id".to_string()))?;

        let credentials = AccountCredentials {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: to_expiry(token.expires_in),
            scopes: split_scopes(token.scope.as_deref()),
        };

        let accounts = match self.cache.as_ref() {
            Some(cache) => SocialAccountService::with_cache(
                self.pool.clone(),
                Arc::clone(&self.vault),
                Arc::clone(cache),
            ),
            None => SocialAccountService::new(self.pool.clone(), Arc::clone(&self.vault)),
        };

        accounts
            .connect_account(
                context.workspace_id,
                context.actor_id,
                ConnectAccount {
                    brand_id: context.brand_id,
                    platform,
                    external_id: profile.external_id,
                    display_name: profile.display_name,
                    avatar_url: profile.avatar_url,
                    credentials,
                },
            )
            .await
    }

    /// Load and delete the state token. GET-then-DEL mirrors the provider
    /// side being a single redirect; a concurrent replay loses the DEL race
    /// and fails the token exchange.
    async fn consume_state(&self, state: &str) -> Result<StateContext> {
        let key = state_key(state);
        let mut conn = self.redis.lock().await.clone();

        let payload: Option<String> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::CacheError(format!("Failed to read OAuth state: {e}")))?;

        let payload = payload.ok_or_else(|| {
            AppError::BadRequest("Invalid or expired OAuth state".to_string())
        })?;

        redis::cmd("DEL")
            .arg(&key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::CacheError(format!("Failed to consume OAuth state: {e}")))?;

        serde_json::from_str(&payload)
            .map_err(|e| AppError::Internal(format!("Corrupt OAuth state payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_the_flow_parameters() {
        let url = build_authorize_url(
            Platform::LinkedIn,
            "client-123",
            "https://api.atelier.dev/v1/oauth/linkedin/callback",
            "abcd1234",
        );

        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=abcd1234"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fapi.atelier.dev%2Fv1%2Foauth%2Flinkedin%2Fcallback"
        ));
    }

    #[test]
    fn profile_parser_handles_common_provider_shapes() {
        // Google-style flat object
        let google = serde_json::json!({
            "id": "g-1", "name": "Studio", "picture": "https://img/p.png"
        });
        let profile = parse_profile(&google).unwrap();
        assert_eq!(profile.external_id, "g-1");
        assert_eq!(profile.display_name, "Studio");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://img/p.png"));

        // X wraps the user in "data"
        let x = serde_json::json!({
            "data": { "id": "x-9", "name": "Studio", "username": "studio" }
        });
        assert_eq!(parse_profile(&x).unwrap().external_id, "x-9");

        // TikTok wraps in data.user and uses open_id
        let tiktok = serde_json::json!({
            "data": { "user": { "open_id": "tt-5", "display_name": "Studio" } }
        });
        let profile = parse_profile(&tiktok).unwrap();
        assert_eq!(profile.external_id, "tt-5");
        assert_eq!(profile.display_name, "Studio");

        // No recognizable id
        assert!(parse_profile(&serde_json::json!({ "email": "x@y.z" })).is_none());
    }

    #[test]
    fn profile_parser_falls_back_to_id_for_display_name() {
        let bare = serde_json::json!({ "sub": "li-7" });
        let profile = parse_profile(&bare).unwrap();
        assert_eq!(profile.display_name, "li-7");
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn scope_splitting_accepts_both_separators() {
        assert_eq!(
            split_scopes(Some("a b,c")),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_scopes(None).is_empty());
        assert!(split_scopes(Some("  ")).is_empty());
    }

    #[test]
    fn expiry_is_relative_to_now() {
        assert_eq!(to_expiry(None), None);
        let expiry = to_expiry(Some(3600)).unwrap();
        let delta = expiry - Utc::now();
        assert!(delta.num_seconds() > 3590 && delta.num_seconds() <= 3600);
    }

    #[test]
    fn callback_pages_embed_json_payloads() {
        let page = error_page("oauth_error", "token exchange \"failed\"");
        assert!(page.contains("OAUTH_ERROR"));
        assert!(page.contains("token exchange \\\"failed\\\""));
        assert!(page.contains("window.opener.postMessage"));

        let page = success_page();
        assert!(page.contains("OAUTH_SUCCESS"));
    }

    #[test]
    fn every_platform_has_provider_endpoints() {
        for platform in Platform::ALL {
            let provider = endpoints(platform);
            assert!(provider.authorize_url.starts_with("https://"));
            assert!(provider.token_url.starts_with("https://"));
            assert!(provider.profile_url.starts_with("https://"));
            assert!(!provider.scopes.is_empty());
        }
    }
}
