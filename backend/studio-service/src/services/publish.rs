/// Publish dispatch
///
/// The seam between content orchestration and the platform APIs. A
/// `Dispatcher` takes one connected account plus one content item and
/// returns the platform-assigned post id, or a typed failure the caller
/// records on the target row. The production binding POSTs a rendered
/// payload to the internal publish gateway, which owns the
/// platform-specific API calls.
use crate::error::AppError;
use crate::models::{ContentItem, MediaRef, SocialAccount};
use async_trait::async_trait;
use credential_vault::CredentialVault;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Per-target dispatch failure. The message is persisted on the target row,
/// so variants render without secrets.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Successful dispatch result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Post id assigned by the platform
    pub external_post_id: String,
}

/// One account, one content item, one platform post.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        account: &SocialAccount,
        content: &ContentItem,
    ) -> Result<DispatchOutcome, DispatchError>;
}

/// Payload rendered for the publish gateway.
#[derive(Debug, Serialize)]
struct GatewayPayload<'a> {
    account_external_id: &'a str,
    content_type: Option<&'a str>,
    caption: Option<&'a str>,
    tags: &'a [String],
    media: &'a [MediaRef],
    without_media: bool,
}

impl<'a> GatewayPayload<'a> {
    fn render(account: &'a SocialAccount, content: &'a ContentItem) -> Self {
        Self {
            account_external_id: &account.external_id,
            content_type: content.content_type.as_deref(),
            caption: content.caption.as_deref(),
            tags: &content.tags,
            media: &content.media.0,
            without_media: content.without_media,
        }
    }
}

/// Production dispatcher: `POST {gateway}/{platform}/posts` with the
/// account's bearer token.
pub struct HttpDispatcher {
    http: Client,
    vault: Arc<CredentialVault>,
    gateway_url: String,
}

impl HttpDispatcher {
    pub fn new(
        vault: Arc<CredentialVault>,
        gateway_url: String,
        timeout_secs: u64,
    ) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            vault,
            gateway_url,
        })
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(
        &self,
        account: &SocialAccount,
        content: &ContentItem,
    ) -> Result<DispatchOutcome, DispatchError> {
        let platform = account
            .get_platform()
            .ok_or_else(|| DispatchError::UnknownPlatform(account.platform.clone()))?;

        let credentials = self
            .vault
            .open(&account.credentials)
            .map_err(|e| DispatchError::Credentials(e.to_string()))?;

        let url = format!("{}/{}/posts", self.gateway_url, platform.as_str());
        let payload = GatewayPayload::render(account, content);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<DispatchOutcome>()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn test_vault() -> Arc<CredentialVault> {
        Arc::new(CredentialVault::new(&STANDARD.encode([0u8; 32])).unwrap())
    }

    fn account(platform: &str) -> SocialAccount {
        SocialAccount {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            platform: platform.to_string(),
            external_id: "acct-77".to_string(),
            display_name: "Studio".to_string(),
            avatar_url: None,
            credentials: vec![1, 2, 3],
            status: "active".to_string(),
            connected_at: chrono::Utc::now(),
            disconnected_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn content() -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            brand_id: Uuid::new_v4(),
            content_type: Some("IMAGE_POST".to_string()),
            caption: Some("launch day".to_string()),
            tags: vec!["studio".to_string()],
            media: Json(vec![MediaRef {
                asset_id: Uuid::new_v4(),
                kind: "image".to_string(),
                position: 0,
            }]),
            without_media: false,
            media_lookup_id: None,
            status: "draft".to_string(),
            scheduled_at: None,
            published_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn payload_carries_composer_fields() {
        let account = account("instagram");
        let content = content();
        let payload = GatewayPayload::render(&account, &content);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["account_external_id"], "acct-77");
        assert_eq!(json["content_type"], "IMAGE_POST");
        assert_eq!(json["caption"], "launch day");
        assert_eq!(json["media"][0]["kind"], "image");
        assert_eq!(json["without_media"], false);
    }

    #[tokio::test]
    async fn unknown_platform_fails_before_any_network_call() {
        let dispatcher =
            HttpDispatcher::new(test_vault(), "http://localhost:9300".to_string(), 1).unwrap();

        let result = dispatcher.dispatch(&account("myspace"), &content()).await;
        assert!(matches!(result, Err(DispatchError::UnknownPlatform(p)) if p == "myspace"));
    }

    #[tokio::test]
    async fn garbage_credentials_fail_before_any_network_call() {
        let dispatcher =
            HttpDispatcher::new(test_vault(), "http://localhost:9300".to_string(), 1).unwrap();

        // credentials bytes are not a valid sealed record
        let result = dispatcher.dispatch(&account("instagram"), &content()).await;
        assert!(matches!(result, Err(DispatchError::Credentials(_))));
    }
}
