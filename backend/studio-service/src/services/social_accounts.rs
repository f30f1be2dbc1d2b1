//! Social account lifecycle: connect, reconnect, disconnect, remove.
//!
//! Credentials are sealed through the vault before they reach the database
//! and only the publish dispatcher ever unseals them. Every mutation records
//! an activity entry in the same transaction and recalculates the brand's
//! readiness after commit.

use crate::cache::StudioCache;
use crate::db::{brand_repo, social_account_repo};
use crate::error::{AppError, Result};
use crate::models::{AccountStatus, BrandStatus, SocialAccount};
use crate::services::activity::{ActivityService, NewActivity};
use crate::services::brands::BrandService;
use credential_vault::{AccountCredentials, CredentialVault};
use platform_rules::Platform;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// A connect request resolved from the OAuth callback (or direct token entry).
#[derive(Debug)]
pub struct ConnectAccount {
    pub brand_id: Uuid,
    pub platform: Platform,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub credentials: AccountCredentials,
}

/// How an incoming (platform, external_id) relates to an existing row.
#[derive(Debug, PartialEq, Eq)]
enum ConnectPath {
    Fresh,
    Reconnect,
    Conflict,
}

/// A live row always conflicts, whatever brand it hangs off. A disconnected
/// row on the same brand is refreshed in place; on another brand it still
/// conflicts. Removed rows are invisible to the probe.
fn classify_existing(existing: Option<(AccountStatus, Uuid)>, target_brand: Uuid) -> ConnectPath {
    match existing {
        None => ConnectPath::Fresh,
        Some((AccountStatus::Active, _)) => ConnectPath::Conflict,
        Some((AccountStatus::Disconnected, brand)) if brand == target_brand => {
            ConnectPath::Reconnect
        }
        Some(_) => ConnectPath::Conflict,
    }
}

pub struct SocialAccountService {
    pool: PgPool,
    vault: Arc<CredentialVault>,
    cache: Option<Arc<StudioCache>>,
}

impl SocialAccountService {
    pub fn new(pool: PgPool, vault: Arc<CredentialVault>) -> Self {
        Self {
            pool,
            vault,
            cache: None,
        }
    }

    pub fn with_cache(pool: PgPool, vault: Arc<CredentialVault>, cache: Arc<StudioCache>) -> Self {
        Self {
            pool,
            vault,
            cache: Some(cache),
        }
    }

    fn brand_service(&self) -> BrandService {
        match &self.cache {
            Some(cache) => BrandService::with_cache(self.pool.clone(), cache.clone()),
            None => BrandService::new(self.pool.clone()),
        }
    }

    /// Connect (or reconnect) an external account to a brand.
    pub async fn connect_account(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        req: ConnectAccount,
    ) -> Result<SocialAccount> {
        let brand = brand_repo::find_brand_by_id(&self.pool, workspace_id, req.brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        if brand.get_status() == BrandStatus::Archived {
            return Err(AppError::Conflict(
                "Cannot connect accounts to an archived brand".to_string(),
            ));
        }

        let existing = social_account_repo::find_conflicting_account(
            &self.pool,
            workspace_id,
            req.platform.as_str(),
            &req.external_id,
        )
        .await?;

        let path = classify_existing(
            existing.as_ref().map(|a| (a.get_status(), a.brand_id)),
            req.brand_id,
        );

        let sealed = self.vault.seal(&req.credentials)?;

        let mut tx = self.pool.begin().await?;

        let (account, action) = match path {
            ConnectPath::Fresh => {
                let account = social_account_repo::insert_account(
                    &mut tx,
                    workspace_id,
                    req.brand_id,
                    req.platform.as_str(),
                    &req.external_id,
                    &req.display_name,
                    req.avatar_url.as_deref(),
                    &sealed,
                )
                .await?;
                (account, "account.connected")
            }
            ConnectPath::Reconnect => {
                // The guarded update only matches a still-disconnected row;
                // losing the race surfaces as a conflict.
                let existing = existing.as_ref().ok_or_else(|| {
                    AppError::Internal("Reconnect path without an existing row".to_string())
                })?;
                let account = social_account_repo::reactivate_account(
                    &mut tx,
                    workspace_id,
                    existing.id,
                    &req.display_name,
                    req.avatar_url.as_deref(),
                    &sealed,
                )
                .await?
                .ok_or_else(|| {
                    AppError::Conflict("Account status changed concurrently".to_string())
                })?;
                (account, "account.reconnected")
            }
            ConnectPath::Conflict => {
                return Err(AppError::Conflict(format!(
                    "A {} account with this identity is already connected in this workspace",
                    req.platform.as_str()
                )));
            }
        };

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(req.brand_id),
                actor_id,
                action,
                subject_type: "social_account",
                subject_id: account.id,
                detail: json!({
                    "platform": req.platform.as_str(),
                    "display_name": req.display_name,
                }),
            },
        )
        .await?;

        tx.commit().await?;

        self.brand_service()
            .recalculate_readiness(workspace_id, req.brand_id)
            .await?;

        tracing::info!(
            account_id = %account.id,
            brand_id = %req.brand_id,
            platform = req.platform.as_str(),
            action,
            "social account connected"
        );
        Ok(account)
    }

    pub async fn get_account(&self, workspace_id: Uuid, account_id: Uuid) -> Result<SocialAccount> {
        social_account_repo::find_account_by_id(&self.pool, workspace_id, account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Social account not found".to_string()))
    }

    /// List non-removed accounts, optionally narrowed to one brand.
    pub async fn list_accounts(
        &self,
        workspace_id: Uuid,
        brand_id: Option<Uuid>,
    ) -> Result<Vec<SocialAccount>> {
        let accounts = social_account_repo::list_accounts(&self.pool, workspace_id, brand_id).await?;
        Ok(accounts)
    }

    /// Disconnect an active account. Anything else is a conflict.
    pub async fn disconnect_account(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        account_id: Uuid,
    ) -> Result<SocialAccount> {
        let account = self.get_account(workspace_id, account_id).await?;

        if account.get_status() != AccountStatus::Active {
            return Err(AppError::Conflict(format!(
                "Cannot disconnect an account in status {}",
                account.status
            )));
        }

        let mut tx = self.pool.begin().await?;

        let account = social_account_repo::mark_disconnected(&mut tx, workspace_id, account_id)
            .await?
            .ok_or_else(|| AppError::Conflict("Account status changed concurrently".to_string()))?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(account.brand_id),
                actor_id,
                action: "account.disconnected",
                subject_type: "social_account",
                subject_id: account.id,
                detail: json!({ "platform": account.platform }),
            },
        )
        .await?;

        tx.commit().await?;

        self.brand_service()
            .recalculate_readiness(workspace_id, account.brand_id)
            .await?;

        Ok(account)
    }

    /// Remove an account for good. Allowed from active and disconnected.
    pub async fn remove_account(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        account_id: Uuid,
    ) -> Result<SocialAccount> {
        let account = self.get_account(workspace_id, account_id).await?;

        if !account.get_status().can_transition_to(AccountStatus::Removed) {
            return Err(AppError::Conflict(format!(
                "Cannot remove an account in status {}",
                account.status
            )));
        }

        let mut tx = self.pool.begin().await?;

        let account = social_account_repo::mark_removed(&mut tx, workspace_id, account_id)
            .await?
            .ok_or_else(|| AppError::Conflict("Account status changed concurrently".to_string()))?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(account.brand_id),
                actor_id,
                action: "account.removed",
                subject_type: "social_account",
                subject_id: account.id,
                detail: json!({ "platform": account.platform }),
            },
        )
        .await?;

        tx.commit().await?;

        self.brand_service()
            .recalculate_readiness(workspace_id, account.brand_id)
            .await?;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_when_no_existing_row() {
        let brand = Uuid::new_v4();
        assert_eq!(classify_existing(None, brand), ConnectPath::Fresh);
    }

    #[test]
    fn active_row_conflicts_regardless_of_brand() {
        let brand = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            classify_existing(Some((AccountStatus::Active, brand)), brand),
            ConnectPath::Conflict
        );
        assert_eq!(
            classify_existing(Some((AccountStatus::Active, other)), brand),
            ConnectPath::Conflict
        );
    }

    #[test]
    fn disconnected_row_reconnects_only_on_its_own_brand() {
        let brand = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            classify_existing(Some((AccountStatus::Disconnected, brand)), brand),
            ConnectPath::Reconnect
        );
        assert_eq!(
            classify_existing(Some((AccountStatus::Disconnected, other)), brand),
            ConnectPath::Conflict
        );
    }
}
