//! Brand lifecycle: creation, profile edits, status transitions, and the
//! readiness score shown during onboarding.

use crate::cache::StudioCache;
use crate::db::{brand_repo, social_account_repo};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{Brand, BrandStatus};
use crate::services::activity::{ActivityService, NewActivity};
use crate::validators;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const WEIGHT_PROFILE_COMPLETED: i16 = 40;
const WEIGHT_HAS_SOCIAL_ACCOUNT: i16 = 30;
const WEIGHT_PUBLISHING_DEFAULTS: i16 = 30;

/// Attempts at suffixing a taken slug before giving up.
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Weighted completeness percentage (0-100).
fn readiness_score(profile_completed: bool, has_social_account: bool, has_defaults: bool) -> i16 {
    let mut score = 0;
    if profile_completed {
        score += WEIGHT_PROFILE_COMPLETED;
    }
    if has_social_account {
        score += WEIGHT_HAS_SOCIAL_ACCOUNT;
    }
    if has_defaults {
        score += WEIGHT_PUBLISHING_DEFAULTS;
    }
    score
}

/// The profile counts as complete once a description, a logo, and at least
/// one style attribute are in place.
fn derive_profile_completed(
    description: Option<&str>,
    logo_asset_id: Option<Uuid>,
    style: &Value,
) -> bool {
    let described = description.is_some_and(|d| !d.trim().is_empty());
    let styled = style.as_object().is_some_and(|map| !map.is_empty());
    described && logo_asset_id.is_some() && styled
}

#[derive(Debug, Default)]
pub struct NewBrand {
    pub name: String,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub style: Option<Value>,
}

#[derive(Debug, Default)]
pub struct BrandPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub timezone: Option<String>,
    pub style: Option<Value>,
    pub logo_asset_id: Option<Option<Uuid>>,
}

pub struct BrandService {
    pool: PgPool,
    cache: Option<Arc<StudioCache>>,
}

impl BrandService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, cache: None }
    }

    pub fn with_cache(pool: PgPool, cache: Arc<StudioCache>) -> Self {
        Self {
            pool,
            cache: Some(cache),
        }
    }

    fn cache(&self) -> Option<&Arc<StudioCache>> {
        self.cache.as_ref()
    }

    async fn invalidate(&self, brand_id: Uuid) {
        if let Some(cache) = self.cache() {
            if let Err(err) = cache.invalidate_brand(brand_id).await {
                tracing::debug!(brand_id = %brand_id, "brand cache invalidation failed: {}", err);
            }
        }
    }

    /// Create a brand in `Draft` with a slug generated from its name.
    pub async fn create_brand(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        req: NewBrand,
    ) -> Result<Brand> {
        if !validators::validate_brand_name(&req.name) {
            return Err(AppError::ValidationError(
                "Brand name must be 1-80 characters".to_string(),
            ));
        }
        let name = req.name.trim().to_string();

        let timezone = req.timezone.unwrap_or_else(|| "UTC".to_string());
        if !validators::validate_timezone(&timezone) {
            return Err(AppError::ValidationError(format!(
                "Invalid timezone: {timezone}"
            )));
        }

        let style = req.style.unwrap_or_else(|| json!({}));
        let description = req.description.as_deref().map(str::trim).filter(|d| !d.is_empty());

        let slug = self.unique_slug(workspace_id, &name).await?;
        let profile_completed = derive_profile_completed(description, None, &style);
        let score = readiness_score(profile_completed, false, false);

        let mut tx = self.pool.begin().await?;

        let brand = brand_repo::create_brand(
            &mut tx,
            workspace_id,
            &name,
            &slug,
            description,
            &timezone,
            &style,
            profile_completed,
            score,
        )
        .await?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(brand.id),
                actor_id,
                action: "brand.created",
                subject_type: "brand",
                subject_id: brand.id,
                detail: json!({ "name": brand.name, "slug": brand.slug }),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(brand_id = %brand.id, workspace_id = %workspace_id, "brand created");
        Ok(brand)
    }

    /// Fetch a brand, cache-aside.
    pub async fn get_brand(&self, workspace_id: Uuid, brand_id: Uuid) -> Result<Brand> {
        if let Some(cache) = self.cache() {
            match cache.get_brand(brand_id).await {
                Ok(Some(cached)) if cached.workspace_id == workspace_id => {
                    metrics::record_cache_event("brand", "hit");
                    return Ok(cached);
                }
                Ok(_) => metrics::record_cache_event("brand", "miss"),
                Err(err) => {
                    metrics::record_cache_event("brand", "error");
                    tracing::debug!(brand_id = %brand_id, "brand cache read failed: {}", err);
                }
            }
        }

        let brand = brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        if let Some(cache) = self.cache() {
            if let Err(err) = cache.cache_brand(&brand).await {
                tracing::debug!(brand_id = %brand_id, "brand cache set failed: {}", err);
            }
        }

        Ok(brand)
    }

    pub async fn list_brands(
        &self,
        workspace_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Brand>, i64)> {
        let brands = brand_repo::list_brands(&self.pool, workspace_id, limit, offset).await?;
        let total = brand_repo::count_brands(&self.pool, workspace_id).await?;
        Ok((brands, total))
    }

    /// Apply a profile patch. Archived brands are immutable.
    pub async fn update_brand(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        brand_id: Uuid,
        patch: BrandPatch,
    ) -> Result<Brand> {
        let current = brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        if current.get_status() == BrandStatus::Archived {
            return Err(AppError::Conflict(
                "Archived brands cannot be edited".to_string(),
            ));
        }

        let name = match patch.name {
            Some(name) => {
                if !validators::validate_brand_name(&name) {
                    return Err(AppError::ValidationError(
                        "Brand name must be 1-80 characters".to_string(),
                    ));
                }
                name.trim().to_string()
            }
            None => current.name.clone(),
        };

        let description = match patch.description {
            Some(description) => description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            None => current.description.clone(),
        };

        let timezone = match patch.timezone {
            Some(timezone) => {
                if !validators::validate_timezone(&timezone) {
                    return Err(AppError::ValidationError(format!(
                        "Invalid timezone: {timezone}"
                    )));
                }
                timezone
            }
            None => current.timezone.clone(),
        };

        let style = patch.style.unwrap_or_else(|| current.style.clone());
        let logo_asset_id = match patch.logo_asset_id {
            Some(logo) => logo,
            None => current.logo_asset_id,
        };

        let profile_completed = derive_profile_completed(description.as_deref(), logo_asset_id, &style);
        let score = readiness_score(
            profile_completed,
            current.has_social_account,
            current.publishing_defaults.is_some(),
        );

        let mut tx = self.pool.begin().await?;

        let brand = brand_repo::update_brand_profile(
            &mut tx,
            workspace_id,
            brand_id,
            &name,
            description.as_deref(),
            &timezone,
            &style,
            logo_asset_id,
            profile_completed,
            score,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(brand_id),
                actor_id,
                action: "brand.updated",
                subject_type: "brand",
                subject_id: brand_id,
                detail: json!({ "profile_completed": profile_completed }),
            },
        )
        .await?;

        tx.commit().await?;
        self.invalidate(brand_id).await;

        Ok(brand)
    }

    pub async fn set_publishing_defaults(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        brand_id: Uuid,
        defaults: Value,
    ) -> Result<Brand> {
        let current = brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        if current.get_status() == BrandStatus::Archived {
            return Err(AppError::Conflict(
                "Archived brands cannot be edited".to_string(),
            ));
        }

        let score = readiness_score(current.profile_completed, current.has_social_account, true);

        let mut tx = self.pool.begin().await?;

        let brand =
            brand_repo::set_publishing_defaults(&mut tx, workspace_id, brand_id, &defaults, score)
                .await?
                .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(brand_id),
                actor_id,
                action: "brand.defaults_updated",
                subject_type: "brand",
                subject_id: brand_id,
                detail: json!({}),
            },
        )
        .await?;

        tx.commit().await?;
        self.invalidate(brand_id).await;

        Ok(brand)
    }

    pub async fn archive_brand(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        brand_id: Uuid,
    ) -> Result<Brand> {
        self.transition(workspace_id, actor_id, brand_id, BrandStatus::Archived, "brand.archived")
            .await
    }

    pub async fn activate_brand(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        brand_id: Uuid,
    ) -> Result<Brand> {
        self.transition(workspace_id, actor_id, brand_id, BrandStatus::Active, "brand.activated")
            .await
    }

    async fn transition(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        brand_id: Uuid,
        to: BrandStatus,
        action: &str,
    ) -> Result<Brand> {
        let current = brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        let from = current.get_status();

        if !from.can_transition_to(to) {
            return Err(AppError::Conflict(format!(
                "Cannot move brand from {} to {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let mut tx = self.pool.begin().await?;

        let brand =
            brand_repo::update_brand_status(&mut tx, workspace_id, brand_id, from.as_str(), to.as_str())
                .await?
                .ok_or_else(|| {
                    AppError::Conflict("Brand status changed concurrently".to_string())
                })?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(brand_id),
                actor_id,
                action,
                subject_type: "brand",
                subject_id: brand_id,
                detail: json!({ "from": from.as_str(), "to": to.as_str() }),
            },
        )
        .await?;

        tx.commit().await?;
        self.invalidate(brand_id).await;

        tracing::info!(brand_id = %brand_id, from = from.as_str(), to = to.as_str(), "brand status changed");
        Ok(brand)
    }

    /// Recompute readiness after an account connect/disconnect/remove.
    /// No-op when the active-account boolean is unchanged.
    pub async fn recalculate_readiness(&self, workspace_id: Uuid, brand_id: Uuid) -> Result<()> {
        let brand = brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        let active = social_account_repo::count_active_accounts(&self.pool, brand_id).await?;
        let has_social_account = active > 0;

        if has_social_account == brand.has_social_account {
            return Ok(());
        }

        let score = readiness_score(
            brand.profile_completed,
            has_social_account,
            brand.publishing_defaults.is_some(),
        );

        brand_repo::update_readiness(&self.pool, brand_id, has_social_account, score).await?;
        self.invalidate(brand_id).await;

        tracing::debug!(brand_id = %brand_id, has_social_account, score, "brand readiness recalculated");
        Ok(())
    }

    async fn unique_slug(&self, workspace_id: Uuid, name: &str) -> Result<String> {
        let base = validators::slugify(name);

        if !brand_repo::slug_exists(&self.pool, workspace_id, &base).await? {
            return Ok(base);
        }

        for suffix in 2..=MAX_SLUG_ATTEMPTS {
            let candidate = format!("{base}-{suffix}");
            if !brand_repo::slug_exists(&self.pool, workspace_id, &candidate).await? {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!(
            "Could not find a free slug for '{name}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_score_weights() {
        assert_eq!(readiness_score(false, false, false), 0);
        assert_eq!(readiness_score(true, false, false), 40);
        assert_eq!(readiness_score(false, true, false), 30);
        assert_eq!(readiness_score(false, false, true), 30);
        assert_eq!(readiness_score(true, true, false), 70);
        assert_eq!(readiness_score(true, true, true), 100);
    }

    #[test]
    fn profile_completeness_requires_all_three() {
        let logo = Some(Uuid::new_v4());
        let style = json!({ "palette": ["#102030"] });

        assert!(derive_profile_completed(Some("A coffee brand"), logo, &style));
        assert!(!derive_profile_completed(None, logo, &style));
        assert!(!derive_profile_completed(Some("  "), logo, &style));
        assert!(!derive_profile_completed(Some("A coffee brand"), None, &style));
        assert!(!derive_profile_completed(Some("A coffee brand"), logo, &json!({})));
        assert!(!derive_profile_completed(Some("A coffee brand"), logo, &json!(null)));
    }
}
