//! Hashtag presets: named tag lists reusable while composing content.

use crate::db::{brand_repo, hashtag_repo};
use crate::error::{AppError, Result};
use crate::models::HashtagPreset;
use crate::services::activity::{ActivityService, NewActivity};
use crate::validators;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

pub struct HashtagService {
    pool: PgPool,
}

impl HashtagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_preset(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        brand_id: Uuid,
        name: &str,
        tags: Vec<String>,
    ) -> Result<HashtagPreset> {
        brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        let name = validate_preset_name(name)?;
        let tags = validators::normalize_tags(tags);
        if tags.is_empty() {
            return Err(AppError::ValidationError(
                "A preset needs at least one tag".to_string(),
            ));
        }

        if hashtag_repo::name_exists(&self.pool, brand_id, &name, None).await? {
            return Err(AppError::Conflict(format!(
                "A preset named '{name}' already exists for this brand"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let preset =
            hashtag_repo::insert_preset(&mut tx, workspace_id, brand_id, &name, &tags).await?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(brand_id),
                actor_id,
                action: "preset.created",
                subject_type: "hashtag_preset",
                subject_id: preset.id,
                detail: json!({ "name": preset.name, "tag_count": preset.tags.len() }),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(preset)
    }

    pub async fn list_presets(
        &self,
        workspace_id: Uuid,
        brand_id: Uuid,
    ) -> Result<Vec<HashtagPreset>> {
        brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        let presets = hashtag_repo::list_presets_by_brand(&self.pool, workspace_id, brand_id).await?;
        Ok(presets)
    }

    pub async fn update_preset(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        preset_id: Uuid,
        name: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<HashtagPreset> {
        let current = hashtag_repo::find_preset_by_id(&self.pool, workspace_id, preset_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hashtag preset not found".to_string()))?;

        let name = match name {
            Some(name) => validate_preset_name(&name)?,
            None => current.name.clone(),
        };

        let tags = match tags {
            Some(tags) => {
                let tags = validators::normalize_tags(tags);
                if tags.is_empty() {
                    return Err(AppError::ValidationError(
                        "A preset needs at least one tag".to_string(),
                    ));
                }
                tags
            }
            None => current.tags.clone(),
        };

        if hashtag_repo::name_exists(&self.pool, current.brand_id, &name, Some(preset_id)).await? {
            return Err(AppError::Conflict(format!(
                "A preset named '{name}' already exists for this brand"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let preset = hashtag_repo::update_preset(&mut tx, workspace_id, preset_id, &name, &tags)
            .await?
            .ok_or_else(|| AppError::NotFound("Hashtag preset not found".to_string()))?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(preset.brand_id),
                actor_id,
                action: "preset.updated",
                subject_type: "hashtag_preset",
                subject_id: preset.id,
                detail: json!({ "name": preset.name }),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(preset)
    }

    pub async fn delete_preset(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        preset_id: Uuid,
    ) -> Result<()> {
        let preset = hashtag_repo::find_preset_by_id(&self.pool, workspace_id, preset_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hashtag preset not found".to_string()))?;

        let mut tx = self.pool.begin().await?;

        if !hashtag_repo::delete_preset(&mut tx, workspace_id, preset_id).await? {
            return Err(AppError::NotFound("Hashtag preset not found".to_string()));
        }

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(preset.brand_id),
                actor_id,
                action: "preset.deleted",
                subject_type: "hashtag_preset",
                subject_id: preset_id,
                detail: json!({ "name": preset.name }),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn validate_preset_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 80 {
        return Err(AppError::ValidationError(
            "Preset name must be 1-80 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
