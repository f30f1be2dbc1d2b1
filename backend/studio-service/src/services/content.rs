//! Content composition, validation, and publish orchestration.
//!
//! A content item starts as a draft that may be arbitrarily incomplete.
//! Publishing or scheduling runs the validation gate, which checks the item
//! against every selected target account at once and reports all failures
//! together. Dispatch itself goes through the `publish::Dispatcher` seam,
//! one target at a time; a failed target is recorded and skipped so the rest
//! of the set still publishes.

use crate::cache::StudioCache;
use crate::db::{brand_repo, content_repo, media_repo, social_account_repo};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    AccountStatus, BrandStatus, ContentItem, ContentStatus, ContentTarget, MediaRef,
    SocialAccount, TargetStatus,
};
use crate::services::activity::{ActivityService, NewActivity};
use crate::services::publish::Dispatcher;
use crate::validators;
use chrono::{DateTime, Utc};
use platform_rules::{matrix_entry, min_caption_limit, requires_media, ContentType, SupportLevel};
use serde_json::json;
use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Actor recorded for dispatches triggered by the scheduler rather than a
/// user request.
pub const SYSTEM_ACTOR: Uuid = Uuid::nil();

/// What should happen with the item once it passes the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Keep (or return to) draft; no validation.
    Draft,
    /// Validate and dispatch immediately.
    Now,
    /// Validate and queue for the scheduled publisher.
    Schedule { at: DateTime<Utc> },
}

#[derive(Debug, Default)]
pub struct NewContent {
    pub brand_id: Uuid,
    pub content_type: Option<String>,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub media: Vec<MediaRef>,
    pub without_media: bool,
    pub media_lookup_id: Option<String>,
    pub target_account_ids: Vec<Uuid>,
}

/// Partial update; `None` leaves the field untouched. Double options clear
/// nullable fields.
#[derive(Debug, Default)]
pub struct ContentPatch {
    pub content_type: Option<Option<String>>,
    pub caption: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub media: Option<Vec<MediaRef>>,
    pub without_media: Option<bool>,
    pub media_lookup_id: Option<Option<String>>,
    pub target_account_ids: Option<Vec<Uuid>>,
}

/// A content item together with its per-account outcomes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContentDetail {
    #[serde(flatten)]
    pub item: ContentItem,
    pub targets: Vec<ContentTarget>,
}

/// Fold per-target results into the item status.
fn aggregate_outcome(published: usize, failed: usize) -> ContentStatus {
    if failed == 0 && published > 0 {
        ContentStatus::Published
    } else if published > 0 {
        ContentStatus::PartiallyPublished
    } else {
        ContentStatus::Failed
    }
}

/// The validation gate. Collects every failure instead of stopping at the
/// first so the composer can show the full list in one round trip.
///
/// `requested` is the target id list as submitted; `accounts` the subset
/// that resolved within the workspace.
fn validation_gate(
    content_type: Option<&str>,
    caption: Option<&str>,
    media: &[MediaRef],
    without_media: bool,
    media_lookup_id: Option<&str>,
    brand_id: Uuid,
    requested: &[Uuid],
    accounts: &[SocialAccount],
) -> Vec<String> {
    let mut failures = Vec::new();

    let parsed = match content_type {
        Some(raw) => match ContentType::from_str(raw) {
            Some(ct) => Some(ct),
            None => {
                failures.push(format!("Unknown content type: {raw}"));
                None
            }
        },
        None => {
            failures.push("A content type must be selected".to_string());
            None
        }
    };

    if requested.is_empty() {
        failures.push("At least one target account is required".to_string());
    }
    for id in requested {
        if !accounts.iter().any(|a| a.id == *id) {
            failures.push(format!("Target account {id} does not exist"));
        }
    }
    for account in accounts {
        if account.brand_id != brand_id {
            failures.push(format!(
                "Account \"{}\" belongs to another brand",
                account.display_name
            ));
        }
        if account.get_status() != AccountStatus::Active {
            failures.push(format!(
                "Account \"{}\" is not active",
                account.display_name
            ));
        }
    }

    if let Some(ct) = parsed {
        let form_factor = ct.form_factor();
        let mut supported = Vec::new();
        let mut reported = Vec::new();

        for account in accounts {
            let Some(platform) = account.get_platform() else {
                failures.push(format!(
                    "Account \"{}\" has an unknown platform",
                    account.display_name
                ));
                continue;
            };
            if matrix_entry(ct, platform).level == SupportLevel::Unsupported {
                if !reported.contains(&platform) {
                    failures.push(format!(
                        "{} does not support {}",
                        platform.as_str(),
                        ct.as_str()
                    ));
                    reported.push(platform);
                }
            } else if !supported.contains(&platform) {
                supported.push(platform);
            }
        }

        // Caption check runs over the supported subset so an unsupported
        // platform produces one failure, not two.
        if let Some(limit) = min_caption_limit(supported.iter().copied(), form_factor) {
            let length = caption.map(|c| c.chars().count()).unwrap_or(0);
            if length > limit {
                failures.push(format!(
                    "Caption is {length} characters; the tightest selected platform allows {limit}"
                ));
            }
        }

        let media_mandatory = supported
            .iter()
            .any(|p| requires_media(*p, form_factor) == Some(true));
        if media_mandatory && media.is_empty() && !without_media && media_lookup_id.is_none() {
            failures.push("At least one selected platform requires media".to_string());
        }
    }

    failures
}

fn gate_or_fail(failures: Vec<String>) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(failures.join("; ")))
    }
}

fn gate_request(req: &NewContent, accounts: &[SocialAccount]) -> Vec<String> {
    validation_gate(
        req.content_type.as_deref(),
        req.caption.as_deref(),
        &req.media,
        req.without_media,
        req.media_lookup_id.as_deref(),
        req.brand_id,
        &req.target_account_ids,
        accounts,
    )
}

fn ensure_future(at: DateTime<Utc>) -> Result<()> {
    if at <= Utc::now() {
        return Err(AppError::ValidationError(
            "Scheduled time must be in the future".to_string(),
        ));
    }
    Ok(())
}

pub struct ContentService {
    pool: PgPool,
    dispatcher: Arc<dyn Dispatcher>,
    cache: Option<Arc<StudioCache>>,
}

impl ContentService {
    pub fn new(pool: PgPool, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            pool,
            dispatcher,
            cache: None,
        }
    }

    pub fn with_cache(
        pool: PgPool,
        dispatcher: Arc<dyn Dispatcher>,
        cache: Arc<StudioCache>,
    ) -> Self {
        Self {
            pool,
            dispatcher,
            cache: Some(cache),
        }
    }

    async fn invalidate(&self, content_id: Uuid) {
        if let Some(cache) = self.cache.as_ref() {
            if let Err(err) = cache.invalidate_content(content_id).await {
                tracing::debug!(content_id = %content_id, "content cache invalidation failed: {}", err);
            }
        }
    }

    /// Create a content item. Drafts accept any level of incompleteness;
    /// `Now` and `Schedule` run the validation gate first.
    pub async fn create_content(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        req: NewContent,
        mode: PublishMode,
    ) -> Result<ContentDetail> {
        let brand = brand_repo::find_brand_by_id(&self.pool, workspace_id, req.brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;
        if brand.get_status() == BrandStatus::Archived {
            return Err(AppError::Conflict(
                "Cannot compose content on an archived brand".to_string(),
            ));
        }

        let tags = validators::normalize_tags(&req.tags);
        let accounts = self
            .resolve_targets(workspace_id, req.brand_id, &req.target_account_ids)
            .await?;

        match mode {
            PublishMode::Schedule { at } => {
                ensure_future(at)?;
                gate_or_fail(gate_request(&req, &accounts))?;
            }
            PublishMode::Now => gate_or_fail(gate_request(&req, &accounts))?,
            PublishMode::Draft => {}
        }

        let mut tx = self.pool.begin().await?;
        let mut item = content_repo::insert_content(
            &mut tx,
            workspace_id,
            req.brand_id,
            req.content_type.as_deref(),
            req.caption.as_deref(),
            &tags,
            &req.media,
            req.without_media,
            req.media_lookup_id.as_deref(),
        )
        .await?;

        let mut targets = Vec::new();
        if !req.target_account_ids.is_empty() {
            targets = content_repo::insert_targets(&mut tx, item.id, &req.target_account_ids).await?;
        }

        if let PublishMode::Schedule { at } = mode {
            item = content_repo::schedule_content(&mut tx, workspace_id, item.id, at)
                .await?
                .ok_or_else(|| {
                    AppError::Conflict("Content item changed concurrently".to_string())
                })?;
        }

        let action = match mode {
            PublishMode::Schedule { .. } => "content.scheduled",
            _ => "content.created",
        };
        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(req.brand_id),
                actor_id,
                action,
                subject_type: "content",
                subject_id: item.id,
                detail: json!({
                    "content_type": item.content_type,
                    "targets": req.target_account_ids.len(),
                    "scheduled_at": item.scheduled_at,
                }),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            content_id = %item.id,
            brand_id = %req.brand_id,
            status = %item.status,
            "Content created"
        );

        if mode == PublishMode::Now {
            self.run_dispatch(actor_id, &item).await?;
            return self.get_content(workspace_id, item.id).await;
        }

        Ok(ContentDetail { item, targets })
    }

    /// Edit a draft, scheduled, or failed item. Published content is
    /// immutable. Editing a scheduled item re-runs the gate so an invalid
    /// edit cannot slip into the publish queue.
    pub async fn update_content(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        content_id: Uuid,
        patch: ContentPatch,
    ) -> Result<ContentDetail> {
        let current = content_repo::find_content_by_id(&self.pool, workspace_id, content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;

        match current.get_status() {
            ContentStatus::Draft | ContentStatus::Scheduled | ContentStatus::Failed => {}
            ContentStatus::Published | ContentStatus::PartiallyPublished => {
                return Err(AppError::Conflict(
                    "Published content is immutable".to_string(),
                ));
            }
            ContentStatus::Archived => {
                return Err(AppError::Conflict(
                    "Archived content cannot be edited".to_string(),
                ));
            }
        }

        let content_type = patch
            .content_type
            .unwrap_or_else(|| current.content_type.clone());
        let caption = patch.caption.unwrap_or_else(|| current.caption.clone());
        let tags = validators::normalize_tags(patch.tags.unwrap_or_else(|| current.tags.clone()));
        let media = patch.media.unwrap_or_else(|| current.media.0.clone());
        let without_media = patch.without_media.unwrap_or(current.without_media);
        let media_lookup_id = patch
            .media_lookup_id
            .unwrap_or_else(|| current.media_lookup_id.clone());

        let existing_targets = content_repo::list_targets(&self.pool, content_id).await?;
        let target_ids: Vec<Uuid> = match &patch.target_account_ids {
            Some(ids) => ids.clone(),
            None => existing_targets
                .iter()
                .map(|t| t.social_account_id)
                .collect(),
        };
        let accounts = self
            .resolve_targets(workspace_id, current.brand_id, &target_ids)
            .await?;

        if current.get_status() == ContentStatus::Scheduled {
            gate_or_fail(validation_gate(
                content_type.as_deref(),
                caption.as_deref(),
                &media,
                without_media,
                media_lookup_id.as_deref(),
                current.brand_id,
                &target_ids,
                &accounts,
            ))?;
        }

        let mut tx = self.pool.begin().await?;
        let item = content_repo::update_content_fields(
            &mut tx,
            workspace_id,
            content_id,
            content_type.as_deref(),
            caption.as_deref(),
            &tags,
            &media,
            without_media,
            media_lookup_id.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::Conflict("Content item changed concurrently".to_string()))?;

        let targets = if patch.target_account_ids.is_some() {
            content_repo::delete_targets(&mut tx, content_id).await?;
            if target_ids.is_empty() {
                Vec::new()
            } else {
                content_repo::insert_targets(&mut tx, content_id, &target_ids).await?
            }
        } else {
            existing_targets
        };

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(item.brand_id),
                actor_id,
                action: "content.updated",
                subject_type: "content",
                subject_id: item.id,
                detail: json!({ "status": item.status, "targets": targets.len() }),
            },
        )
        .await?;
        tx.commit().await?;

        self.invalidate(content_id).await;

        Ok(ContentDetail { item, targets })
    }

    /// Publish, schedule, or unschedule an existing item.
    pub async fn publish_content(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        content_id: Uuid,
        mode: PublishMode,
    ) -> Result<ContentDetail> {
        let item = content_repo::find_content_by_id(&self.pool, workspace_id, content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;

        match mode {
            PublishMode::Draft => return self.unschedule(workspace_id, actor_id, item).await,
            PublishMode::Now | PublishMode::Schedule { .. } => {}
        }

        match item.get_status() {
            ContentStatus::Draft | ContentStatus::Scheduled | ContentStatus::Failed => {}
            other => {
                return Err(AppError::Conflict(format!(
                    "Content in status {} cannot be published",
                    other.as_str()
                )));
            }
        }

        let existing_targets = content_repo::list_targets(&self.pool, content_id).await?;
        let target_ids: Vec<Uuid> = existing_targets
            .iter()
            .map(|t| t.social_account_id)
            .collect();
        let accounts = self
            .resolve_targets(workspace_id, item.brand_id, &target_ids)
            .await?;

        gate_or_fail(validation_gate(
            item.content_type.as_deref(),
            item.caption.as_deref(),
            &item.media.0,
            item.without_media,
            item.media_lookup_id.as_deref(),
            item.brand_id,
            &target_ids,
            &accounts,
        ))?;

        if let PublishMode::Schedule { at } = mode {
            ensure_future(at)?;
            let mut tx = self.pool.begin().await?;
            let item = content_repo::schedule_content(&mut tx, workspace_id, content_id, at)
                .await?
                .ok_or_else(|| {
                    AppError::Conflict("Content item changed concurrently".to_string())
                })?;
            ActivityService::record_in_tx(
                &mut tx,
                NewActivity {
                    workspace_id,
                    brand_id: Some(item.brand_id),
                    actor_id,
                    action: "content.scheduled",
                    subject_type: "content",
                    subject_id: item.id,
                    detail: json!({ "scheduled_at": at }),
                },
            )
            .await?;
            tx.commit().await?;
            self.invalidate(content_id).await;

            return Ok(ContentDetail {
                item,
                targets: existing_targets,
            });
        }

        self.run_dispatch(actor_id, &item).await?;
        self.invalidate(content_id).await;
        self.get_content(workspace_id, content_id).await
    }

    /// Dispatch one claimed item on behalf of the scheduled publisher.
    pub async fn dispatch_claimed(&self, item: &ContentItem) -> Result<ContentStatus> {
        let status = self.run_dispatch(SYSTEM_ACTOR, item).await?;
        self.invalidate(item.id).await;
        Ok(status)
    }

    /// Archive an item (terminal, any non-archived status).
    pub async fn archive_content(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        content_id: Uuid,
    ) -> Result<ContentItem> {
        let current = content_repo::find_content_by_id(&self.pool, workspace_id, content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;
        if current.get_status() == ContentStatus::Archived {
            return Err(AppError::Conflict(
                "Content is already archived".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let item = content_repo::archive_content(&mut tx, workspace_id, content_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Content item changed concurrently".to_string())
            })?;

        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(item.brand_id),
                actor_id,
                action: "content.archived",
                subject_type: "content",
                subject_id: item.id,
                detail: json!({}),
            },
        )
        .await?;
        tx.commit().await?;

        self.invalidate(content_id).await;
        Ok(item)
    }

    pub async fn get_content(&self, workspace_id: Uuid, content_id: Uuid) -> Result<ContentDetail> {
        if let Some(cache) = self.cache.as_ref() {
            match cache.get_content(content_id).await {
                Ok(Some(cached)) if cached.workspace_id == workspace_id => {
                    metrics::record_cache_event("content", "hit");
                    let targets = content_repo::list_targets(&self.pool, content_id).await?;
                    return Ok(ContentDetail {
                        item: cached,
                        targets,
                    });
                }
                Ok(_) => metrics::record_cache_event("content", "miss"),
                Err(err) => {
                    metrics::record_cache_event("content", "error");
                    tracing::debug!(content_id = %content_id, "content cache read failed: {}", err);
                }
            }
        }

        let item = content_repo::find_content_by_id(&self.pool, workspace_id, content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;
        let targets = content_repo::list_targets(&self.pool, content_id).await?;

        if let Some(cache) = self.cache.as_ref() {
            if let Err(err) = cache.cache_content(&item).await {
                tracing::debug!(content_id = %content_id, "content cache write failed: {}", err);
            }
        }

        Ok(ContentDetail { item, targets })
    }

    pub async fn list_content(
        &self,
        workspace_id: Uuid,
        brand_id: Uuid,
        status: Option<ContentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ContentItem>, i64)> {
        brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

        let status_str = status.map(|s| s.as_str());
        let items = content_repo::list_content_by_brand(
            &self.pool,
            workspace_id,
            brand_id,
            status_str,
            limit,
            offset,
        )
        .await?;
        let total =
            content_repo::count_content_by_brand(&self.pool, workspace_id, brand_id, status_str)
                .await?;

        Ok((items, total))
    }

    // ========================================
    // Internals
    // ========================================

    /// Fetch target accounts and reject ids outside the workspace or brand.
    /// Runs for drafts too: an incomplete draft is fine, a cross-tenant
    /// reference is not.
    async fn resolve_targets(
        &self,
        workspace_id: Uuid,
        brand_id: Uuid,
        target_ids: &[Uuid],
    ) -> Result<Vec<SocialAccount>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }
        let accounts =
            social_account_repo::find_accounts_by_ids(&self.pool, workspace_id, target_ids)
                .await?;
        for id in target_ids {
            let Some(account) = accounts.iter().find(|a| a.id == *id) else {
                return Err(AppError::ValidationError(format!(
                    "Target account {id} does not exist"
                )));
            };
            if account.brand_id != brand_id {
                return Err(AppError::ValidationError(format!(
                    "Target account {id} belongs to another brand"
                )));
            }
        }
        Ok(accounts)
    }

    async fn unschedule(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        item: ContentItem,
    ) -> Result<ContentDetail> {
        match item.get_status() {
            ContentStatus::Draft => {
                let targets = content_repo::list_targets(&self.pool, item.id).await?;
                return Ok(ContentDetail { item, targets });
            }
            ContentStatus::Scheduled => {}
            other => {
                return Err(AppError::Conflict(format!(
                    "Content in status {} cannot return to draft",
                    other.as_str()
                )));
            }
        }

        let mut tx = self.pool.begin().await?;
        let item = content_repo::unschedule_to_draft(&mut tx, workspace_id, item.id)
            .await?
            .ok_or_else(|| AppError::Conflict("Content item changed concurrently".to_string()))?;
        ActivityService::record_in_tx(
            &mut tx,
            NewActivity {
                workspace_id,
                brand_id: Some(item.brand_id),
                actor_id,
                action: "content.unscheduled",
                subject_type: "content",
                subject_id: item.id,
                detail: json!({}),
            },
        )
        .await?;
        tx.commit().await?;
        self.invalidate(item.id).await;

        let targets = content_repo::list_targets(&self.pool, item.id).await?;
        Ok(ContentDetail { item, targets })
    }

    /// Resolve a deferred media lookup into a concrete ref for dispatch.
    /// The stored item keeps its `media_lookup_id`; the resolved asset only
    /// shapes the outgoing payload.
    async fn effective_item(&self, item: &ContentItem) -> Result<ContentItem> {
        if !item.media.0.is_empty() || item.without_media {
            return Ok(item.clone());
        }
        let Some(lookup) = item.media_lookup_id.as_deref() else {
            return Ok(item.clone());
        };

        let mut effective = item.clone();
        match media_repo::find_ready_by_file_name(&self.pool, item.workspace_id, lookup).await? {
            Some(asset) => {
                effective.media = Json(vec![MediaRef {
                    asset_id: asset.id,
                    kind: asset.content_kind.clone(),
                    position: 0,
                }]);
            }
            None => {
                tracing::warn!(
                    content_id = %item.id,
                    lookup = %lookup,
                    "No ready asset matches the media lookup id"
                );
            }
        }
        Ok(effective)
    }

    /// Reset target rows to pending, dispatch each through the seam, record
    /// per-target outcomes, and fold them into the item status.
    async fn run_dispatch(&self, actor_id: Uuid, item: &ContentItem) -> Result<ContentStatus> {
        let existing = content_repo::list_targets(&self.pool, item.id).await?;
        let account_ids: Vec<Uuid> = existing.iter().map(|t| t.social_account_id).collect();

        if account_ids.is_empty() {
            let status = ContentStatus::Failed;
            content_repo::set_publish_outcome(&self.pool, item.id, status.as_str()).await?;
            self.record_outcome(actor_id, item, status, 0, 0).await;
            return Ok(status);
        }

        let accounts =
            social_account_repo::find_accounts_by_ids(&self.pool, item.workspace_id, &account_ids)
                .await?;

        let mut tx = self.pool.begin().await?;
        content_repo::delete_targets(&mut tx, item.id).await?;
        let targets = content_repo::insert_targets(&mut tx, item.id, &account_ids).await?;
        tx.commit().await?;

        let effective = self.effective_item(item).await?;

        let mut published = 0usize;
        let mut failed = 0usize;
        for target in &targets {
            let outcome = self.dispatch_target(&accounts, target, &effective).await?;
            if outcome {
                published += 1;
            } else {
                failed += 1;
            }
        }

        let status = aggregate_outcome(published, failed);
        content_repo::set_publish_outcome(&self.pool, item.id, status.as_str()).await?;
        self.record_outcome(actor_id, item, status, published, failed)
            .await;

        tracing::info!(
            content_id = %item.id,
            status = %status.as_str(),
            published,
            failed,
            "Content dispatch finished"
        );
        Ok(status)
    }

    /// Dispatch one target. Returns whether it published; the outcome row is
    /// written either way.
    async fn dispatch_target(
        &self,
        accounts: &[SocialAccount],
        target: &ContentTarget,
        effective: &ContentItem,
    ) -> Result<bool> {
        let Some(account) = accounts.iter().find(|a| a.id == target.social_account_id) else {
            content_repo::update_target_outcome(
                &self.pool,
                target.id,
                TargetStatus::Failed.as_str(),
                None,
                Some("Account no longer exists"),
            )
            .await?;
            return Ok(false);
        };

        if account.get_status() != AccountStatus::Active {
            content_repo::update_target_outcome(
                &self.pool,
                target.id,
                TargetStatus::Failed.as_str(),
                None,
                Some("Account is not active"),
            )
            .await?;
            metrics::record_dispatch(&account.platform, false);
            return Ok(false);
        }

        match self.dispatcher.dispatch(account, effective).await {
            Ok(outcome) => {
                content_repo::update_target_outcome(
                    &self.pool,
                    target.id,
                    TargetStatus::Published.as_str(),
                    Some(&outcome.external_post_id),
                    None,
                )
                .await?;
                metrics::record_dispatch(&account.platform, true);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    content_id = %effective.id,
                    account_id = %account.id,
                    platform = %account.platform,
                    "Dispatch failed: {}",
                    err
                );
                content_repo::update_target_outcome(
                    &self.pool,
                    target.id,
                    TargetStatus::Failed.as_str(),
                    None,
                    Some(&err.to_string()),
                )
                .await?;
                metrics::record_dispatch(&account.platform, false);
                Ok(false)
            }
        }
    }

    async fn record_outcome(
        &self,
        actor_id: Uuid,
        item: &ContentItem,
        status: ContentStatus,
        published: usize,
        failed: usize,
    ) {
        let action = match status {
            ContentStatus::Published | ContentStatus::PartiallyPublished => "content.published",
            _ => "content.publish_failed",
        };
        let activity = ActivityService::new(self.pool.clone());
        if let Err(err) = activity
            .record(NewActivity {
                workspace_id: item.workspace_id,
                brand_id: Some(item.brand_id),
                actor_id,
                action,
                subject_type: "content",
                subject_id: item.id,
                detail: json!({
                    "status": status.as_str(),
                    "published": published,
                    "failed": failed,
                }),
            })
            .await
        {
            tracing::warn!(content_id = %item.id, "Failed to record publish activity: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::publish::{DispatchError, DispatchOutcome};
    use async_trait::async_trait;

    fn account(brand_id: Uuid, platform: &str, status: &str) -> SocialAccount {
        SocialAccount {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            brand_id,
            platform: platform.to_string(),
            external_id: format!("{platform}-123"),
            display_name: format!("{platform} account"),
            avatar_url: None,
            credentials: Vec::new(),
            status: status.to_string(),
            connected_at: Utc::now(),
            disconnected_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn media_ref() -> MediaRef {
        MediaRef {
            asset_id: Uuid::new_v4(),
            kind: "image".to_string(),
            position: 0,
        }
    }

    #[test]
    fn gate_passes_a_complete_item() {
        let brand_id = Uuid::new_v4();
        let accounts = vec![
            account(brand_id, "instagram", "active"),
            account(brand_id, "facebook", "active"),
        ];
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();

        let failures = validation_gate(
            Some("IMAGE_POST"),
            Some("launch week"),
            &[media_ref()],
            false,
            None,
            brand_id,
            &ids,
            &accounts,
        );
        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    }

    #[test]
    fn gate_collects_every_failure_at_once() {
        let brand_id = Uuid::new_v4();
        let failures = validation_gate(None, None, &[], false, None, brand_id, &[], &[]);

        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|f| f.contains("content type")));
        assert!(failures.iter().any(|f| f.contains("target account")));
    }

    #[test]
    fn gate_rejects_inactive_and_foreign_accounts() {
        let brand_id = Uuid::new_v4();
        let disconnected = account(brand_id, "instagram", "disconnected");
        let foreign = account(Uuid::new_v4(), "facebook", "active");
        let ids = vec![disconnected.id, foreign.id];

        let failures = validation_gate(
            Some("IMAGE_POST"),
            None,
            &[media_ref()],
            false,
            None,
            brand_id,
            &ids,
            &[disconnected, foreign],
        );
        assert!(failures.iter().any(|f| f.contains("is not active")));
        assert!(failures.iter().any(|f| f.contains("another brand")));
    }

    #[test]
    fn gate_rejects_unsupported_platform_pairs() {
        let brand_id = Uuid::new_v4();
        // TikTok has no feed-post rule, so image posts cannot go there.
        let tiktok = account(brand_id, "tiktok", "active");
        let ids = vec![tiktok.id];

        let failures = validation_gate(
            Some("IMAGE_POST"),
            None,
            &[media_ref()],
            false,
            None,
            brand_id,
            &ids,
            &[tiktok],
        );
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("tiktok does not support IMAGE_POST"));
    }

    #[test]
    fn gate_enforces_the_tightest_caption_limit() {
        let brand_id = Uuid::new_v4();
        // X caps feed posts at 280; Facebook would allow far more.
        let accounts = vec![
            account(brand_id, "x", "active"),
            account(brand_id, "facebook", "active"),
        ];
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();
        let long_caption = "x".repeat(300);

        let failures = validation_gate(
            Some("TEXT_POST"),
            Some(&long_caption),
            &[],
            false,
            None,
            brand_id,
            &ids,
            &accounts,
        );
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("allows 280"));

        let ok = validation_gate(
            Some("TEXT_POST"),
            Some(&"x".repeat(280)),
            &[],
            false,
            None,
            brand_id,
            &ids,
            &accounts,
        );
        assert!(ok.is_empty());
    }

    #[test]
    fn gate_media_requirement_honors_escape_hatches() {
        let brand_id = Uuid::new_v4();
        let instagram = vec![account(brand_id, "instagram", "active")];
        let ids: Vec<Uuid> = instagram.iter().map(|a| a.id).collect();

        let missing = validation_gate(
            Some("IMAGE_POST"),
            Some("caption"),
            &[],
            false,
            None,
            brand_id,
            &ids,
            &instagram,
        );
        assert!(missing.iter().any(|f| f.contains("requires media")));

        let without = validation_gate(
            Some("IMAGE_POST"),
            Some("caption"),
            &[],
            true,
            None,
            brand_id,
            &ids,
            &instagram,
        );
        assert!(without.is_empty());

        let deferred = validation_gate(
            Some("IMAGE_POST"),
            Some("caption"),
            &[],
            false,
            Some("summer-launch.png"),
            brand_id,
            &ids,
            &instagram,
        );
        assert!(deferred.is_empty());
    }

    #[test]
    fn aggregate_outcome_covers_all_splits() {
        assert_eq!(aggregate_outcome(3, 0), ContentStatus::Published);
        assert_eq!(aggregate_outcome(2, 1), ContentStatus::PartiallyPublished);
        assert_eq!(aggregate_outcome(0, 3), ContentStatus::Failed);
        assert_eq!(aggregate_outcome(0, 0), ContentStatus::Failed);
    }

    /// Scripted dispatcher: fails every platform named in `fail`, returns a
    /// canned post id for the rest.
    struct ScriptedDispatcher {
        fail: Vec<&'static str>,
    }

    #[async_trait]
    impl Dispatcher for ScriptedDispatcher {
        async fn dispatch(
            &self,
            account: &SocialAccount,
            _content: &ContentItem,
        ) -> std::result::Result<DispatchOutcome, DispatchError> {
            if self.fail.contains(&account.platform.as_str()) {
                return Err(DispatchError::Rejected {
                    status: 502,
                    body: "upstream error".to_string(),
                });
            }
            Ok(DispatchOutcome {
                external_post_id: format!("{}-post-1", account.platform),
            })
        }
    }

    #[tokio::test]
    async fn scripted_dispatch_folds_into_partial_publish() {
        let brand_id = Uuid::new_v4();
        let accounts = vec![
            account(brand_id, "instagram", "active"),
            account(brand_id, "facebook", "active"),
        ];
        let item = ContentItem {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            brand_id,
            content_type: Some("IMAGE_POST".to_string()),
            caption: None,
            tags: Vec::new(),
            media: Json(vec![media_ref()]),
            without_media: false,
            media_lookup_id: None,
            status: "draft".to_string(),
            scheduled_at: None,
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let dispatcher = ScriptedDispatcher {
            fail: vec!["facebook"],
        };

        let mut published = 0;
        let mut failed = 0;
        for account in &accounts {
            match dispatcher.dispatch(account, &item).await {
                Ok(outcome) => {
                    assert!(outcome.external_post_id.starts_with(&account.platform));
                    published += 1;
                }
                Err(_) => failed += 1,
            }
        }

        assert_eq!(
            aggregate_outcome(published, failed),
            ContentStatus::PartiallyPublished
        );
    }
}
