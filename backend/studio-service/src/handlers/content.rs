/// Content handlers - compose, edit, publish, archive
use crate::cache::StudioCache;
use crate::error::{AppError, Result};
use crate::handlers::{double_option, PaginationParams};
use crate::middleware::AuthContext;
use crate::models::{ContentItem, ContentStatus, MediaRef};
use crate::services::content::{ContentPatch, NewContent};
use crate::services::{ContentService, Dispatcher, PublishMode};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Wire form of the publish mode; `schedule` needs `scheduled_at` beside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishModeRequest {
    Draft,
    Now,
    Schedule,
}

fn resolve_mode(
    mode: Option<PublishModeRequest>,
    scheduled_at: Option<DateTime<Utc>>,
    default: PublishModeRequest,
) -> Result<PublishMode> {
    match mode.unwrap_or(default) {
        PublishModeRequest::Draft => Ok(PublishMode::Draft),
        PublishModeRequest::Now => Ok(PublishMode::Now),
        PublishModeRequest::Schedule => {
            let at = scheduled_at.ok_or_else(|| {
                AppError::ValidationError(
                    "scheduled_at is required when mode is schedule".to_string(),
                )
            })?;
            Ok(PublishMode::Schedule { at })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateContentRequest {
    pub brand_id: Uuid,
    pub content_type: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub without_media: bool,
    pub media_lookup_id: Option<String>,
    #[serde(default)]
    pub target_account_ids: Vec<Uuid>,
    pub mode: Option<PublishModeRequest>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateContentRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub content_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub caption: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub media: Option<Vec<MediaRef>>,
    pub without_media: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub media_lookup_id: Option<Option<String>>,
    pub target_account_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishContentRequest {
    pub mode: Option<PublishModeRequest>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ContentListQuery {
    pub brand_id: Uuid,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContentListResponse {
    pub items: Vec<ContentItem>,
    pub total_count: i64,
    pub has_more: bool,
}

fn content_service(
    pool: &PgPool,
    dispatcher: &Arc<dyn Dispatcher>,
    cache: &Arc<StudioCache>,
) -> ContentService {
    ContentService::with_cache(pool.clone(), dispatcher.clone(), cache.clone())
}

/// Create a content item as draft, publish it now, or schedule it
/// POST /v1/content
pub async fn create_content(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<dyn Dispatcher>>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    req: web::Json<CreateContentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let mode = resolve_mode(req.mode, req.scheduled_at, PublishModeRequest::Draft)?;

    let service = content_service(&pool, &dispatcher, &cache);
    let detail = service
        .create_content(
            auth.workspace_id,
            auth.user_id,
            NewContent {
                brand_id: req.brand_id,
                content_type: req.content_type,
                caption: req.caption,
                tags: req.tags,
                media: req.media,
                without_media: req.without_media,
                media_lookup_id: req.media_lookup_id,
                target_account_ids: req.target_account_ids,
            },
            mode,
        )
        .await?;

    Ok(HttpResponse::Created().json(detail))
}

/// List content for a brand, optionally filtered by status
/// GET /v1/content?brand_id=&status=
pub async fn list_content(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<dyn Dispatcher>>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    query: web::Query<ContentListQuery>,
    page: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let status = query
        .status
        .as_deref()
        .map(ContentStatus::try_from)
        .transpose()?;
    let (limit, offset) = page.clamp();

    let service = content_service(&pool, &dispatcher, &cache);
    let (items, total) = service
        .list_content(auth.workspace_id, query.brand_id, status, limit, offset)
        .await?;

    let has_more = (offset + limit) < total;

    Ok(HttpResponse::Ok().json(ContentListResponse {
        items,
        total_count: total,
        has_more,
    }))
}

/// Get a content item with its per-target outcomes
/// GET /v1/content/{id}
pub async fn get_content(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<dyn Dispatcher>>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    content_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = content_service(&pool, &dispatcher, &cache);
    let detail = service.get_content(auth.workspace_id, *content_id).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Edit a draft, scheduled, or failed item
/// PATCH /v1/content/{id}
pub async fn update_content(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<dyn Dispatcher>>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    content_id: web::Path<Uuid>,
    req: web::Json<UpdateContentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let service = content_service(&pool, &dispatcher, &cache);
    let detail = service
        .update_content(
            auth.workspace_id,
            auth.user_id,
            *content_id,
            ContentPatch {
                content_type: req.content_type,
                caption: req.caption,
                tags: req.tags,
                media: req.media,
                without_media: req.without_media,
                media_lookup_id: req.media_lookup_id,
                target_account_ids: req.target_account_ids,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Publish now, (re)schedule, or back a scheduled item out to draft
/// POST /v1/content/{id}/publish
pub async fn publish_content(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<dyn Dispatcher>>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    content_id: web::Path<Uuid>,
    req: web::Json<PublishContentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let mode = resolve_mode(req.mode, req.scheduled_at, PublishModeRequest::Now)?;

    let service = content_service(&pool, &dispatcher, &cache);
    let detail = service
        .publish_content(auth.workspace_id, auth.user_id, *content_id, mode)
        .await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// Archive a content item
/// POST /v1/content/{id}/archive
pub async fn archive_content(
    pool: web::Data<PgPool>,
    dispatcher: web::Data<Arc<dyn Dispatcher>>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    content_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = content_service(&pool, &dispatcher, &cache);
    let item = service
        .archive_content(auth.workspace_id, auth.user_id, *content_id)
        .await?;

    Ok(HttpResponse::Ok().json(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_differ_per_endpoint() {
        // Compose endpoint defaults to draft, publish endpoint to now.
        assert_eq!(
            resolve_mode(None, None, PublishModeRequest::Draft).unwrap(),
            PublishMode::Draft
        );
        assert_eq!(
            resolve_mode(None, None, PublishModeRequest::Now).unwrap(),
            PublishMode::Now
        );
    }

    #[test]
    fn schedule_mode_requires_a_timestamp() {
        let err = resolve_mode(
            Some(PublishModeRequest::Schedule),
            None,
            PublishModeRequest::Draft,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let at = Utc::now();
        assert_eq!(
            resolve_mode(
                Some(PublishModeRequest::Schedule),
                Some(at),
                PublishModeRequest::Draft
            )
            .unwrap(),
            PublishMode::Schedule { at }
        );
    }

    #[test]
    fn create_request_fills_composer_defaults() {
        let req: CreateContentRequest = serde_json::from_value(serde_json::json!({
            "brand_id": "7b9f8a35-1111-4222-8333-444455556666"
        }))
        .unwrap();

        assert!(req.tags.is_empty());
        assert!(req.media.is_empty());
        assert!(!req.without_media);
        assert!(req.target_account_ids.is_empty());
        assert!(req.mode.is_none());
    }

    #[test]
    fn publish_request_mode_parses_snake_case() {
        let req: PublishContentRequest =
            serde_json::from_str(r#"{"mode":"schedule","scheduled_at":"2026-09-01T10:00:00Z"}"#)
                .unwrap();
        assert_eq!(req.mode, Some(PublishModeRequest::Schedule));
        assert!(req.scheduled_at.is_some());

        let req: PublishContentRequest = serde_json::from_str("{}").unwrap();
        assert!(req.mode.is_none());
    }
}
