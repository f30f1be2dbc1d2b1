/// Brand handlers - HTTP endpoints for brand lifecycle and profile
use crate::cache::StudioCache;
use crate::error::Result;
use crate::handlers::{double_option, PaginationParams};
use crate::middleware::AuthContext;
use crate::services::{ActivityService, BrandService};
use crate::services::brands::{BrandPatch, NewBrand};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub style: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub timezone: Option<String>,
    pub style: Option<Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_asset_id: Option<Option<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct BrandListResponse {
    pub brands: Vec<crate::models::Brand>,
    pub total_count: i64,
    pub has_more: bool,
}

/// Create a new brand
/// POST /v1/brands
pub async fn create_brand(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    req: web::Json<CreateBrandRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let req = req.into_inner();
    let brand = service
        .create_brand(
            auth.workspace_id,
            auth.user_id,
            NewBrand {
                name: req.name,
                description: req.description,
                timezone: req.timezone,
                style: req.style,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(brand))
}

/// Get a brand by ID
/// GET /v1/brands/{id}
pub async fn get_brand(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let brand = service.get_brand(auth.workspace_id, *brand_id).await?;

    Ok(HttpResponse::Ok().json(brand))
}

/// List brands in the workspace
/// GET /v1/brands
pub async fn list_brands(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.clamp();
    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let (brands, total) = service.list_brands(auth.workspace_id, limit, offset).await?;

    let has_more = (offset + limit) < total;

    Ok(HttpResponse::Ok().json(BrandListResponse {
        brands,
        total_count: total,
        has_more,
    }))
}

/// Update a brand profile
/// PATCH /v1/brands/{id}
pub async fn update_brand(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
    req: web::Json<UpdateBrandRequest>,
) -> Result<HttpResponse> {
    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let req = req.into_inner();
    let brand = service
        .update_brand(
            auth.workspace_id,
            auth.user_id,
            *brand_id,
            BrandPatch {
                name: req.name,
                description: req.description,
                timezone: req.timezone,
                style: req.style,
                logo_asset_id: req.logo_asset_id,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(brand))
}

/// Replace a brand's publishing defaults
/// PUT /v1/brands/{id}/publishing-defaults
pub async fn set_publishing_defaults(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
    defaults: web::Json<Value>,
) -> Result<HttpResponse> {
    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let brand = service
        .set_publishing_defaults(auth.workspace_id, auth.user_id, *brand_id, defaults.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(brand))
}

/// Archive a brand
/// POST /v1/brands/{id}/archive
pub async fn archive_brand(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let brand = service
        .archive_brand(auth.workspace_id, auth.user_id, *brand_id)
        .await?;

    Ok(HttpResponse::Ok().json(brand))
}

/// Reactivate an archived or draft brand
/// POST /v1/brands/{id}/activate
pub async fn activate_brand(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<StudioCache>>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = BrandService::with_cache((**pool).clone(), cache.get_ref().clone());
    let brand = service
        .activate_brand(auth.workspace_id, auth.user_id, *brand_id)
        .await?;

    Ok(HttpResponse::Ok().json(brand))
}

/// List recent activity for a brand
/// GET /v1/brands/{id}/activity
pub async fn get_brand_activity(
    pool: web::Data<PgPool>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.clamp();
    let service = ActivityService::new((**pool).clone());
    let entries = service
        .list_for_brand(auth.workspace_id, *brand_id, limit, offset)
        .await?;

    Ok(HttpResponse::Ok().json(entries))
}
