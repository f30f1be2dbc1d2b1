/// Hashtag preset handlers - reusable tag sets per brand
use crate::error::Result;
use crate::middleware::AuthContext;
use crate::services::HashtagService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePresetRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePresetRequest {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Create a hashtag preset for a brand
/// POST /v1/brands/{id}/hashtag-presets
pub async fn create_preset(
    pool: web::Data<PgPool>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
    req: web::Json<CreatePresetRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = HashtagService::new((**pool).clone());
    let req = req.into_inner();
    let preset = service
        .create_preset(auth.workspace_id, auth.user_id, *brand_id, &req.name, req.tags)
        .await?;

    Ok(HttpResponse::Created().json(preset))
}

/// List hashtag presets for a brand
/// GET /v1/brands/{id}/hashtag-presets
pub async fn list_presets(
    pool: web::Data<PgPool>,
    auth: AuthContext,
    brand_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = HashtagService::new((**pool).clone());
    let presets = service.list_presets(auth.workspace_id, *brand_id).await?;

    Ok(HttpResponse::Ok().json(presets))
}

/// Rename a preset or replace its tags
/// PUT /v1/hashtag-presets/{id}
pub async fn update_preset(
    pool: web::Data<PgPool>,
    auth: AuthContext,
    preset_id: web::Path<Uuid>,
    req: web::Json<UpdatePresetRequest>,
) -> Result<HttpResponse> {
    let service = HashtagService::new((**pool).clone());
    let req = req.into_inner();
    let preset = service
        .update_preset(auth.workspace_id, auth.user_id, *preset_id, req.name, req.tags)
        .await?;

    Ok(HttpResponse::Ok().json(preset))
}

/// Delete a preset
/// DELETE /v1/hashtag-presets/{id}
pub async fn delete_preset(
    pool: web::Data<PgPool>,
    auth: AuthContext,
    preset_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = HashtagService::new((**pool).clone());
    service
        .delete_preset(auth.workspace_id, auth.user_id, *preset_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
