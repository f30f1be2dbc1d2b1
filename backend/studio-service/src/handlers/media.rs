/// Media handlers - presigned direct upload endpoints
use crate::config::Config;
use crate::error::Result;
use crate::middleware::AuthContext;
use crate::models::MediaAsset;
use crate::services::media::{FinalizeUpload, StartUpload};
use crate::services::MediaService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct StartUploadRequest {
    pub brand_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub mime_type: String,
    #[validate(range(min = 1))]
    pub byte_size: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeUploadRequest {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_ms: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub asset: MediaAsset,
    pub upload_url: String,
}

fn media_service(pool: &PgPool, s3: &aws_sdk_s3::Client, config: &Config) -> MediaService {
    MediaService::new(pool.clone(), s3.clone(), config.storage.clone())
}

/// Register an upload and presign the PUT URL
/// POST /v1/media/uploads
pub async fn start_upload(
    pool: web::Data<PgPool>,
    s3: web::Data<aws_sdk_s3::Client>,
    config: web::Data<Config>,
    auth: AuthContext,
    req: web::Json<StartUploadRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = media_service(&pool, &s3, &config);
    let req = req.into_inner();
    let (asset, upload_url) = service
        .start_upload(
            auth.workspace_id,
            StartUpload {
                brand_id: req.brand_id,
                file_name: req.file_name,
                mime_type: req.mime_type,
                byte_size: req.byte_size,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(UploadResponse { asset, upload_url }))
}

/// Confirm the object landed and flip the asset to ready
/// POST /v1/media/uploads/{id}/finalize
pub async fn finalize_upload(
    pool: web::Data<PgPool>,
    s3: web::Data<aws_sdk_s3::Client>,
    config: web::Data<Config>,
    auth: AuthContext,
    asset_id: web::Path<Uuid>,
    req: web::Json<FinalizeUploadRequest>,
) -> Result<HttpResponse> {
    let service = media_service(&pool, &s3, &config);
    let req = req.into_inner();
    let asset = service
        .finalize_upload(
            auth.workspace_id,
            *asset_id,
            FinalizeUpload {
                width: req.width,
                height: req.height,
                duration_ms: req.duration_ms,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(asset))
}

/// Get a media asset by ID
/// GET /v1/media/uploads/{id}
pub async fn get_asset(
    pool: web::Data<PgPool>,
    s3: web::Data<aws_sdk_s3::Client>,
    config: web::Data<Config>,
    auth: AuthContext,
    asset_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = media_service(&pool, &s3, &config);
    let asset = service.get_asset(auth.workspace_id, *asset_id).await?;

    Ok(HttpResponse::Ok().json(asset))
}
