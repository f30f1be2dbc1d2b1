//! Media uploads: presign, direct PUT by the client, finalize.
//!
//! Assets start as `pending` rows. The client PUTs the object straight to
//! storage with the presigned URL, then calls finalize; only a confirmed
//! HEAD flips the row to `ready`.

use crate::config::StorageConfig;
use crate::db::{brand_repo, media_repo};
use crate::error::{AppError, Result};
use crate::models::{AssetStatus, ContentKind, MediaAsset};
use crate::validators;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/webm"];

fn content_kind_for(mime_type: &str) -> Option<ContentKind> {
    if IMAGE_MIME_TYPES.contains(&mime_type) {
        Some(ContentKind::Image)
    } else if VIDEO_MIME_TYPES.contains(&mime_type) {
        Some(ContentKind::Video)
    } else {
        None
    }
}

fn build_storage_key(workspace_id: Uuid, asset_id: Uuid, file_name: &str) -> String {
    format!("media/{workspace_id}/{asset_id}/{file_name}")
}

#[derive(Debug)]
pub struct StartUpload {
    pub brand_id: Option<Uuid>,
    pub file_name: String,
    pub mime_type: String,
    pub byte_size: i64,
}

#[derive(Debug, Default)]
pub struct FinalizeUpload {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_ms: Option<i32>,
}

pub struct MediaService {
    pool: PgPool,
    s3: Client,
    storage: StorageConfig,
}

impl MediaService {
    pub fn new(pool: PgPool, s3: Client, storage: StorageConfig) -> Self {
        Self { pool, s3, storage }
    }

    /// Validate the request, insert a pending asset, and presign the PUT.
    pub async fn start_upload(
        &self,
        workspace_id: Uuid,
        req: StartUpload,
    ) -> Result<(MediaAsset, String)> {
        if !validators::validate_file_name(&req.file_name) {
            return Err(AppError::ValidationError(
                "Invalid file name".to_string(),
            ));
        }

        let kind = content_kind_for(&req.mime_type).ok_or_else(|| {
            AppError::ValidationError(format!("Unsupported media type: {}", req.mime_type))
        })?;

        if req.byte_size <= 0 {
            return Err(AppError::ValidationError(
                "File size must be positive".to_string(),
            ));
        }
        if req.byte_size > self.storage.max_upload_bytes {
            return Err(AppError::ValidationError(format!(
                "File exceeds the {} byte upload limit",
                self.storage.max_upload_bytes
            )));
        }

        if let Some(brand_id) = req.brand_id {
            brand_repo::find_brand_by_id(&self.pool, workspace_id, brand_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;
        }

        let asset_id = Uuid::new_v4();
        let storage_key = build_storage_key(workspace_id, asset_id, &req.file_name);

        let asset = media_repo::insert_asset(
            &self.pool,
            asset_id,
            workspace_id,
            req.brand_id,
            &req.file_name,
            kind.as_str(),
            &req.mime_type,
            req.byte_size,
            &storage_key,
        )
        .await?;

        let upload_url = presign_put(
            &self.s3,
            &self.storage.bucket,
            &storage_key,
            &req.mime_type,
            self.storage.upload_expiry_secs,
        )
        .await?;

        tracing::info!(asset_id = %asset.id, workspace_id = %workspace_id, "upload started");
        Ok((asset, upload_url))
    }

    /// Confirm the object landed in storage and flip the asset to `ready`.
    /// A missing object marks the asset `failed`.
    pub async fn finalize_upload(
        &self,
        workspace_id: Uuid,
        asset_id: Uuid,
        meta: FinalizeUpload,
    ) -> Result<MediaAsset> {
        let asset = self.get_asset(workspace_id, asset_id).await?;

        if asset.get_status() != AssetStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Cannot finalize an asset in status {}",
                asset.status
            )));
        }

        let size = head_object_size(&self.s3, &self.storage.bucket, &asset.storage_key).await?;

        match size {
            Some(byte_size) => {
                let asset = media_repo::finalize_asset(
                    &self.pool,
                    workspace_id,
                    asset_id,
                    byte_size,
                    meta.width,
                    meta.height,
                    meta.duration_ms,
                )
                .await?
                .ok_or_else(|| {
                    AppError::Conflict("Asset status changed concurrently".to_string())
                })?;

                tracing::info!(asset_id = %asset_id, byte_size, "upload finalized");
                Ok(asset)
            }
            None => {
                media_repo::mark_asset_failed(&self.pool, workspace_id, asset_id).await?;
                Err(AppError::ValidationError(
                    "Uploaded object not found in storage".to_string(),
                ))
            }
        }
    }

    pub async fn get_asset(&self, workspace_id: Uuid, asset_id: Uuid) -> Result<MediaAsset> {
        media_repo::find_asset_by_id(&self.pool, workspace_id, asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Media asset not found".to_string()))
    }

    /// Resolve the media-lookup-ID convention: the most recent ready asset
    /// with this exact file name in the workspace.
    pub async fn resolve_lookup(
        &self,
        workspace_id: Uuid,
        file_name: &str,
    ) -> Result<Option<MediaAsset>> {
        let asset = media_repo::find_ready_by_file_name(&self.pool, workspace_id, file_name).await?;
        Ok(asset)
    }
}

/// Generate a presigned PUT URL allowing direct upload without exposing
/// storage credentials to the client.
pub async fn presign_put(
    client: &Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    expires_secs: u64,
) -> Result<String> {
    let presigning_config = PresigningConfig::builder()
        .expires_in(Duration::from_secs(expires_secs))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create presigning config: {e}")))?;

    let presigned_request = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .presigned(presigning_config)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to generate presigned URL: {e}")))?;

    Ok(presigned_request.uri().to_string())
}

/// HEAD the object; `None` means it does not exist.
async fn head_object_size(client: &Client, bucket: &str, key: &str) -> Result<Option<i64>> {
    match client.head_object().bucket(bucket).key(key).send().await {
        Ok(head) => Ok(Some(head.content_length().unwrap_or(0))),
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("404") || error_msg.contains("NotFound") {
                Ok(None)
            } else {
                Err(AppError::StorageError(format!(
                    "Failed to verify object: {e}"
                )))
            }
        }
    }
}

/// Build the S3 client from config. Custom endpoints support S3-compatible
/// storage such as MinIO in development.
pub async fn build_s3_client(storage: &StorageConfig) -> Client {
    use aws_sdk_s3::config::Region;

    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(storage.region.clone()));

    if let Some(endpoint) = &storage.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    let aws_config = builder.load().await;
    Client::new(&aws_config)
}

/// Startup connectivity check: credentials, bucket existence, list permission.
pub async fn storage_health_check(client: &Client, bucket: &str) -> Result<()> {
    client
        .list_objects_v2()
        .bucket(bucket)
        .max_keys(1)
        .send()
        .await
        .map_err(|e| AppError::StorageError(format!("S3 health check failed: {e}")))?;

    tracing::info!(bucket, "S3 connection validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_whitelist_maps_to_kind() {
        assert_eq!(content_kind_for("image/jpeg"), Some(ContentKind::Image));
        assert_eq!(content_kind_for("image/webp"), Some(ContentKind::Image));
        assert_eq!(content_kind_for("video/mp4"), Some(ContentKind::Video));
        assert_eq!(content_kind_for("video/quicktime"), Some(ContentKind::Video));

        assert_eq!(content_kind_for("application/pdf"), None);
        assert_eq!(content_kind_for("image/svg+xml"), None);
        assert_eq!(content_kind_for(""), None);
    }

    #[test]
    fn storage_key_is_scoped_and_unique_per_asset() {
        let ws = Uuid::new_v4();
        let asset = Uuid::new_v4();
        let key = build_storage_key(ws, asset, "launch.png");

        assert_eq!(key, format!("media/{ws}/{asset}/launch.png"));
    }
}
