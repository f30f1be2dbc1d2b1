use crate::models::MediaAsset;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a new asset record with status "pending". The id is assigned by
/// the caller so the storage key can embed it before the row exists.
#[allow(clippy::too_many_arguments)]
pub async fn insert_asset(
    pool: &PgPool,
    asset_id: Uuid,
    workspace_id: Uuid,
    brand_id: Option<Uuid>,
    file_name: &str,
    content_kind: &str,
    mime_type: &str,
    byte_size: i64,
    storage_key: &str,
) -> Result<MediaAsset, sqlx::Error> {
    let asset = sqlx::query_as::<_, MediaAsset>(
        r#"
        INSERT INTO media_assets
            (id, workspace_id, brand_id, file_name, content_kind, mime_type, byte_size, storage_key, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
        RETURNING id, workspace_id, brand_id, file_name, content_kind, mime_type,
                  byte_size, storage_key, status, width, height, duration_ms,
                  created_at, updated_at
        "#,
    )
    .bind(asset_id)
    .bind(workspace_id)
    .bind(brand_id)
    .bind(file_name)
    .bind(content_kind)
    .bind(mime_type)
    .bind(byte_size)
    .bind(storage_key)
    .fetch_one(pool)
    .await?;

    Ok(asset)
}

/// Find an asset by ID within a workspace
pub async fn find_asset_by_id(
    pool: &PgPool,
    workspace_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<MediaAsset>, sqlx::Error> {
    let asset = sqlx::query_as::<_, MediaAsset>(
        r#"
        SELECT id, workspace_id, brand_id, file_name, content_kind, mime_type,
               byte_size, storage_key, status, width, height, duration_ms,
               created_at, updated_at
        FROM media_assets
        WHERE id = $1 AND workspace_id = $2
        "#,
    )
    .bind(asset_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(asset)
}

/// Promote a pending asset to "ready" once the object is confirmed in storage.
/// The byte size is replaced with what storage actually reports.
#[allow(clippy::too_many_arguments)]
pub async fn finalize_asset(
    pool: &PgPool,
    workspace_id: Uuid,
    asset_id: Uuid,
    byte_size: i64,
    width: Option<i32>,
    height: Option<i32>,
    duration_ms: Option<i32>,
) -> Result<Option<MediaAsset>, sqlx::Error> {
    let asset = sqlx::query_as::<_, MediaAsset>(
        r#"
        UPDATE media_assets
        SET status = 'ready', byte_size = $3, width = $4, height = $5,
            duration_ms = $6, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status = 'pending'
        RETURNING id, workspace_id, brand_id, file_name, content_kind, mime_type,
                  byte_size, storage_key, status, width, height, duration_ms,
                  created_at, updated_at
        "#,
    )
    .bind(asset_id)
    .bind(workspace_id)
    .bind(byte_size)
    .bind(width)
    .bind(height)
    .bind(duration_ms)
    .fetch_optional(pool)
    .await?;

    Ok(asset)
}

/// Mark a pending asset as failed (upload never confirmed)
pub async fn mark_asset_failed(
    pool: &PgPool,
    workspace_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<MediaAsset>, sqlx::Error> {
    let asset = sqlx::query_as::<_, MediaAsset>(
        r#"
        UPDATE media_assets
        SET status = 'failed', updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status = 'pending'
        RETURNING id, workspace_id, brand_id, file_name, content_kind, mime_type,
                  byte_size, storage_key, status, width, height, duration_ms,
                  created_at, updated_at
        "#,
    )
    .bind(asset_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(asset)
}

/// Resolve the most recent ready asset with this exact file name
pub async fn find_ready_by_file_name(
    pool: &PgPool,
    workspace_id: Uuid,
    file_name: &str,
) -> Result<Option<MediaAsset>, sqlx::Error> {
    let asset = sqlx::query_as::<_, MediaAsset>(
        r#"
        SELECT id, workspace_id, brand_id, file_name, content_kind, mime_type,
               byte_size, storage_key, status, width, height, duration_ms,
               created_at, updated_at
        FROM media_assets
        WHERE workspace_id = $1 AND file_name = $2 AND status = 'ready'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(workspace_id)
    .bind(file_name)
    .fetch_optional(pool)
    .await?;

    Ok(asset)
}

