use crate::models::Brand;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Create a new brand with status "draft"
#[allow(clippy::too_many_arguments)]
pub async fn create_brand(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    name: &str,
    slug: &str,
    description: Option<&str>,
    timezone: &str,
    style: &serde_json::Value,
    profile_completed: bool,
    readiness_score: i16,
) -> Result<Brand, sqlx::Error> {
    let brand = sqlx::query_as::<_, Brand>(
        r#"
        INSERT INTO brands
            (workspace_id, name, slug, status, description, timezone, style, profile_completed, readiness_score)
        VALUES ($1, $2, $3, 'draft', $4, $5, $6, $7, $8)
        RETURNING id, workspace_id, name, slug, status, description, logo_asset_id, style,
                  timezone, profile_completed, publishing_defaults, has_social_account,
                  readiness_score, created_at, updated_at, archived_at
        "#,
    )
    .bind(workspace_id)
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(timezone)
    .bind(style)
    .bind(profile_completed)
    .bind(readiness_score)
    .fetch_one(&mut **tx)
    .await?;

    Ok(brand)
}

/// Find a brand by ID within a workspace
pub async fn find_brand_by_id(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Uuid,
) -> Result<Option<Brand>, sqlx::Error> {
    let brand = sqlx::query_as::<_, Brand>(
        r#"
        SELECT id, workspace_id, name, slug, status, description, logo_asset_id, style,
               timezone, profile_completed, publishing_defaults, has_social_account,
               readiness_score, created_at, updated_at, archived_at
        FROM brands
        WHERE id = $1 AND workspace_id = $2
        "#,
    )
    .bind(brand_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(brand)
}

/// List brands in a workspace, newest first
pub async fn list_brands(
    pool: &PgPool,
    workspace_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Brand>, sqlx::Error> {
    let brands = sqlx::query_as::<_, Brand>(
        r#"
        SELECT id, workspace_id, name, slug, status, description, logo_asset_id, style,
               timezone, profile_completed, publishing_defaults, has_social_account,
               readiness_score, created_at, updated_at, archived_at
        FROM brands
        WHERE workspace_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(workspace_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(brands)
}

/// Count brands in a workspace
pub async fn count_brands(pool: &PgPool, workspace_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM brands WHERE workspace_id = $1")
        .bind(workspace_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Check whether a slug is already taken within a workspace
pub async fn slug_exists(
    pool: &PgPool,
    workspace_id: Uuid,
    slug: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM brands WHERE workspace_id = $1 AND slug = $2) as taken",
    )
    .bind(workspace_id)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<bool, _>("taken"))
}

/// Update brand profile fields (full-row write; the service merges the patch)
#[allow(clippy::too_many_arguments)]
pub async fn update_brand_profile(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Uuid,
    name: &str,
    description: Option<&str>,
    timezone: &str,
    style: &serde_json::Value,
    logo_asset_id: Option<Uuid>,
    profile_completed: bool,
    readiness_score: i16,
) -> Result<Option<Brand>, sqlx::Error> {
    let brand = sqlx::query_as::<_, Brand>(
        r#"
        UPDATE brands
        SET name = $3, description = $4, timezone = $5, style = $6,
            logo_asset_id = $7, profile_completed = $8, readiness_score = $9, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2
        RETURNING id, workspace_id, name, slug, status, description, logo_asset_id, style,
                  timezone, profile_completed, publishing_defaults, has_social_account,
                  readiness_score, created_at, updated_at, archived_at
        "#,
    )
    .bind(brand_id)
    .bind(workspace_id)
    .bind(name)
    .bind(description)
    .bind(timezone)
    .bind(style)
    .bind(logo_asset_id)
    .bind(profile_completed)
    .bind(readiness_score)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(brand)
}

/// Store publishing defaults JSON
pub async fn set_publishing_defaults(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Uuid,
    defaults: &serde_json::Value,
    readiness_score: i16,
) -> Result<Option<Brand>, sqlx::Error> {
    let brand = sqlx::query_as::<_, Brand>(
        r#"
        UPDATE brands
        SET publishing_defaults = $3, readiness_score = $4, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2
        RETURNING id, workspace_id, name, slug, status, description, logo_asset_id, style,
                  timezone, profile_completed, publishing_defaults, has_social_account,
                  readiness_score, created_at, updated_at, archived_at
        "#,
    )
    .bind(brand_id)
    .bind(workspace_id)
    .bind(defaults)
    .bind(readiness_score)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(brand)
}

/// Transition brand status, guarded by the expected current status.
/// Returns `None` when the brand is missing or the guard failed (raced).
pub async fn update_brand_status(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Uuid,
    from: &str,
    to: &str,
) -> Result<Option<Brand>, sqlx::Error> {
    let brand = sqlx::query_as::<_, Brand>(
        r#"
        UPDATE brands
        SET status = $4,
            archived_at = CASE WHEN $4 = 'archived' THEN NOW() ELSE NULL END,
            updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status = $3
        RETURNING id, workspace_id, name, slug, status, description, logo_asset_id, style,
                  timezone, profile_completed, publishing_defaults, has_social_account,
                  readiness_score, created_at, updated_at, archived_at
        "#,
    )
    .bind(brand_id)
    .bind(workspace_id)
    .bind(from)
    .bind(to)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(brand)
}

/// Persist both readiness fields in one update
pub async fn update_readiness(
    pool: &PgPool,
    brand_id: Uuid,
    has_social_account: bool,
    readiness_score: i16,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE brands
        SET has_social_account = $2, readiness_score = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(brand_id)
    .bind(has_social_account)
    .bind(readiness_score)
    .execute(pool)
    .await?;

    Ok(())
}
