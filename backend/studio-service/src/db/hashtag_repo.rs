use crate::models::HashtagPreset;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Insert a hashtag preset
pub async fn insert_preset(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Uuid,
    name: &str,
    tags: &[String],
) -> Result<HashtagPreset, sqlx::Error> {
    let preset = sqlx::query_as::<_, HashtagPreset>(
        r#"
        INSERT INTO hashtag_presets (workspace_id, brand_id, name, tags)
        VALUES ($1, $2, $3, $4)
        RETURNING id, workspace_id, brand_id, name, tags, created_at, updated_at
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(name)
    .bind(tags)
    .fetch_one(&mut **tx)
    .await?;

    Ok(preset)
}

/// Find a preset by ID within a workspace
pub async fn find_preset_by_id(
    pool: &PgPool,
    workspace_id: Uuid,
    preset_id: Uuid,
) -> Result<Option<HashtagPreset>, sqlx::Error> {
    let preset = sqlx::query_as::<_, HashtagPreset>(
        r#"
        SELECT id, workspace_id, brand_id, name, tags, created_at, updated_at
        FROM hashtag_presets
        WHERE id = $1 AND workspace_id = $2
        "#,
    )
    .bind(preset_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(preset)
}

/// Check whether a preset name is already used within a brand
pub async fn name_exists(
    pool: &PgPool,
    brand_id: Uuid,
    name: &str,
    exclude_id: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM hashtag_presets
            WHERE brand_id = $1 AND name = $2 AND ($3::uuid IS NULL OR id <> $3)
        ) as taken
        "#,
    )
    .bind(brand_id)
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<bool, _>("taken"))
}

/// List presets for a brand, alphabetical
pub async fn list_presets_by_brand(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Uuid,
) -> Result<Vec<HashtagPreset>, sqlx::Error> {
    let presets = sqlx::query_as::<_, HashtagPreset>(
        r#"
        SELECT id, workspace_id, brand_id, name, tags, created_at, updated_at
        FROM hashtag_presets
        WHERE workspace_id = $1 AND brand_id = $2
        ORDER BY name
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(presets)
}

/// Update preset name and tags
pub async fn update_preset(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    preset_id: Uuid,
    name: &str,
    tags: &[String],
) -> Result<Option<HashtagPreset>, sqlx::Error> {
    let preset = sqlx::query_as::<_, HashtagPreset>(
        r#"
        UPDATE hashtag_presets
        SET name = $3, tags = $4, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2
        RETURNING id, workspace_id, brand_id, name, tags, created_at, updated_at
        "#,
    )
    .bind(preset_id)
    .bind(workspace_id)
    .bind(name)
    .bind(tags)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(preset)
}

/// Delete a preset; returns whether a row was removed
pub async fn delete_preset(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    preset_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM hashtag_presets WHERE id = $1 AND workspace_id = $2")
        .bind(preset_id)
        .bind(workspace_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}
