use crate::models::{ContentItem, ContentTarget, MediaRef};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Insert a new content item with status "draft"
#[allow(clippy::too_many_arguments)]
pub async fn insert_content(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Uuid,
    content_type: Option<&str>,
    caption: Option<&str>,
    tags: &[String],
    media: &[MediaRef],
    without_media: bool,
    media_lookup_id: Option<&str>,
) -> Result<ContentItem, sqlx::Error> {
    let content = sqlx::query_as::<_, ContentItem>(
        r#"
        INSERT INTO content_items
            (workspace_id, brand_id, content_type, caption, tags, media, without_media, media_lookup_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft')
        RETURNING id, workspace_id, brand_id, content_type, caption, tags, media,
                  without_media, media_lookup_id, status, scheduled_at, published_at,
                  created_at, updated_at
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(content_type)
    .bind(caption)
    .bind(tags)
    .bind(Json(media))
    .bind(without_media)
    .bind(media_lookup_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(content)
}

/// Find a content item by ID within a workspace
pub async fn find_content_by_id(
    pool: &PgPool,
    workspace_id: Uuid,
    content_id: Uuid,
) -> Result<Option<ContentItem>, sqlx::Error> {
    let content = sqlx::query_as::<_, ContentItem>(
        r#"
        SELECT id, workspace_id, brand_id, content_type, caption, tags, media,
               without_media, media_lookup_id, status, scheduled_at, published_at,
               created_at, updated_at
        FROM content_items
        WHERE id = $1 AND workspace_id = $2
        "#,
    )
    .bind(content_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(content)
}

/// List content for a brand, newest first, optionally filtered by status
pub async fn list_content_by_brand(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Uuid,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ContentItem>, sqlx::Error> {
    let items = sqlx::query_as::<_, ContentItem>(
        r#"
        SELECT id, workspace_id, brand_id, content_type, caption, tags, media,
               without_media, media_lookup_id, status, scheduled_at, published_at,
               created_at, updated_at
        FROM content_items
        WHERE workspace_id = $1 AND brand_id = $2
          AND ($3::text IS NULL OR status = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Count content for a brand with the same optional status filter
pub async fn count_content_by_brand(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Uuid,
    status: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as count
        FROM content_items
        WHERE workspace_id = $1 AND brand_id = $2
          AND ($3::text IS NULL OR status = $3)
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Update draft-editable fields. Guard in SQL: published and archived items
/// never change through this path.
#[allow(clippy::too_many_arguments)]
pub async fn update_content_fields(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    content_id: Uuid,
    content_type: Option<&str>,
    caption: Option<&str>,
    tags: &[String],
    media: &[MediaRef],
    without_media: bool,
    media_lookup_id: Option<&str>,
) -> Result<Option<ContentItem>, sqlx::Error> {
    let content = sqlx::query_as::<_, ContentItem>(
        r#"
        UPDATE content_items
        SET content_type = $3, caption = $4, tags = $5, media = $6,
            without_media = $7, media_lookup_id = $8, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status IN ('draft', 'scheduled', 'failed')
        RETURNING id, workspace_id, brand_id, content_type, caption, tags, media,
                  without_media, media_lookup_id, status, scheduled_at, published_at,
                  created_at, updated_at
        "#,
    )
    .bind(content_id)
    .bind(workspace_id)
    .bind(content_type)
    .bind(caption)
    .bind(tags)
    .bind(Json(media))
    .bind(without_media)
    .bind(media_lookup_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(content)
}

/// Move an item to "scheduled" at the given time. Rescheduling clears any
/// previous claim so the publisher picks it up again.
pub async fn schedule_content(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    content_id: Uuid,
    scheduled_at: DateTime<Utc>,
) -> Result<Option<ContentItem>, sqlx::Error> {
    let content = sqlx::query_as::<_, ContentItem>(
        r#"
        UPDATE content_items
        SET status = 'scheduled', scheduled_at = $3, claimed_at = NULL, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status IN ('draft', 'scheduled', 'failed')
        RETURNING id, workspace_id, brand_id, content_type, caption, tags, media,
                  without_media, media_lookup_id, status, scheduled_at, published_at,
                  created_at, updated_at
        "#,
    )
    .bind(content_id)
    .bind(workspace_id)
    .bind(scheduled_at)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(content)
}

/// Unschedule back to draft
pub async fn unschedule_to_draft(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    content_id: Uuid,
) -> Result<Option<ContentItem>, sqlx::Error> {
    let content = sqlx::query_as::<_, ContentItem>(
        r#"
        UPDATE content_items
        SET status = 'draft', scheduled_at = NULL, claimed_at = NULL, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status = 'scheduled'
        RETURNING id, workspace_id, brand_id, content_type, caption, tags, media,
                  without_media, media_lookup_id, status, scheduled_at, published_at,
                  created_at, updated_at
        "#,
    )
    .bind(content_id)
    .bind(workspace_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(content)
}

/// Record the aggregate publish outcome. Published and partially published
/// items get a publish timestamp; failed ones do not.
pub async fn set_publish_outcome(
    pool: &PgPool,
    content_id: Uuid,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE content_items
        SET status = $2,
            published_at = CASE WHEN $2 IN ('published', 'partially_published') THEN NOW() ELSE published_at END,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(content_id)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(())
}

/// Archive a content item (terminal)
pub async fn archive_content(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    content_id: Uuid,
) -> Result<Option<ContentItem>, sqlx::Error> {
    let content = sqlx::query_as::<_, ContentItem>(
        r#"
        UPDATE content_items
        SET status = 'archived', updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status <> 'archived'
        RETURNING id, workspace_id, brand_id, content_type, caption, tags, media,
                  without_media, media_lookup_id, status, scheduled_at, published_at,
                  created_at, updated_at
        "#,
    )
    .bind(content_id)
    .bind(workspace_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(content)
}

/// Claim due scheduled items for dispatch. The claim marker keeps a second
/// replica (and a later poll) from re-dispatching the same item; SKIP LOCKED
/// lets concurrent pollers divide the batch instead of serializing on it.
pub async fn claim_due_scheduled(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ContentItem>, sqlx::Error> {
    let items = sqlx::query_as::<_, ContentItem>(
        r#"
        UPDATE content_items
        SET claimed_at = NOW(), updated_at = NOW()
        WHERE id IN (
            SELECT id FROM content_items
            WHERE status = 'scheduled' AND scheduled_at <= NOW() AND claimed_at IS NULL
            ORDER BY scheduled_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, workspace_id, brand_id, content_type, caption, tags, media,
                  without_media, media_lookup_id, status, scheduled_at, published_at,
                  created_at, updated_at
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

// ============================================
// ContentTarget Operations
// ============================================

/// Insert one pending target row per account
pub async fn insert_targets(
    tx: &mut Transaction<'_, Postgres>,
    content_id: Uuid,
    account_ids: &[Uuid],
) -> Result<Vec<ContentTarget>, sqlx::Error> {
    let targets = sqlx::query_as::<_, ContentTarget>(
        r#"
        INSERT INTO content_targets (content_id, social_account_id, status)
        SELECT $1, account_id, 'pending' FROM UNNEST($2::uuid[]) AS account_id
        RETURNING id, content_id, social_account_id, status, external_post_id, error,
                  published_at, created_at, updated_at
        "#,
    )
    .bind(content_id)
    .bind(account_ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(targets)
}

/// Drop existing target rows before a fresh publish attempt
pub async fn delete_targets(
    tx: &mut Transaction<'_, Postgres>,
    content_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM content_targets WHERE content_id = $1")
        .bind(content_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// List targets for a content item in insertion order
pub async fn list_targets(
    pool: &PgPool,
    content_id: Uuid,
) -> Result<Vec<ContentTarget>, sqlx::Error> {
    let targets = sqlx::query_as::<_, ContentTarget>(
        r#"
        SELECT id, content_id, social_account_id, status, external_post_id, error,
               published_at, created_at, updated_at
        FROM content_targets
        WHERE content_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(content_id)
    .fetch_all(pool)
    .await?;

    Ok(targets)
}

/// Record a per-target dispatch outcome
pub async fn update_target_outcome(
    pool: &PgPool,
    target_id: Uuid,
    status: &str,
    external_post_id: Option<&str>,
    error: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE content_targets
        SET status = $2, external_post_id = $3, error = $4,
            published_at = CASE WHEN $2 = 'published' THEN NOW() ELSE NULL END,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(target_id)
    .bind(status)
    .bind(external_post_id)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}
