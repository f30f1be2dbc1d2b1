use crate::models::ActivityEntry;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Append an activity entry inside the transaction that performs the change,
/// so the entry exists exactly when the change does.
#[allow(clippy::too_many_arguments)]
pub async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Option<Uuid>,
    actor_id: Uuid,
    action: &str,
    subject_type: &str,
    subject_id: Uuid,
    detail: &Value,
) -> Result<ActivityEntry, sqlx::Error> {
    let entry = sqlx::query_as::<_, ActivityEntry>(
        r#"
        INSERT INTO activity_entries
            (workspace_id, brand_id, actor_id, action, subject_type, subject_id, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, workspace_id, brand_id, actor_id, action, subject_type,
                  subject_id, detail, created_at
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(actor_id)
    .bind(action)
    .bind(subject_type)
    .bind(subject_id)
    .bind(detail)
    .fetch_one(&mut **tx)
    .await?;

    Ok(entry)
}

/// Append an activity entry outside any transaction. Used by the scheduled
/// publisher, which has no user-initiated transaction to join.
#[allow(clippy::too_many_arguments)]
pub async fn insert_entry_pool(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Option<Uuid>,
    actor_id: Uuid,
    action: &str,
    subject_type: &str,
    subject_id: Uuid,
    detail: &Value,
) -> Result<ActivityEntry, sqlx::Error> {
    let entry = sqlx::query_as::<_, ActivityEntry>(
        r#"
        INSERT INTO activity_entries
            (workspace_id, brand_id, actor_id, action, subject_type, subject_id, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, workspace_id, brand_id, actor_id, action, subject_type,
                  subject_id, detail, created_at
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(actor_id)
    .bind(action)
    .bind(subject_type)
    .bind(subject_id)
    .bind(detail)
    .fetch_one(pool)
    .await?;

    Ok(entry)
}

/// List workspace activity, newest first
pub async fn list_by_workspace(
    pool: &PgPool,
    workspace_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT id, workspace_id, brand_id, actor_id, action, subject_type,
               subject_id, detail, created_at
        FROM activity_entries
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

    Ok(entries)
}

/// List activity scoped to one brand, newest first
pub async fn list_by_brand(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT id, workspace_id, brand_id, actor_id, action, subject_type,
               subject_id, detail, created_at
        FROM activity_entries
        WHERE workspace_id = $1 AND brand_id = $2
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
