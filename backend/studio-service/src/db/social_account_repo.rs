use crate::models::SocialAccount;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Insert a freshly connected account with status "active"
#[allow(clippy::too_many_arguments)]
pub async fn insert_account(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    brand_id: Uuid,
    platform: &str,
    external_id: &str,
    display_name: &str,
    avatar_url: Option<&str>,
    credentials: &[u8],
) -> Result<SocialAccount, sqlx::Error> {
    let account = sqlx::query_as::<_, SocialAccount>(
        r#"
        INSERT INTO social_accounts
            (workspace_id, brand_id, platform, external_id, display_name, avatar_url, credentials, status, connected_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', NOW())
        RETURNING id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
                  credentials, status, connected_at, disconnected_at, created_at, updated_at
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .bind(platform)
    .bind(external_id)
    .bind(display_name)
    .bind(avatar_url)
    .bind(credentials)
    .fetch_one(&mut **tx)
    .await?;

    Ok(account)
}

/// Find an account by ID within a workspace
pub async fn find_account_by_id(
    pool: &PgPool,
    workspace_id: Uuid,
    account_id: Uuid,
) -> Result<Option<SocialAccount>, sqlx::Error> {
    let account = sqlx::query_as::<_, SocialAccount>(
        r#"
        SELECT id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
               credentials, status, connected_at, disconnected_at, created_at, updated_at
        FROM social_accounts
        WHERE id = $1 AND workspace_id = $2
        "#,
    )
    .bind(account_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Find the non-removed row holding (platform, external_id) anywhere in the
/// workspace. This is the duplicate probe: the conflict applies regardless of
/// which brand the row is attached to.
pub async fn find_conflicting_account(
    pool: &PgPool,
    workspace_id: Uuid,
    platform: &str,
    external_id: &str,
) -> Result<Option<SocialAccount>, sqlx::Error> {
    let account = sqlx::query_as::<_, SocialAccount>(
        r#"
        SELECT id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
               credentials, status, connected_at, disconnected_at, created_at, updated_at
        FROM social_accounts
        WHERE workspace_id = $1 AND platform = $2 AND external_id = $3 AND status <> 'removed'
        "#,
    )
    .bind(workspace_id)
    .bind(platform)
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// List non-removed accounts for a workspace, optionally narrowed to a brand
pub async fn list_accounts(
    pool: &PgPool,
    workspace_id: Uuid,
    brand_id: Option<Uuid>,
) -> Result<Vec<SocialAccount>, sqlx::Error> {
    let accounts = sqlx::query_as::<_, SocialAccount>(
        r#"
        SELECT id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
               credentials, status, connected_at, disconnected_at, created_at, updated_at
        FROM social_accounts
        WHERE workspace_id = $1
          AND status <> 'removed'
          AND ($2::uuid IS NULL OR brand_id = $2)
        ORDER BY connected_at DESC
        "#,
    )
    .bind(workspace_id)
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}

/// Fetch several accounts by ID (publish target resolution)
pub async fn find_accounts_by_ids(
    pool: &PgPool,
    workspace_id: Uuid,
    account_ids: &[Uuid],
) -> Result<Vec<SocialAccount>, sqlx::Error> {
    let accounts = sqlx::query_as::<_, SocialAccount>(
        r#"
        SELECT id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
               credentials, status, connected_at, disconnected_at, created_at, updated_at
        FROM social_accounts
        WHERE workspace_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(workspace_id)
    .bind(account_ids)
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}

/// Count active accounts attached to a brand (readiness input)
pub async fn count_active_accounts(pool: &PgPool, brand_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM social_accounts WHERE brand_id = $1 AND status = 'active'",
    )
    .bind(brand_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Mark an active account disconnected. Guard in SQL: only 'active' rows
/// transition, so a raced second disconnect returns `None`.
pub async fn mark_disconnected(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    account_id: Uuid,
) -> Result<Option<SocialAccount>, sqlx::Error> {
    let account = sqlx::query_as::<_, SocialAccount>(
        r#"
        UPDATE social_accounts
        SET status = 'disconnected', disconnected_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status = 'active'
        RETURNING id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
                  credentials, status, connected_at, disconnected_at, created_at, updated_at
        "#,
    )
    .bind(account_id)
    .bind(workspace_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(account)
}

/// Mark an account removed (terminal). Active and disconnected rows qualify.
pub async fn mark_removed(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    account_id: Uuid,
) -> Result<Option<SocialAccount>, sqlx::Error> {
    let account = sqlx::query_as::<_, SocialAccount>(
        r#"
        UPDATE social_accounts
        SET status = 'removed', updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status IN ('active', 'disconnected')
        RETURNING id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
                  credentials, status, connected_at, disconnected_at, created_at, updated_at
        "#,
    )
    .bind(account_id)
    .bind(workspace_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(account)
}

/// Reactivate a disconnected row with fresh credentials and profile fields.
/// Returns `None` when the row is not currently disconnected.
pub async fn reactivate_account(
    tx: &mut Transaction<'_, Postgres>,
    workspace_id: Uuid,
    account_id: Uuid,
    display_name: &str,
    avatar_url: Option<&str>,
    credentials: &[u8],
) -> Result<Option<SocialAccount>, sqlx::Error> {
    let account = sqlx::query_as::<_, SocialAccount>(
        r#"
        UPDATE social_accounts
        SET status = 'active', display_name = $3, avatar_url = $4, credentials = $5,
            connected_at = NOW(), disconnected_at = NULL, updated_at = NOW()
        WHERE id = $1 AND workspace_id = $2 AND status = 'disconnected'
        RETURNING id, workspace_id, brand_id, platform, external_id, display_name, avatar_url,
                  credentials, status, connected_at, disconnected_at, created_at, updated_at
        "#,
    )
    .bind(account_id)
    .bind(workspace_id)
    .bind(display_name)
    .bind(avatar_url)
    .bind(credentials)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(account)
}
