//! Activity log. Every brand, account, and content mutation records an entry;
//! mutations write theirs inside the same transaction as the entity change.

use crate::db::activity_repo;
use crate::error::Result;
use crate::models::ActivityEntry;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// A log entry about to be recorded.
#[derive(Debug)]
pub struct NewActivity<'a> {
    pub workspace_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub action: &'a str,
    pub subject_type: &'a str,
    pub subject_id: Uuid,
    pub detail: Value,
}

pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an entry inside an open transaction.
    pub async fn record_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        entry: NewActivity<'_>,
    ) -> Result<ActivityEntry> {
        let recorded = activity_repo::insert_entry(
            tx,
            entry.workspace_id,
            entry.brand_id,
            entry.actor_id,
            entry.action,
            entry.subject_type,
            entry.subject_id,
            &entry.detail,
        )
        .await?;

        Ok(recorded)
    }

    /// Record an entry outside any transaction (background jobs).
    pub async fn record(&self, entry: NewActivity<'_>) -> Result<ActivityEntry> {
        let recorded = activity_repo::insert_entry_pool(
            &self.pool,
            entry.workspace_id,
            entry.brand_id,
            entry.actor_id,
            entry.action,
            entry.subject_type,
            entry.subject_id,
            &entry.detail,
        )
        .await?;

        Ok(recorded)
    }

    pub async fn list_for_workspace(
        &self,
        workspace_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityEntry>> {
        let entries = activity_repo::list_by_workspace(&self.pool, workspace_id, limit, offset).await?;
        Ok(entries)
    }

    pub async fn list_for_brand(
        &self,
        workspace_id: Uuid,
        brand_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityEntry>> {
        let entries =
            activity_repo::list_by_brand(&self.pool, workspace_id, brand_id, limit, offset).await?;
        Ok(entries)
    }
}
