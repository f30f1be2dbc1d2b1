//! Database access layer for studio-service
//!
//! Repositories are free functions over `&PgPool` (or a transaction where a
//! write must land together with its activity-log entry). All queries are
//! workspace-scoped: the workspace id is a mandatory predicate, never an
//! afterthought.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod activity_repo;
pub mod brand_repo;
pub mod content_repo;
pub mod hashtag_repo;
pub mod media_repo;
pub mod social_account_repo;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
