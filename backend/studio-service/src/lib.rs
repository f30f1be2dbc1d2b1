/// Studio Service Library
///
/// Backend for the Atelier content studio: multi-brand social publishing for
/// teams. A workspace owns brands; brands own connected social accounts,
/// hashtag presets, media, and content items that are composed, scheduled,
/// and published across platforms.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers for the `/v1` API
/// - `models`: Data structures for brands, accounts, content, media
/// - `services`: Business logic layer
/// - `db`: Database access layer and repositories
/// - `cache`: Entity caching and invalidation
/// - `jobs`: Background jobs (scheduled publisher)
/// - `middleware`: HTTP middleware for authentication and metrics
/// - `security`: JWT validation
/// - `validators`: Input shape validation (slugs, tags, timezones)
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod security;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
