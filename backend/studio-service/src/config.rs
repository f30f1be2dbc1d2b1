/// Configuration management for Studio Service
///
/// This module handles loading and managing configuration from environment
/// variables. Secrets (vault key, OAuth client secrets) are read where they
/// are used and never stored in the serialized config.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache (Redis) configuration
    pub cache: CacheConfig,
    /// Object storage (S3) configuration
    pub storage: StorageConfig,
    /// OAuth connect flow configuration
    pub oauth: OAuthConfig,
    /// Publish gateway configuration
    pub publisher: PublisherConfig,
    /// Scheduled publisher configuration
    pub scheduler: SchedulerConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL
    pub url: String,
}

/// Object storage (S3) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding uploaded media assets
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible storage (MinIO in development)
    pub endpoint: Option<String>,
    /// Presigned upload URL lifetime in seconds
    pub upload_expiry_secs: u64,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: i64,
}

/// OAuth connect flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Public base URL the provider redirects back to,
    /// e.g. `https://api.atelier.dev`
    pub redirect_base_url: String,
}

/// Publish gateway configuration.
///
/// Dispatch goes through a single internal gateway that owns the
/// platform-specific API calls; this service only renders the generic
/// payload and records the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Base URL of the publish gateway, e.g. `http://publish-gateway:9300`
    pub gateway_url: String,
    /// Per-dispatch request timeout in seconds
    pub timeout_secs: u64,
}

/// Scheduled publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between polls for due scheduled content
    pub poll_interval_secs: u64,
    /// Max content items claimed per poll
    pub batch_size: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("STUDIO_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("STUDIO_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8084),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/atelier".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            storage: StorageConfig {
                bucket: std::env::var("MEDIA_BUCKET")
                    .unwrap_or_else(|_| "atelier-media".to_string()),
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: std::env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
                upload_expiry_secs: std::env::var("MEDIA_UPLOAD_EXPIRY_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(900),
                // 512 MiB default, large enough for vertical video
                max_upload_bytes: std::env::var("MEDIA_MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(512 * 1024 * 1024),
            },
            oauth: {
                let redirect_base_url = match std::env::var("OAUTH_REDIRECT_BASE_URL") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err(
                            "OAUTH_REDIRECT_BASE_URL must be set in production".to_string()
                        )
                    }
                    Err(_) => "http://localhost:8084".to_string(),
                };

                OAuthConfig {
                    redirect_base_url: redirect_base_url.trim_end_matches('/').to_string(),
                }
            },
            publisher: PublisherConfig {
                gateway_url: std::env::var("PUBLISH_GATEWAY_URL")
                    .unwrap_or_else(|_| "http://localhost:9300".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout_secs: std::env::var("PUBLISH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            scheduler: SchedulerConfig {
                poll_interval_secs: std::env::var("SCHEDULER_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                batch_size: std::env::var("SCHEDULER_BATCH_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(25),
            },
        })
    }
}
