use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use chrono::Utc;
use credential_vault::CredentialVault;
use redis::aio::ConnectionManager;
use redis::RedisError;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use studio_service::cache::StudioCache;
use studio_service::handlers;
use studio_service::jobs::ScheduledPublisherJob;
use studio_service::middleware;
use studio_service::openapi::ApiDoc;
use studio_service::services::media::{build_s3_client, storage_health_check};
use studio_service::services::{ContentService, Dispatcher, HttpDispatcher};
use studio_service::{db, security};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

struct HealthState {
    db_pool: PgPool,
    redis_manager: Arc<Mutex<ConnectionManager>>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    fn new(db_pool: PgPool, redis_manager: Arc<Mutex<ConnectionManager>>) -> Self {
        Self {
            db_pool,
            redis_manager,
        }
    }

    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn check_redis(&self) -> Result<(), RedisError> {
        let mut conn = self.redis_manager.lock().await;
        let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING response",
            )))
        }
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "studio-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "studio-service"
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;

    let start = Instant::now();
    let pg_result = state.check_postgres().await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    let postgres_check = match pg_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms: pg_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms: pg_latency,
            }
        }
    };
    checks.insert("postgresql".to_string(), postgres_check);

    let start = Instant::now();
    let redis_result = state.check_redis().await;
    let redis_latency = Some(start.elapsed().as_millis() as u64);
    let redis_check = match redis_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Redis ping successful".to_string(),
            latency_ms: redis_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Redis ping failed: {}", e),
                latency_ms: redis_latency,
            }
        }
    };
    checks.insert("redis".to_string(), redis_check);

    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Support container healthchecks via CLI subcommand: `healthcheck-http` or legacy `healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" || cmd == "healthcheck-http" {
                let port = std::env::var("STUDIO_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(8084);
                let url = format!("http://127.0.0.1:{port}/v1/health");
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables from .env when present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match studio_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting studio-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    match std::env::var("JWT_PUBLIC_KEY_PEM") {
        Ok(public_key) => {
            if let Err(err) = security::initialize_validation(&public_key) {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize JWT validation: {err}"),
                ));
            }
        }
        Err(_) => {
            tracing::warn!(
                "JWT_PUBLIC_KEY_PEM not set; authentication middleware will fail requests"
            );
        }
    }

    // Credential vault: account tokens cannot be sealed or opened without it
    let vault = match CredentialVault::from_env() {
        Ok(vault) => Arc::new(vault),
        Err(e) => {
            tracing::error!("Credential vault initialization failed: {}", e);
            eprintln!("ERROR: CREDENTIAL_VAULT_KEY must hold a base64 32-byte key: {e}");
            std::process::exit(1);
        }
    };

    // Initialize database connection pool and run migrations
    let db_pool = match db::create_pool(&config.database.url, config.database.max_connections).await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!("Database migration failed: {}", e);
        eprintln!("ERROR: Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Connected to database, migrations applied");

    // Redis connection manager shared by the cache, OAuth state, and health checks
    let redis_client = redis::Client::open(config.cache.url.as_str())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Invalid REDIS_URL: {e}")))?;
    let redis_manager = ConnectionManager::new(redis_client).await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to connect to Redis: {e}"),
        )
    })?;
    let redis_manager = Arc::new(Mutex::new(redis_manager));
    let studio_cache = Arc::new(StudioCache::with_manager(redis_manager.clone(), None));

    // Object storage client; uploads fail per request on a dead bucket, so a
    // failed probe is fatal only in production
    let s3_client = build_s3_client(&config.storage).await;
    if let Err(e) = storage_health_check(&s3_client, &config.storage.bucket).await {
        if config.app.env.eq_ignore_ascii_case("production") {
            tracing::error!("Object storage health check failed: {}", e);
            eprintln!("ERROR: Object storage unavailable: {}", e);
            std::process::exit(1);
        }
        tracing::warn!(
            bucket = %config.storage.bucket,
            "Object storage health check failed; media uploads will error: {}", e
        );
    }

    // Publish dispatcher behind its trait so tests and the scheduler share
    // one seam
    let dispatcher: Arc<dyn Dispatcher> = match HttpDispatcher::new(
        vault.clone(),
        config.publisher.gateway_url.clone(),
        config.publisher.timeout_secs,
    ) {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(e) => {
            tracing::error!("Publish dispatcher initialization failed: {}", e);
            eprintln!("ERROR: Failed to build publish dispatcher: {}", e);
            std::process::exit(1);
        }
    };

    let content_service = Arc::new(ContentService::with_cache(
        db_pool.clone(),
        dispatcher.clone(),
        studio_cache.clone(),
    ));

    let publisher_job = ScheduledPublisherJob::new(
        db_pool.clone(),
        content_service,
        Duration::from_secs(config.scheduler.poll_interval_secs),
        config.scheduler.batch_size,
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let health_state = web::Data::new(HealthState::new(db_pool.clone(), redis_manager.clone()));
    let cache_data = web::Data::new(studio_cache.clone());
    let redis_data = web::Data::new(redis_manager.clone());
    let vault_data = web::Data::new(vault.clone());
    let s3_data = web::Data::new(s3_client.clone());
    let dispatcher_data = web::Data::new(dispatcher.clone());
    let server_config = config.clone();

    // Create HTTP server
    let server = HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in server_config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(openapi_doc.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/v1/openapi.json", openapi_doc.clone()),
            )
            .route("/v1/openapi.json", web::get().to(openapi_json))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .app_data(cache_data.clone())
            .app_data(redis_data.clone())
            .app_data(vault_data.clone())
            .app_data(s3_data.clone())
            .app_data(dispatcher_data.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(studio_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/v1/health", web::get().to(health_summary))
            .route("/v1/health/ready", web::get().to(readiness_summary))
            .route("/v1/health/live", web::get().to(liveness_check))
            // OAuth popup callback carries no bearer token; the one-time
            // state token is the credential, so it stays outside the auth
            // scope
            .route(
                "/v1/oauth/{platform}/callback",
                web::get().to(handlers::oauth_callback),
            )
            .service(
                web::scope("/v1")
                    .wrap(middleware::AuthMiddleware)
                    .wrap(middleware::MetricsMiddleware)
                    .service(
                        web::scope("/brands")
                            .service(
                                web::resource("")
                                    .route(web::post().to(handlers::create_brand))
                                    .route(web::get().to(handlers::list_brands)),
                            )
                            .service(
                                web::resource("/{brand_id}")
                                    .route(web::get().to(handlers::get_brand))
                                    .route(web::patch().to(handlers::update_brand)),
                            )
                            .route(
                                "/{brand_id}/archive",
                                web::post().to(handlers::archive_brand),
                            )
                            .route(
                                "/{brand_id}/activate",
                                web::post().to(handlers::activate_brand),
                            )
                            .route(
                                "/{brand_id}/publishing-defaults",
                                web::put().to(handlers::set_publishing_defaults),
                            )
                            .route(
                                "/{brand_id}/activity",
                                web::get().to(handlers::get_brand_activity),
                            )
                            .service(
                                web::resource("/{brand_id}/hashtag-presets")
                                    .route(web::get().to(handlers::list_presets))
                                    .route(web::post().to(handlers::create_preset)),
                            ),
                    )
                    .service(
                        web::scope("/hashtag-presets").service(
                            web::resource("/{preset_id}")
                                .route(web::put().to(handlers::update_preset))
                                .route(web::delete().to(handlers::delete_preset)),
                        ),
                    )
                    .service(
                        web::scope("/social-accounts")
                            .service(
                                web::resource("")
                                    .route(web::post().to(handlers::connect_account))
                                    .route(web::get().to(handlers::list_accounts)),
                            )
                            .route("/{account_id}", web::get().to(handlers::get_account))
                            .route(
                                "/{account_id}/disconnect",
                                web::post().to(handlers::disconnect_account),
                            )
                            .route(
                                "/{account_id}/remove",
                                web::post().to(handlers::remove_account),
                            ),
                    )
                    .route(
                        "/oauth/{platform}/authorize",
                        web::get().to(handlers::oauth_authorize),
                    )
                    .service(
                        web::scope("/media")
                            .route("/uploads", web::post().to(handlers::start_upload))
                            .route(
                                "/uploads/{asset_id}/finalize",
                                web::post().to(handlers::finalize_upload),
                            )
                            .route("/uploads/{asset_id}", web::get().to(handlers::get_asset)),
                    )
                    .service(
                        web::scope("/content")
                            .service(
                                web::resource("")
                                    .route(web::post().to(handlers::create_content))
                                    .route(web::get().to(handlers::list_content)),
                            )
                            .service(
                                web::resource("/{content_id}")
                                    .route(web::get().to(handlers::get_content))
                                    .route(web::patch().to(handlers::update_content)),
                            )
                            .route(
                                "/{content_id}/publish",
                                web::post().to(handlers::publish_content),
                            )
                            .route(
                                "/{content_id}/archive",
                                web::post().to(handlers::archive_content),
                            ),
                    ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run();

    let server_handle = server.handle();

    let (shutdown_tx, _) = broadcast::channel(1);
    let publisher_shutdown = shutdown_tx.subscribe();

    let mut tasks: JoinSet<io::Result<()>> = JoinSet::new();

    // HTTP server task
    tasks.spawn(async move {
        tracing::info!("HTTP server is running");
        server.await
    });

    // Scheduled publisher background job
    tasks.spawn(async move {
        publisher_job.run(publisher_shutdown).await;
        Ok(())
    });

    let mut first_error: Option<io::Error> = None;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = tasks.join_next() => {
                match result {
                    Some(Ok(Ok(_))) => {
                        tracing::info!("Background task completed");
                    }
                    Some(Ok(Err(e))) => {
                        tracing::error!("Task returned error: {}", e);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Task join error: {}", e);
                        if first_error.is_none() {
                            first_error = Some(io::Error::new(io::ErrorKind::Other, e.to_string()));
                        }
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(());
                server_handle.stop(true).await;
                tasks.shutdown().await;
                break;
            }
        }
    }

    tracing::info!("Studio-service shutting down");

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
