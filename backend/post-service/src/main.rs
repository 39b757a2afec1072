use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, HmacCsrfVerifier, JwtAuthenticator, Logging, MetricsMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use post_service::config::{Config, StoreBackend};
use post_service::db::{ContentStore, MemoryContentStore, PgContentStore};
use post_service::metrics;
use post_service::routes::{self, Gates};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,post_service=debug,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ContentStore>> {
    match config.store {
        StoreBackend::Postgres => {
            let db_config = DbPoolConfig::from_env("post-service").map_err(|e| anyhow!(e))?;
            db_config.log_config();

            let pool = create_pg_pool(db_config)
                .await
                .context("Failed to create database pool")?;
            let store = PgContentStore::new(pool);
            store
                .run_migrations()
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("PostgreSQL content store ready");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory content store; data is lost on restart");
            Ok(Arc::new(MemoryContentStore::new()))
        }
    }
}

/// Post Service
///
/// Posts, comments and likes over a JSON REST API.
///
/// # Routes
///
/// - `/api/v1/posts/*` - posts, nested comments, likes
/// - `/api/v1/health`, `/api/v1/health/live` - health probes
/// - `/metrics` - Prometheus metrics
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()
        .map_err(|e| anyhow!(e))
        .context("Failed to load configuration")?;
    tracing::info!(
        env = %config.app.env,
        store = ?config.store,
        "Starting post-service"
    );

    let store = build_store(&config).await?;
    let gates = Gates {
        authenticator: Arc::new(JwtAuthenticator::new(config.security.jwt_secret.as_bytes())),
        csrf: Arc::new(HmacCsrfVerifier::new(config.security.csrf_secret.clone())),
    };

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    let allowed_origins = config.cors.allowed_origins.clone();
    tracing::info!("Starting HTTP server at {}", bind_addr);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let store = store.clone();
        let gates = gates.clone();

        App::new()
            .wrap(MetricsMiddleware::new("post-service"))
            .wrap(Logging)
            .wrap(CorrelationIdMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(move |cfg| routes::configure(cfg, store, gates))
    })
    .workers(config.app.workers)
    .disable_signals()
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, draining connections");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("post-service stopped");
    Ok(())
}
