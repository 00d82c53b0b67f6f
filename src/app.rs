//! Application bootstrap and lifecycle
//!
//! Owns every process-wide resource and the order they come up and down in:
//! config, telemetry, database pool, cache on the way up; serve loop, pool,
//! tracer on the way down.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::api::{self, AppState};
use crate::cache::Cache;
use crate::config::Config;
use crate::db;
use crate::telemetry::{self, Telemetry};

/// Process-wide application object.
pub struct App {
    pub config: Config,
    pub pool: PgPool,
    pub cache: Cache,
    telemetry: Telemetry,
}

impl App {
    /// Construct resources in dependency order: config, telemetry, database,
    /// cache. Any failure here is fatal.
    pub async fn new() -> anyhow::Result<Self> {
        // Telemetry is not yet up; config errors go to stderr.
        let config = Config::from_env().map_err(|e| {
            eprintln!("ERROR: configuration invalid: {e}");
            e
        })?;

        let telemetry = telemetry::init(&config)?;
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            port = config.port,
            "magazin-pos starting"
        );

        tracing::info!("Connecting to database...");
        let pool = db::create_pool(&config)
            .await
            .context("database connection failed")?;

        if !db::check_schema(&pool).await? {
            anyhow::bail!("database schema incomplete, run migrations first");
        }
        tracing::info!("Database connected successfully");

        let cache = match &config.redis_url {
            Some(url) => Cache::connect(url)
                .await
                .context("redis connection failed")?,
            None => {
                tracing::warn!("REDIS_URL unset, cache disabled");
                Cache::disabled()
            }
        };

        Ok(Self {
            config,
            pool,
            cache,
            telemetry,
        })
    }

    /// Bind controllers to routes and serve until a shutdown signal arrives,
    /// then tear down in reverse order.
    ///
    /// Tracer shutdown runs after the serve loop exits, so spans opened by
    /// in-flight requests are flushed, not dropped.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        let state = AppState {
            pool: self.pool.clone(),
            cache: self.cache.clone(),
            config: Arc::new(self.config.clone()),
        };
        let router = api::create_router(state);

        tracing::info!("Listening on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutting down...");
        self.pool.close().await;
        tracing::info!("Database connections closed");
        self.telemetry.shutdown();

        Ok(())
    }
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
