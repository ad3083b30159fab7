//! budget_costing - Material Pricing and Budget Costing API
//!
//! Materials carry priced dimensions; budgets hold priced snapshots of them.
//! Dimension price changes and deletions propagate into every budget.

use std::net::SocketAddr;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use budget_costing::config::{ConfigError, LogFormat, StoreBackend};
use budget_costing::{api, db, Config, Stores};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "budget_costing=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Connect, verify the schema (applying it when tables are missing) and return the pool
async fn connect_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.store_timeout)
        .connect(database_url)
        .await?;

    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::warn!("Database schema is not complete, applying schema");
        db::apply_schema(&pool).await?;

        if !db::check_schema(&pool).await? {
            return Err(anyhow::anyhow!("Database schema incomplete"));
        }
    }

    tracing::info!("Database connected successfully");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        environment = %config.environment,
        backend = ?config.store_backend,
        "Starting budget_costing server"
    );

    let (stores, pool) = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = connect_database(&config).await?;
            (Stores::postgres(pool.clone(), config.store_timeout), Some(pool))
        }
        StoreBackend::Memory => {
            if config.is_production() {
                tracing::warn!("In-memory store selected in production; data is lost on restart");
            }
            (Stores::in_memory(), None)
        }
    };

    let app = api::build_app(stores);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
