// ABOUTME: Collector server bootstrap
// ABOUTME: Tracing setup, database connection, router assembly with CORS and request tracing

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use collector_api::{create_app, DbState};
use collector_runs::{HttpWorkflowWebhook, WorkflowWebhook};

pub mod config;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError};

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,collector=debug"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build the full application: API routes plus CORS and request tracing
pub fn build_app(state: DbState, config: &Config) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("CORS_ORIGIN is not a valid header value")?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    Ok(create_app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    ))
}

/// Connect, migrate, and serve until the process is stopped
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let pool = collector_storage::connect(&config.database)
        .await
        .context("Failed to open database")?;

    let webhook: Option<Arc<dyn WorkflowWebhook>> = match &config.webhook {
        Some(webhook_config) => {
            info!(url = %webhook_config.url, "Workflow webhook configured");
            Some(Arc::new(HttpWorkflowWebhook::new(webhook_config.clone())?))
        }
        None => None,
    };

    let app = build_app(DbState::new(pool, webhook), &config)?;

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Apply pending migrations and exit
pub async fn run_migrations(config: &Config) -> anyhow::Result<()> {
    // connect() migrates on open
    let pool = collector_storage::connect(&config.database)
        .await
        .context("Failed to migrate database")?;
    pool.close().await;

    info!("Database is up to date");
    Ok(())
}
