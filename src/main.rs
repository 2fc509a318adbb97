//! fitbook server entry point.
//!
//! Starts the Axum HTTP server backed by PostgreSQL.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fitbook::api;
use fitbook::app_state::AppState;
use fitbook::auth::TokenService;
use fitbook::config::ServerConfig;
use fitbook::persistence::PostgresStore;
use fitbook::service::{AdmissionService, MembershipService, RetryPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config =
        ServerConfig::from_env().map_err(|e| anyhow::anyhow!("loading configuration: {e}"))?;
    tracing::info!(addr = %config.listen_addr, "starting fitbook");

    // Connect to PostgreSQL and run migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connecting to PostgreSQL")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    // Build persistence and service layers
    let store = Arc::new(PostgresStore::new(pool, config.booking_lock_timeout_ms));
    let admission = Arc::new(AdmissionService::new(
        Arc::clone(&store) as Arc<dyn fitbook::persistence::MembershipLedger>,
        Arc::clone(&store) as Arc<dyn fitbook::persistence::BookingLedger>,
        RetryPolicy {
            max_retries: config.booking_max_retries,
            backoff: Duration::from_millis(config.booking_retry_backoff_ms),
        },
    ));
    let memberships = Arc::new(MembershipService::new(
        Arc::clone(&store) as Arc<dyn fitbook::persistence::MembershipLedger>,
        Arc::clone(&store) as Arc<dyn fitbook::persistence::PackageCatalog>,
    ));
    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        chrono::Duration::hours(config.jwt_ttl_hours),
    ));

    // Build application state
    let app_state = AppState {
        admission,
        memberships,
        store,
        tokens,
    };

    // Build router
    let app = api::build_router();

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", <api::ApiDoc as utoipa::OpenApi>::openapi()),
    );

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("binding listen address")?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
