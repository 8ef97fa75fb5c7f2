//! Web layer module
//!
//! HTTP interface for the VOD gateway. Thin handlers delegate to the
//! service layer; the transport-heavy pieces (the byte relay and the SSE
//! channel) live in their handlers.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers organized by domain
//! - **Responses**: the shared error envelope and status mapping
//! - **Extractors**: admin bearer auth and identity-hint header helpers
//!
//! Public routes sit under `/api`; admin routes under `/api/admin` require
//! a Bearer session token with the admin role, except `/api/admin/live`
//! which authorizes via `?token=` for EventSource clients.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::TokenService,
    config::Config,
    database::Database,
    services::{AnalyticsService, MetricsService, TrendingService},
};

pub mod extractors;
pub mod handlers;
pub mod responses;

// Re-export commonly used types
pub use extractors::AdminClaims;
pub use responses::ErrorResponse;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    /// Create a new web server over the shared state
    pub async fn new(
        config: Config,
        database: Database,
        token_service: TokenService,
        analytics: AnalyticsService,
        trending: TrendingService,
        metrics: MetricsService,
    ) -> Result<Self> {
        // Connect timeout only: a relayed video body may legitimately
        // outlive any total request timeout.
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(
                config.proxy.upstream_timeout_seconds,
            ))
            .build()?;

        let app = Self::create_router(AppState {
            database,
            config: config.clone(),
            token_service,
            analytics,
            trending,
            metrics,
            http_client,
        });

        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            // Health check endpoint (no auth required)
            .route("/health", get(handlers::health::health_check))
            // API routes
            .nest("/api", Self::api_routes())
            // Middleware (applied in reverse order)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            // Shared state
            .with_state(state)
    }

    /// Public and admin API routes
    fn api_routes() -> Router<AppState> {
        Router::new()
            // Analytics ingestion
            .route("/analytics/ping", post(handlers::analytics::ping))
            // Video surface
            .route("/videos/:id/view", post(handlers::analytics::record_view))
            .route("/videos/:id/play", get(handlers::videos::playback_grant))
            .route("/videos/:id/stream", get(handlers::stream::stream_video))
            // Admin surface
            .nest("/admin", Self::admin_routes())
    }

    /// Admin routes; all except `/live` authenticate via [`AdminClaims`]
    fn admin_routes() -> Router<AppState> {
        Router::new()
            .route("/live", get(handlers::live::live_metrics))
            .route("/analytics", get(handlers::live::analytics_report))
            .route(
                "/trending-settings",
                get(handlers::trending::get_settings).patch(handlers::trending::update_settings),
            )
            .route(
                "/trending-settings/recompute",
                post(handlers::trending::recompute),
            )
            .route("/trending-insights", get(handlers::trending::insights))
            .route(
                "/trending-categories",
                get(handlers::trending::list_categories).post(handlers::trending::create_category),
            )
            .route(
                "/trending-categories/:id",
                axum::routing::delete(handlers::trending::delete_category),
            )
            .route(
                "/trending-categories/:id/videos",
                get(handlers::trending::list_category_videos)
                    .post(handlers::trending::assign_category_video),
            )
            .route(
                "/trending-categories/:id/videos/:video_id",
                axum::routing::delete(handlers::trending::unassign_category_video),
            )
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
    pub token_service: TokenService,
    pub analytics: AnalyticsService,
    pub trending: TrendingService,
    pub metrics: MetricsService,
    pub http_client: reqwest::Client,
}
