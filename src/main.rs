use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vod_gateway::{
    auth::TokenService,
    config::Config,
    database::Database,
    services::{AnalyticsService, MetricsService, TrendingService},
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "vod-gateway")]
#[command(version = "0.1.0")]
#[command(about = "Token-gated video delivery gateway with analytics and trending")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("vod_gateway={},tower_http=trace", cli.log_level)
    } else {
        format!("vod_gateway={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VOD Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Using database: {}", config.database.url);

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let token_service = TokenService::new(&config.auth);
    info!(
        "Token service initialized (stream TTL {}m, session TTL {}d)",
        config.auth.stream_token_ttl_minutes, config.auth.session_token_ttl_days
    );

    let analytics = AnalyticsService::new(database.clone());
    let trending = TrendingService::new(database.clone());
    let metrics = MetricsService::new(database.clone());
    info!("Analytics, trending, and metrics services initialized");

    let web_server = WebServer::new(
        config,
        database,
        token_service,
        analytics,
        trending,
        metrics,
    )
    .await?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
