pub mod analytics;
pub mod metrics;
pub mod trending;

pub use analytics::AnalyticsService;
pub use metrics::MetricsService;
pub use trending::TrendingService;
