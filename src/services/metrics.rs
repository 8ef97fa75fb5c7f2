//! Live metrics snapshots and windowed analytics reports

use chrono::{DateTime, Duration, Utc};

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{
    AnalyticsReport, BucketInterval, MetricsSnapshot, MetricsTotals, ReportRange, ReportTotals,
};

/// Sessions touched inside this window count as active
pub const ACTIVE_WINDOW_MINUTES: i64 = 5;
pub const DEFAULT_REPORT_WINDOW_DAYS: i64 = 7;

#[derive(Clone)]
pub struct MetricsService {
    database: Database,
}

impl MetricsService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// One frame of the live feed: catalog totals plus rolling activity
    pub async fn snapshot(&self, now: DateTime<Utc>) -> AppResult<MetricsSnapshot> {
        let active_cutoff = now - Duration::minutes(ACTIVE_WINDOW_MINUTES);
        let day_cutoff = now - Duration::hours(24);

        let totals = MetricsTotals {
            total_views: self.database.total_video_views().await?,
            active_now: self.database.count_active_sessions(active_cutoff).await?,
            visitors_24h: self
                .database
                .count_distinct_visitors_since(day_cutoff)
                .await?,
            views_today: self
                .database
                .count_view_events_between(day_cutoff, now)
                .await?,
            watch_seconds_today: self
                .database
                .sum_watch_seconds_between(day_cutoff, now)
                .await?,
            videos: self.database.count_videos().await?,
            comments: self.database.count_comments().await?,
            trending: self.database.count_trending_videos().await?,
        };

        Ok(MetricsSnapshot {
            server_time: now,
            totals,
        })
    }

    /// Windowed report. Defaults: `to` is now, `from` is a week earlier.
    /// An inverted window simply yields empty range counts.
    pub async fn report(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        bucket: BucketInterval,
        now: DateTime<Utc>,
    ) -> AppResult<AnalyticsReport> {
        let to = to.unwrap_or(now);
        let from = from.unwrap_or(to - Duration::days(DEFAULT_REPORT_WINDOW_DAYS));

        let active_cutoff = now - Duration::minutes(ACTIVE_WINDOW_MINUTES);
        let day_cutoff = now - Duration::hours(24);
        let week_cutoff = now - Duration::days(7);
        let month_cutoff = now - Duration::days(30);

        let totals = ReportTotals {
            total_views: self.database.total_video_views().await?,
            visitors: self.database.count_distinct_visitors_between(from, to).await?,
            active_now: self.database.count_active_sessions(active_cutoff).await?,
            views_in_range: self.database.count_view_events_between(from, to).await?,
            watch_seconds_in_range: self.database.sum_watch_seconds_between(from, to).await?,
            today_views: self
                .database
                .count_view_events_between(day_cutoff, now)
                .await?,
            weekly_views: self
                .database
                .count_view_events_between(week_cutoff, now)
                .await?,
            monthly_views: self
                .database
                .count_view_events_between(month_cutoff, now)
                .await?,
            today_watch_seconds: self
                .database
                .sum_watch_seconds_between(day_cutoff, now)
                .await?,
            weekly_watch_seconds: self
                .database
                .sum_watch_seconds_between(week_cutoff, now)
                .await?,
            monthly_watch_seconds: self
                .database
                .sum_watch_seconds_between(month_cutoff, now)
                .await?,
        };

        let series = self.database.event_series(from, to, bucket).await?;

        Ok(AnalyticsReport {
            range: ReportRange { from, to, bucket },
            totals,
            series,
            server_time: now,
        })
    }
}
