//! Trending reconciliation and advisory scoring

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    TrendingRecomputeSummary, TrendingSettings, TrendingSettingsUpdate, VideoEngagement,
    VideoInsight,
};

pub const MAX_AGE_HOURS_CEILING: i64 = 8760;
pub const MAX_ITEMS_CEILING: i64 = 200;
pub const INSIGHT_WINDOW_DAYS: i64 = 7;
pub const INSIGHT_LIMIT: usize = 50;

#[derive(Clone)]
pub struct TrendingService {
    database: Database,
}

impl TrendingService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub async fn settings(&self) -> AppResult<TrendingSettings> {
        self.database
            .get_or_create_trending_settings(Utc::now())
            .await
    }

    /// Merge a partial update, persist it, and recompute when the merged
    /// auto refresh flag is on
    pub async fn update_settings(
        &self,
        update: TrendingSettingsUpdate,
    ) -> AppResult<TrendingSettings> {
        validate_update(&update)?;
        let now = Utc::now();
        let mut settings = self.database.get_or_create_trending_settings(now).await?;
        apply_update(&mut settings, update);
        settings.updated_at = now;
        self.database.save_trending_settings(&settings).await?;

        if settings.auto_refresh {
            let summary = self.database.recompute_trending(&settings, now).await?;
            info!(
                "Trending recomputed after settings change: {} pinned, {} selected",
                summary.pinned, summary.selected
            );
        }
        Ok(settings)
    }

    pub async fn recompute(&self) -> AppResult<TrendingRecomputeSummary> {
        let now = Utc::now();
        let settings = self.database.get_or_create_trending_settings(now).await?;
        let summary = self.database.recompute_trending(&settings, now).await?;
        info!(
            "Trending recomputed: {} pinned, {} selected",
            summary.pinned, summary.selected
        );
        Ok(summary)
    }

    /// Advisory scores over the recent window, best first. Never touches
    /// the trending flags.
    pub async fn insights(&self) -> AppResult<Vec<VideoInsight>> {
        let now = Utc::now();
        let cutoff = now - Duration::days(INSIGHT_WINDOW_DAYS);
        let videos = self.database.videos_engagement_since(cutoff).await?;

        let mut insights: Vec<VideoInsight> = videos
            .iter()
            .map(|video| score_video(video, now))
            .collect();
        insights.sort_by(|a, b| {
            b.trending_score
                .partial_cmp(&a.trending_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        insights.truncate(INSIGHT_LIMIT);
        Ok(insights)
    }
}

fn validate_update(update: &TrendingSettingsUpdate) -> AppResult<()> {
    if let Some(min_views) = update.min_views {
        if min_views < 0 {
            return Err(AppError::invalid_input(
                "invalid_settings",
                "minViews must be non-negative",
            ));
        }
    }
    if let Some(hours) = update.max_age_hours {
        if !(1..=MAX_AGE_HOURS_CEILING).contains(&hours) {
            return Err(AppError::invalid_input(
                "invalid_settings",
                "maxAgeHours out of range",
            ));
        }
    }
    if let Some(items) = update.max_items {
        if !(1..=MAX_ITEMS_CEILING).contains(&items) {
            return Err(AppError::invalid_input(
                "invalid_settings",
                "maxItems out of range",
            ));
        }
    }
    Ok(())
}

fn apply_update(settings: &mut TrendingSettings, update: TrendingSettingsUpdate) {
    if let Some(min_views) = update.min_views {
        settings.min_views = min_views;
    }
    if let Some(max_age_hours) = update.max_age_hours {
        settings.max_age_hours = max_age_hours;
    }
    if let Some(max_items) = update.max_items {
        settings.max_items = max_items;
    }
    if let Some(auto_refresh) = update.auto_refresh {
        settings.auto_refresh = auto_refresh;
    }
    if let Some(pins) = update.pinned_video_ids {
        settings.pinned_video_ids = dedup_pins(pins);
    }
}

/// Order-preserving de-duplication of pinned ids
pub fn dedup_pins(pins: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    pins.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Advisory score blending popularity, freshness, engagement rate, and
/// view velocity. Engagement caps at 20, velocity at 10.
pub fn trending_score(views: i64, age_hours: f64, comments: i64, likes: i64, saves: i64) -> f64 {
    let views_f = views as f64;
    let popularity = 0.4 * (views_f + 1.0).ln();
    let freshness = 0.3 * 30.0 * (-age_hours / 24.0).exp();
    let engagement_rate = 100.0 * (3 * comments + 2 * likes + 2 * saves) as f64 / views_f.max(1.0);
    let engagement = 0.2 * engagement_rate.min(20.0);
    let velocity = 0.1 * (views_f / age_hours.max(0.1) / 10.0).min(10.0);
    popularity + freshness + engagement + velocity
}

fn score_video(video: &VideoEngagement, now: DateTime<Utc>) -> VideoInsight {
    let age_hours = ((now - video.created_at).num_seconds() as f64 / 3600.0).max(0.0);
    let score = trending_score(
        video.views,
        age_hours,
        video.comments,
        video.likes,
        video.saves,
    );
    VideoInsight {
        id: video.id,
        title: video.title.clone(),
        views: video.views,
        is_trending: video.is_trending,
        age_hours: round_to(age_hours, 10.0),
        comments: video.comments,
        likes: video.likes,
        saves: video.saves,
        trending_score: round_to(score, 100.0),
    }
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}
