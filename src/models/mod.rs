use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject role carried by session tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified analytics event kinds. The stored column is the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Pageview,
    Ping,
    View,
    Watch,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Pageview => "pageview",
            EventType::Ping => "ping",
            EventType::View => "view",
            EventType::Watch => "watch",
        }
    }

    pub fn parse(s: &str) -> Option<EventType> {
        match s {
            "pageview" => Some(EventType::Pageview),
            "ping" => Some(EventType::Ping),
            "view" => Some(EventType::View),
            "watch" => Some(EventType::Watch),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracked visitor session, keyed by the caller-chosen session id
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub user_agent: String,
    pub ip_hash: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Append-only analytics event row
#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub session_id: String,
    pub event_type: EventType,
    pub path: Option<String>,
    pub video_id: Option<Uuid>,
    pub watch_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/analytics/ping`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PingRequest {
    pub path: Option<String>,
    pub video_id: Option<Uuid>,
    pub event_type: Option<String>,
    pub watch_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub ok: bool,
    pub server_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewResponse {
    pub views: i64,
}

/// Video columns needed to issue a playback grant
#[derive(Debug, Clone)]
pub struct VideoPlayback {
    pub id: Uuid,
    pub title: String,
    pub duration_seconds: i64,
    pub views: i64,
    pub is_trending: bool,
}

/// Response of `GET /api/videos/{id}/play`: a tokenized stream URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackGrant {
    pub id: Uuid,
    pub title: String,
    pub duration_seconds: i64,
    pub views: i64,
    pub is_trending: bool,
    pub stream_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Singleton trending configuration row
#[derive(Debug, Clone)]
pub struct TrendingSettings {
    pub id: Uuid,
    pub min_views: i64,
    pub max_age_hours: i64,
    pub max_items: i64,
    pub auto_refresh: bool,
    pub pinned_video_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Wire form of the settings row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSettingsView {
    pub min_views: i64,
    pub max_age_hours: i64,
    pub max_items: i64,
    pub auto_refresh: bool,
    pub pinned_video_ids: Vec<Uuid>,
}

impl From<&TrendingSettings> for TrendingSettingsView {
    fn from(settings: &TrendingSettings) -> Self {
        Self {
            min_views: settings.min_views,
            max_age_hours: settings.max_age_hours,
            max_items: settings.max_items,
            auto_refresh: settings.auto_refresh,
            pinned_video_ids: settings.pinned_video_ids.clone(),
        }
    }
}

/// Partial update for `PATCH /api/admin/trending-settings`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrendingSettingsUpdate {
    pub min_views: Option<i64>,
    pub max_age_hours: Option<i64>,
    pub max_items: Option<i64>,
    pub auto_refresh: Option<bool>,
    pub pinned_video_ids: Option<Vec<Uuid>>,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy)]
pub struct TrendingRecomputeSummary {
    pub pinned: u64,
    pub selected: u64,
}

/// Curated trending category
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingCategory {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingCategoryCreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingCategoryAssignRequest {
    pub video_id: Uuid,
}

/// Engagement counters for one video, input to the insight scorer
#[derive(Debug, Clone)]
pub struct VideoEngagement {
    pub id: Uuid,
    pub title: String,
    pub views: i64,
    pub is_trending: bool,
    pub created_at: DateTime<Utc>,
    pub comments: i64,
    pub likes: i64,
    pub saves: i64,
}

/// Advisory scoring row returned by the insights endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInsight {
    pub id: Uuid,
    pub title: String,
    pub views: i64,
    pub is_trending: bool,
    pub age_hours: f64,
    pub comments: i64,
    pub likes: i64,
    pub saves: i64,
    pub trending_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsTotals {
    pub total_views: i64,
    pub active_now: i64,
    pub visitors_24h: i64,
    pub views_today: i64,
    pub watch_seconds_today: i64,
    pub videos: i64,
    pub comments: i64,
    pub trending: i64,
}

/// One frame of the live metrics feed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub server_time: DateTime<Utc>,
    pub totals: MetricsTotals,
}

/// Series granularity for the windowed analytics report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketInterval {
    Hour,
    Day,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub bucket: BucketInterval,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub total_views: i64,
    pub visitors: i64,
    pub active_now: i64,
    pub views_in_range: i64,
    pub watch_seconds_in_range: i64,
    pub today_views: i64,
    pub weekly_views: i64,
    pub monthly_views: i64,
    pub today_watch_seconds: i64,
    pub weekly_watch_seconds: i64,
    pub monthly_watch_seconds: i64,
}

/// One bucket of the report series; `bucket` is the UTC-truncated boundary
#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub bucket: String,
    pub views: i64,
    pub visitors: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: ReportRange,
    pub totals: ReportTotals,
    pub series: Vec<SeriesPoint>,
    pub server_time: DateTime<Utc>,
}
