use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{VideoEngagement, VideoPlayback};

impl Database {
    /// Upstream source URL for the relay, when the video exists
    pub async fn video_source_url(&self, video_id: Uuid) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT source_url FROM videos WHERE id = ?")
            .bind(video_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("source_url")))
    }

    pub async fn video_playback(&self, video_id: Uuid) -> AppResult<Option<VideoPlayback>> {
        let row = sqlx::query(
            "SELECT id, title, duration_seconds, views, is_trending FROM videos WHERE id = ?",
        )
        .bind(video_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id_str: String = row.get("id");
        Ok(Some(VideoPlayback {
            id: parse_uuid(&id_str)?,
            title: row.get("title"),
            duration_seconds: row.get("duration_seconds"),
            views: row.get("views"),
            is_trending: row.get("is_trending"),
        }))
    }

    pub async fn video_exists(&self, video_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE id = ?")
            .bind(video_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Post-increment view counter; `None` when the video does not exist
    pub async fn increment_video_views(
        &self,
        video_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<i64>> {
        let row = sqlx::query(
            "UPDATE videos SET views = views + 1, updated_at = ? WHERE id = ? RETURNING views",
        )
        .bind(now.to_rfc3339())
        .bind(video_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("views")))
    }

    /// Engagement counters for videos created at or after `cutoff`
    pub async fn videos_engagement_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<VideoEngagement>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id, v.title, v.views, v.is_trending, v.created_at,
                   (SELECT COUNT(*) FROM comments c WHERE c.video_id = v.id) AS comments,
                   (SELECT COUNT(*) FROM video_likes l WHERE l.video_id = v.id) AS likes,
                   (SELECT COUNT(*) FROM video_saves s WHERE s.video_id = v.id) AS saves
            FROM videos v
            WHERE v.created_at >= ?
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        let mut videos = Vec::with_capacity(rows.len());
        for row in rows {
            let id_str: String = row.get("id");
            let created_at: String = row.get("created_at");
            videos.push(VideoEngagement {
                id: parse_uuid(&id_str)?,
                title: row.get("title"),
                views: row.get("views"),
                is_trending: row.get("is_trending"),
                created_at: parse_datetime(&created_at)?,
                comments: row.get("comments"),
                likes: row.get("likes"),
                saves: row.get("saves"),
            });
        }
        Ok(videos)
    }

    pub async fn count_videos(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn total_video_views(&self) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(views), 0) FROM videos")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn count_trending_videos(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE is_trending = TRUE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn count_comments(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Ids currently flagged trending, most viewed first
    pub async fn list_trending_video_ids(&self) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT id FROM videos WHERE is_trending = TRUE ORDER BY views DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id_str: String = row.get("id");
            ids.push(parse_uuid(&id_str)?);
        }
        Ok(ids)
    }
}
