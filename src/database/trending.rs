use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{TrendingCategory, TrendingRecomputeSummary, TrendingSettings};

const DEFAULT_MIN_VIEWS: i64 = 1000;
const DEFAULT_MAX_AGE_HOURS: i64 = 72;
const DEFAULT_MAX_ITEMS: i64 = 20;

impl Database {
    /// The singleton settings row, created with defaults on first access
    pub async fn get_or_create_trending_settings(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<TrendingSettings> {
        let row = sqlx::query(
            "SELECT id, min_views, max_age_hours, max_items, auto_refresh, pinned_video_ids, updated_at
             FROM trending_settings ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let id_str: String = row.get("id");
            let pinned_json: String = row.get("pinned_video_ids");
            let updated_at: String = row.get("updated_at");
            let pinned_video_ids: Vec<Uuid> = serde_json::from_str(&pinned_json)
                .map_err(|e| AppError::internal(format!("corrupt pinned_video_ids: {e}")))?;
            return Ok(TrendingSettings {
                id: parse_uuid(&id_str)?,
                min_views: row.get("min_views"),
                max_age_hours: row.get("max_age_hours"),
                max_items: row.get("max_items"),
                auto_refresh: row.get("auto_refresh"),
                pinned_video_ids,
                updated_at: parse_datetime(&updated_at)?,
            });
        }

        let settings = TrendingSettings {
            id: Uuid::new_v4(),
            min_views: DEFAULT_MIN_VIEWS,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
            max_items: DEFAULT_MAX_ITEMS,
            auto_refresh: true,
            pinned_video_ids: Vec::new(),
            updated_at: now,
        };
        self.save_trending_settings(&settings).await?;
        Ok(settings)
    }

    pub async fn save_trending_settings(&self, settings: &TrendingSettings) -> AppResult<()> {
        let pinned_json = serde_json::to_string(&settings.pinned_video_ids)
            .map_err(|e| AppError::internal(format!("serialize pinned_video_ids: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO trending_settings (id, min_views, max_age_hours, max_items, auto_refresh, pinned_video_ids, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                min_views = excluded.min_views,
                max_age_hours = excluded.max_age_hours,
                max_items = excluded.max_items,
                auto_refresh = excluded.auto_refresh,
                pinned_video_ids = excluded.pinned_video_ids,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(settings.id.to_string())
        .bind(settings.min_views)
        .bind(settings.max_age_hours)
        .bind(settings.max_items)
        .bind(settings.auto_refresh)
        .bind(pinned_json)
        .bind(settings.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clear, repin, repopulate in one transaction. Pins win unconditionally;
    /// organic slots exclude pinned ids. Readers never observe the cleared
    /// intermediate state.
    pub async fn recompute_trending(
        &self,
        settings: &TrendingSettings,
        now: DateTime<Utc>,
    ) -> AppResult<TrendingRecomputeSummary> {
        let _guard = self.acquire_trending_lock().await;
        let cutoff = now - Duration::hours(settings.max_age_hours);
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE videos SET is_trending = FALSE")
            .execute(&mut *tx)
            .await?;

        let mut pinned: u64 = 0;
        for video_id in &settings.pinned_video_ids {
            let result = sqlx::query("UPDATE videos SET is_trending = TRUE WHERE id = ?")
                .bind(video_id.to_string())
                .execute(&mut *tx)
                .await?;
            // unknown pinned ids affect no rows and are simply skipped
            pinned += result.rows_affected();
        }

        let mut candidate_sql =
            String::from("SELECT id FROM videos WHERE views >= ? AND created_at >= ?");
        if !settings.pinned_video_ids.is_empty() {
            let placeholders = vec!["?"; settings.pinned_video_ids.len()].join(", ");
            candidate_sql.push_str(&format!(" AND id NOT IN ({placeholders})"));
        }
        candidate_sql.push_str(" ORDER BY views DESC, created_at DESC LIMIT ?");

        let mut candidates = sqlx::query(&candidate_sql)
            .bind(settings.min_views)
            .bind(cutoff.to_rfc3339());
        for video_id in &settings.pinned_video_ids {
            candidates = candidates.bind(video_id.to_string());
        }
        let rows = candidates
            .bind(settings.max_items)
            .fetch_all(&mut *tx)
            .await?;

        let mut selected: u64 = 0;
        for row in rows {
            let id: String = row.get("id");
            let result = sqlx::query("UPDATE videos SET is_trending = TRUE WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            selected += result.rows_affected();
        }

        tx.commit().await?;
        Ok(TrendingRecomputeSummary { pinned, selected })
    }

    pub async fn list_trending_categories(&self) -> AppResult<Vec<TrendingCategory>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at FROM trending_categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in rows {
            let id_str: String = row.get("id");
            let created_at: String = row.get("created_at");
            categories.push(TrendingCategory {
                id: parse_uuid(&id_str)?,
                name: row.get("name"),
                created_at: parse_datetime(&created_at)?,
            });
        }
        Ok(categories)
    }

    /// Fails with a conflict when the name is already taken
    pub async fn create_trending_category(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> AppResult<TrendingCategory> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            "INSERT INTO trending_categories (id, name, created_at) VALUES (?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(name)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(TrendingCategory {
                id,
                name: name.to_string(),
                created_at: now,
            }),
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                        return Err(AppError::conflict("category_exists"));
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Removes the category and its assignments; false when it did not exist
    pub async fn delete_trending_category(&self, category_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM trending_category_videos WHERE trending_category_id = ?")
            .bind(category_id.to_string())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM trending_categories WHERE id = ?")
            .bind(category_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn trending_category_exists(&self, category_id: Uuid) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM trending_categories WHERE id = ?")
                .bind(category_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Idempotent assignment; re-assigning is a no-op
    pub async fn assign_video_to_category(
        &self,
        category_id: Uuid,
        video_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO trending_category_videos (trending_category_id, video_id, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(trending_category_id, video_id) DO NOTHING",
        )
        .bind(category_id.to_string())
        .bind(video_id.to_string())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Idempotent removal; absent assignments are ignored
    pub async fn unassign_video_from_category(
        &self,
        category_id: Uuid,
        video_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            "DELETE FROM trending_category_videos WHERE trending_category_id = ? AND video_id = ?",
        )
        .bind(category_id.to_string())
        .bind(video_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Video ids assigned to a category, newest assignment first
    pub async fn list_category_video_ids(&self, category_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT video_id FROM trending_category_videos
             WHERE trending_category_id = ? ORDER BY created_at DESC",
        )
        .bind(category_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id_str: String = row.get("video_id");
            ids.push(parse_uuid(&id_str)?);
        }
        Ok(ids)
    }
}
