use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};

pub mod sessions;
pub mod trending;
pub mod videos;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    trending_lock: Arc<Mutex<()>>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        // Create database if it doesn't exist (for SQLite)
        if !Sqlite::database_exists(&config.url).await? {
            Sqlite::create_database(&config.url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(10))
            .connect(&config.url)
            .await?;

        Ok(Self {
            pool,
            trending_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Serializes the clear/repin/repopulate cycle across callers
    pub async fn acquire_trending_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.trending_lock.lock().await
    }
}

// Rows store ids as TEXT and timestamps as RFC3339 TEXT; these helpers map
// them back, tolerating the plain SQLite datetime format as well.

pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::internal(format!("invalid stored uuid '{value}': {e}")))
}

pub(crate) fn parse_datetime(value: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    Err(AppError::internal(format!(
        "invalid stored datetime '{value}'"
    )))
}
