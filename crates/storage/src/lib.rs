use anyhow::{anyhow, Context, Result};
use chrono::Local;
use shared::domain::{ItemId, Rating, RatingRecord, TIMESTAMP_FORMAT};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::debug;

/// Durable item -> latest rating mapping, backed by the `ratings` table.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own empty database.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply ratings migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Records `rating` for `item` stamped with the local wall clock and
    /// returns the timestamp that was written.
    pub async fn upsert_rating(
        &self,
        item: &ItemId,
        description: &str,
        rating: Rating,
    ) -> Result<String> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.upsert_rating_at(item, description, rating, &timestamp)
            .await?;
        Ok(timestamp)
    }

    /// On conflict only `rating` and `timestamp` change; the description
    /// stored with the first rating is kept.
    pub async fn upsert_rating_at(
        &self,
        item: &ItemId,
        description: &str,
        rating: Rating,
        timestamp: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO ratings (item, description, rating, timestamp)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(item) DO UPDATE SET rating=excluded.rating, timestamp=excluded.timestamp",
        )
        .bind(item.as_str())
        .bind(description)
        .bind(rating.as_str())
        .bind(timestamp)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store rating for item '{item}'"))?;
        debug!(%item, %rating, timestamp, "rating stored");
        Ok(())
    }

    pub async fn fetch_ratings(&self) -> Result<Vec<RatingRecord>> {
        let rows = sqlx::query(
            "SELECT item, description, rating, timestamp FROM ratings ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to read ratings")?;

        rows.into_iter().map(|r| record_from_row(&r)).collect()
    }

    pub async fn rated_item_ids(&self) -> Result<HashSet<ItemId>> {
        let rows = sqlx::query("SELECT item FROM ratings")
            .fetch_all(&self.pool)
            .await
            .context("failed to read rated items")?;
        Ok(rows
            .into_iter()
            .map(|r| ItemId(r.get::<String, _>(0)))
            .collect())
    }

    pub async fn rating_for_item(&self, item: &ItemId) -> Result<Option<RatingRecord>> {
        let row = sqlx::query(
            "SELECT item, description, rating, timestamp FROM ratings WHERE item = ?",
        )
        .bind(item.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to read rating for item '{item}'"))?;

        row.as_ref().map(record_from_row).transpose()
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RatingRecord> {
    let item = ItemId(row.get::<String, _>(0));
    let rating = row
        .get::<Option<String>, _>(2)
        .ok_or_else(|| anyhow!("rating for item '{item}' is NULL"))?
        .parse::<Rating>()
        .with_context(|| format!("corrupt rating for item '{item}'"))?;
    Ok(RatingRecord {
        description: row.get::<Option<String>, _>(1).unwrap_or_default(),
        rating,
        timestamp: row.get::<Option<String>, _>(3).unwrap_or_default(),
        item,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
