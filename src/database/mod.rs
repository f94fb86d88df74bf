use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::info;

use crate::models::ListingRecord;
use crate::traits::{ListingStats, ListingStore, RangeField, TextField};

const COLUMNS: &str = "listing_id, title, property_type, description, price, acres, price_per_acre, \
     location, city, state, address, county, zip_code, url, image_url, agent_name, agent_phone, \
     latitude, longitude, features, additional_info, date_listed, date_scraped";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(db_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            if let Some(parent) = db_file_path(db_url).and_then(Path::parent)
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating database directory {}", parent.display()))?;
            }
            info!("Creating database file");
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url).await?;
        Self::migrate(pool).await
    }

    /// A private in-memory database, mostly useful for tests
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    async fn select_where(&self, condition: &str, binds: &[Bind<'_>]) -> Result<Vec<ListingRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM listings WHERE {condition} ORDER BY id");
        let mut query = sqlx::query_as::<_, ListingRecord>(&sql);
        for bind in binds {
            query = match *bind {
                Bind::Text(text) => query.bind(text),
                Bind::Number(number) => query.bind(number),
            };
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

enum Bind<'a> {
    Text(&'a str),
    Number(f64),
}

fn db_file_path(db_url: &str) -> Option<&Path> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    (!path.is_empty() && !path.starts_with(":memory:")).then(|| Path::new(path))
}

fn numeric_column(field: RangeField) -> &'static str {
    match field {
        RangeField::Price => "CAST(REPLACE(REPLACE(price, '$', ''), ',', '') AS REAL)",
        RangeField::Acres => "CAST(REPLACE(acres, ',', '') AS REAL)",
    }
}

fn text_columns(field: TextField) -> &'static [&'static str] {
    match field {
        TextField::Location => &["city", "state", "county", "location"],
        TextField::Title => &["title"],
        TextField::PropertyType => &["property_type"],
    }
}

#[async_trait]
impl ListingStore for Database {
    async fn upsert(&self, listing: &ListingRecord) -> Result<bool> {
        let placeholders = vec!["?"; COLUMNS.split(',').count()].join(", ");
        let sql = format!("INSERT OR REPLACE INTO listings ({COLUMNS}) VALUES ({placeholders})");

        let result = sqlx::query(&sql)
            .bind(&listing.listing_id)
            .bind(&listing.title)
            .bind(&listing.property_type)
            .bind(&listing.description)
            .bind(&listing.price)
            .bind(&listing.acres)
            .bind(&listing.price_per_acre)
            .bind(&listing.location)
            .bind(&listing.city)
            .bind(&listing.state)
            .bind(&listing.address)
            .bind(&listing.county)
            .bind(&listing.zip_code)
            .bind(&listing.url)
            .bind(&listing.image_url)
            .bind(&listing.agent_name)
            .bind(&listing.agent_phone)
            .bind(&listing.latitude)
            .bind(&listing.longitude)
            .bind(&listing.features)
            .bind(&listing.additional_info)
            .bind(&listing.date_listed)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_all(&self) -> Result<Vec<ListingRecord>> {
        self.select_where("1 = 1", &[]).await
    }

    async fn query_by_range(&self, field: RangeField, lo: f64, hi: Option<f64>) -> Result<Vec<ListingRecord>> {
        let column = numeric_column(field);
        match hi {
            Some(hi) => {
                self.select_where(
                    &format!("{column} BETWEEN ? AND ?"),
                    &[Bind::Number(lo), Bind::Number(hi)],
                )
                .await
            }
            None => self.select_where(&format!("{column} >= ?"), &[Bind::Number(lo)]).await,
        }
    }

    async fn query_by_text(&self, field: TextField, needle: &str) -> Result<Vec<ListingRecord>> {
        let columns = text_columns(field);
        let condition = columns
            .iter()
            .map(|c| format!("{c} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let pattern = format!("%{needle}%");
        let binds: Vec<Bind<'_>> = columns.iter().map(|_| Bind::Text(&pattern)).collect();

        self.select_where(&condition, &binds).await
    }

    async fn stats(&self) -> Result<ListingStats> {
        let total_listings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;

        let by_state: Vec<(Option<String>, i64)> = sqlx::query_as(
            "SELECT state, COUNT(*) AS count FROM listings GROUP BY state ORDER BY count DESC, state",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ListingStats {
            total_listings,
            by_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_is_taken_from_sqlite_url() {
        assert_eq!(
            db_file_path("sqlite:database/landwatch.db"),
            Some(Path::new("database/landwatch.db"))
        );
        assert_eq!(db_file_path("sqlite://data/x.db?mode=rwc"), Some(Path::new("data/x.db")));
        assert_eq!(db_file_path("sqlite::memory:"), None);
    }
}
