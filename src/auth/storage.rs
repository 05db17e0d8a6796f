//! User accounts persisted in SQLite.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Connection, Row, SqlitePool,
};
use std::{str::FromStr, time::Duration};
use tracing::{info_span, Instrument};

pub const DEFAULT_DSN: &str = "sqlite://users.db?mode=rwc";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
)";

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Open the database and make sure the `users` table exists.
    ///
    /// In-memory databases live as long as their connection, so the pool is
    /// pinned to a single connection that never expires.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid or the database cannot be opened.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(dsn)
            .with_context(|| format!("invalid database DSN: {dsn}"))?
            .create_if_missing(true);

        let pool = if is_memory(dsn) {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 30))
                .test_before_acquire(true)
                .connect_with(options)
                .await
        }
        .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to create users table")?;
        Ok(())
    }

    /// Insert a new account. A taken username is reported, not raised.
    ///
    /// # Errors
    /// Returns an error on any database failure other than a duplicate key.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<CreateOutcome> {
        let query = "INSERT INTO users (username, password_hash, created_at) VALUES ($1, $2, $3)";
        let span = info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "INSERT",
            db.statement = query
        );

        match sqlx::query(query)
            .bind(username)
            .bind(password_hash)
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Ok(CreateOutcome::Duplicate)
            }
            Err(err) => Err(err).context("Error inserting user"),
        }
    }

    /// # Errors
    /// Returns an error if the lookup fails.
    pub async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let query = "SELECT username, password_hash FROM users WHERE username = $1";
        let span = info_span!(
            "db.query",
            db.system = "sqlite",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("Error looking up user")?;

        row.map(|row| -> Result<UserRecord> {
            Ok(UserRecord {
                username: row.try_get("username")?,
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }

    /// Whether a connection can be acquired and answers a ping.
    pub async fn ping(&self) -> bool {
        match self.pool.acquire().await {
            Ok(mut conn) => conn.ping().await.is_ok(),
            Err(_) => false,
        }
    }
}

fn is_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}
