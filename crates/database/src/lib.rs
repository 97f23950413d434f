//! SQLite persistence layer shared by the gateway and workers.
//!
//! This crate provides async database operations over one shared pool:
//! users with tier-gated daily quotas, persisted analyses (which double as
//! the 24 h duplicate-upload index), per-day usage counters, and the
//! rate-limiter's sliding-window event log. The job queue crate operates on
//! the same pool; all tables live in this crate's migrations because a
//! database can only carry one migration history.
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//!
//! #[tokio::main]
//! async fn main() -> database::Result<()> {
//!     let db = Database::connect("sqlite:verilens.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     database::user::ensure_user(db.pool(), 42, Some("alice"), None, 3).await?;
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod usage;
pub mod user;

pub use error::{DatabaseError, Result};
pub use models::{AnalysisRecord, Tier, User};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to a SQLite database.
    ///
    /// Use `?mode=rwc` to create the file on first run. WAL journaling is
    /// enabled so the gateway and several worker processes can share the
    /// file.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("connected to database: {}", url);

        Ok(Self { pool })
    }

    /// Run database migrations. Call once after connecting.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}
