//! SQLite-backed ticket store

use super::traits::TicketStore;
use crate::error::DatabaseError;
use crate::types::{TicketId, TicketRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Ticket store persisting JSON records in SQLite
///
/// Each ticket is one row holding the serialized [`TicketRecord`]. With a TTL
/// configured, rows carry an expiry: expired rows read as absent and are removed
/// by [`purge_expired`](Self::purge_expired).
#[derive(Debug, Clone)]
pub struct SqliteTicketStore {
    pool: SqlitePool,
    ttl: Option<Duration>,
}

impl SqliteTicketStore {
    /// Open (or create) the database at `path` and run migrations
    pub async fn new(path: &Path, ttl: Option<Duration>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to database: {}",
                e
            )))
        })?;

        let store = Self { pool, ttl };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create schema_version table: {}",
                e
            )))
        })?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query schema version: {}",
                        e
                    )))
                })?
                .flatten();

        if current_version.unwrap_or(0) < 1 {
            Self::migrate_v1(&mut conn).await?;
        }
        Ok(())
    }

    /// Migration v1: tickets table
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!("Applying ticket store migration v1");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                expires_at INTEGER
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create tickets table: {}",
                e
            )))
        })?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickets_expires_at ON tickets(expires_at)")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to create tickets index: {}",
                    e
                )))
            })?;

        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (1, ?)")
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to record migration v1: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Delete every expired ticket, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let result =
            sqlx::query("DELETE FROM tickets WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(Error::Sqlx)?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired tickets");
        }
        Ok(removed)
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn set(&self, ticket: &TicketId, record: &TicketRecord) -> Result<()> {
        let value = serde_json::to_string(record)?;
        let now = chrono::Utc::now().timestamp();
        let expires_at = self.ttl.map(|ttl| now + ttl.as_secs() as i64);

        sqlx::query(
            r#"
            INSERT INTO tickets (id, value, updated_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(ticket.as_str())
        .bind(value)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(())
    }

    async fn get(&self, ticket: &TicketId) -> Result<Option<TicketRecord>> {
        let row: Option<(String, Option<i64>)> =
            sqlx::query_as("SELECT value, expires_at FROM tickets WHERE id = ?")
                .bind(ticket.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Sqlx)?;

        let Some((value, expires_at)) = row else {
            return Ok(None);
        };
        if expires_at.is_some_and(|at| at <= chrono::Utc::now().timestamp()) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&value)?))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
