//! The persisted `ValidationResult` store (spec.md §6 "Persisted state").
//!
//! `rusqlite` (bundled SQLite) is the closest dependency-light stand-in for
//! "a database" available without pulling in a full ORM, which the
//! Non-goals keep out of scope; we still need *a* concrete [ValidationStore]
//! to exercise, so this lives as the default, swappable implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::types::ValidationResult;

use super::ValidationStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS validation_results (
    l1_block         INTEGER PRIMARY KEY,
    success          INTEGER NOT NULL,
    error_details    TEXT NOT NULL,
    validation_stats TEXT NOT NULL,
    validated_at     INTEGER NOT NULL,
    created_at       INTEGER NOT NULL,
    updated_at       INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_validation_results_success ON validation_results(success);
CREATE INDEX IF NOT EXISTS idx_validation_results_validated_at ON validation_results(validated_at);
CREATE INDEX IF NOT EXISTS idx_validation_results_success_l1_block ON validation_results(success, l1_block);
";

/// A `rusqlite`-backed [ValidationStore].
#[derive(Clone)]
pub struct SqliteValidationStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteValidationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteValidationStore").finish()
    }
}

impl SqliteValidationStore {
    /// Opens (creating if absent) the SQLite database at `path` and runs the schema migration.
    pub fn open(path: &Path) -> eyre::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// An in-memory store, handy for tests.
    pub fn in_memory() -> eyre::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn row_to_result(
        l1_block: u64,
        success: i64,
        error_details: String,
        validation_stats: String,
        validated_at: i64,
        created_at: i64,
        updated_at: i64,
    ) -> eyre::Result<ValidationResult> {
        Ok(ValidationResult {
            l1_block,
            success: success != 0,
            error_details: serde_json::from_str(&error_details)?,
            validation_stats: serde_json::from_str(&validation_stats)?,
            validated_at,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl ValidationStore for SqliteValidationStore {
    async fn upsert(&self, result: ValidationResult) -> eyre::Result<()> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> eyre::Result<()> {
            let conn = conn.lock().unwrap();
            let error_details = serde_json::to_string(&result.error_details)?;
            let validation_stats = serde_json::to_string(&result.validation_stats)?;
            conn.execute(
                "INSERT INTO validation_results
                    (l1_block, success, error_details, validation_stats, validated_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(l1_block) DO UPDATE SET
                    success = excluded.success,
                    error_details = excluded.error_details,
                    validation_stats = excluded.validation_stats,
                    validated_at = excluded.validated_at,
                    updated_at = excluded.updated_at",
                params![
                    result.l1_block,
                    result.success as i64,
                    error_details,
                    validation_stats,
                    result.validated_at,
                    result.created_at,
                ],
            )?;
            Ok(())
        })
        .await?
    }

    async fn get(&self, l1_block: u64) -> eyre::Result<Option<ValidationResult>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> eyre::Result<Option<ValidationResult>> {
            let conn = conn.lock().unwrap();
            conn.query_row(
                "SELECT l1_block, success, error_details, validation_stats, validated_at, created_at, updated_at
                 FROM validation_results WHERE l1_block = ?1",
                params![l1_block],
                |row| {
                    Ok((
                        row.get::<_, u64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?
            .map(|(l1_block, success, error_details, validation_stats, validated_at, created_at, updated_at)| {
                Self::row_to_result(l1_block, success, error_details, validation_stats, validated_at, created_at, updated_at)
            })
            .transpose()
        })
        .await?
    }

    async fn first_failure_at_or_before(&self, l1_block: u64) -> eyre::Result<Option<u64>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> eyre::Result<Option<u64>> {
            let conn = conn.lock().unwrap();
            conn.query_row(
                "SELECT l1_block FROM validation_results
                 WHERE success = 0 AND l1_block <= ?1
                 ORDER BY l1_block ASC LIMIT 1",
                params![l1_block],
                |row| row.get::<_, u64>(0),
            )
            .optional()
            .map_err(Into::into)
        })
        .await?
    }

    async fn missing_in_range(&self, start: u64, end: u64) -> eyre::Result<Vec<u64>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> eyre::Result<Vec<u64>> {
            let conn = conn.lock().unwrap();
            let mut stmt = conn.prepare("SELECT l1_block FROM validation_results WHERE l1_block BETWEEN ?1 AND ?2")?;
            let present: std::collections::HashSet<u64> = stmt
                .query_map(params![start, end], |row| row.get::<_, u64>(0))?
                .collect::<Result<_, _>>()?;
            Ok((start..=end).filter(|n| !present.contains(n)).collect())
        })
        .await?
    }

    async fn last_validated(&self) -> eyre::Result<Option<u64>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> eyre::Result<Option<u64>> {
            let conn = conn.lock().unwrap();
            conn.query_row("SELECT MAX(l1_block) FROM validation_results", [], |row| row.get::<_, Option<u64>>(0))
                .map_err(Into::into)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(l1_block: u64, success: bool) -> ValidationResult {
        ValidationResult::new(l1_block, success, vec![], serde_json::json!({}), 1000)
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = SqliteValidationStore::in_memory().unwrap();
        store.upsert(sample(1, true)).await.unwrap();
        store.upsert(sample(1, true)).await.unwrap();
        let result = store.get(1).await.unwrap().unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn first_failure_finds_earliest_failed_block() {
        let store = SqliteValidationStore::in_memory().unwrap();
        store.upsert(sample(1, true)).await.unwrap();
        store.upsert(sample(2, false)).await.unwrap();
        store.upsert(sample(3, false)).await.unwrap();
        let first = store.first_failure_at_or_before(10).await.unwrap();
        assert_eq!(first, Some(2));
    }

    #[tokio::test]
    async fn missing_in_range_finds_gaps() {
        let store = SqliteValidationStore::in_memory().unwrap();
        store.upsert(sample(2, true)).await.unwrap();
        store.upsert(sample(4, true)).await.unwrap();
        let missing = store.missing_in_range(1, 5).await.unwrap();
        assert_eq!(missing, vec![1, 3, 5]);
    }
}
