//! SQLite-backed ledger implementation.

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::EngineError;

use super::{ClaimOutcome, CompletionRecord, Ledger, UserRecord};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/sqlite");

/// SQLite-backed ledger.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Create a new SQLite ledger from an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL and run migrations.
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| EngineError::Database {
                operation: "connect".to_string(),
                details: format!("Failed to connect to SQLite at {}: {}", url, e),
            })?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create and initialize a SQLite ledger from a file path.
    ///
    /// Creates parent directories and the database file if they don't exist,
    /// then runs all migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::Database {
                operation: "create_dir".to_string(),
                details: format!("Failed to create directory {:?}: {}", parent, e),
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        Self::connect(&url).await
    }
}

#[async_trait::async_trait]
impl Ledger for SqliteLedger {
    async fn upsert_user(&self, member_id: &str, display_name: &str) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO users (member_id, display_name, total_xp)
            VALUES (?, ?, 0)
            ON CONFLICT(member_id) DO UPDATE SET display_name = excluded.display_name
            "#,
        )
        .bind(member_id)
        .bind(display_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user(&self, member_id: &str) -> Result<Option<UserRecord>, EngineError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT member_id, display_name, total_xp
            FROM users
            WHERE member_id = ?
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn completed_task_ids(&self, member_id: &str) -> Result<Vec<String>, EngineError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT task_id
            FROM completions
            WHERE member_id = ?
            ORDER BY id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn record_completion(
        &self,
        member_id: &str,
        task_id: &str,
        xp: i64,
        comment: Option<&str>,
    ) -> Result<i64, EngineError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO completions (member_id, task_id, xp_earned, comment, completed_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(member_id)
        .bind(task_id)
        .bind(xp)
        .bind(comment)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET total_xp = total_xp + ?
            WHERE member_id = ?
            "#,
        )
        .bind(xp)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

        let (total_xp,): (i64,) = sqlx::query_as(
            r#"
            SELECT total_xp FROM users WHERE member_id = ?
            "#,
        )
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(total_xp)
    }

    async fn completions_for(
        &self,
        member_id: &str,
    ) -> Result<Vec<CompletionRecord>, EngineError> {
        let records = sqlx::query_as::<_, CompletionRecord>(
            r#"
            SELECT id, member_id, task_id, xp_earned, comment, completed_at
            FROM completions
            WHERE member_id = ?
            ORDER BY id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn claim_award(
        &self,
        message_id: &str,
        award_kind: &str,
    ) -> Result<ClaimOutcome, EngineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO award_claims (message_id, award_kind, claimed_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(message_id, award_kind) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(award_kind)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(ClaimOutcome::Claimed)
        } else {
            Ok(ClaimOutcome::AlreadyClaimed)
        }
    }

    async fn leaderboard(&self) -> Result<Vec<UserRecord>, EngineError> {
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT member_id, display_name, total_xp
            FROM users
            ORDER BY total_xp DESC, member_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn health_check(&self) -> Result<bool, EngineError> {
        let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.0 == 1)
    }
}
