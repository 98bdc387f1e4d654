// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Durable storage for the progression ledger.
//!
//! This module defines the storage abstraction and backend implementations.
//! The ledger owns three collections: users (balances), completions
//! (append-only award records), and award claims (the idempotency guard for
//! reaction-triggered grants).

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresLedger;
pub use self::sqlite::SqliteLedger;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;

/// User record from the ledger.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    /// External member identity key.
    pub member_id: String,
    /// Display name, last-seen value.
    pub display_name: String,
    /// Accumulated XP. Always equals the sum of this member's completions.
    pub total_xp: i64,
}

/// Completion record from the ledger. Append-only.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompletionRecord {
    /// Database primary key.
    pub id: i64,
    /// Member the completion belongs to.
    pub member_id: String,
    /// Completed task id.
    pub task_id: String,
    /// XP value snapshotted at grant time. Later catalog edits never
    /// rewrite past records.
    pub xp_earned: i64,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// When the completion was recorded.
    pub completed_at: DateTime<Utc>,
}

/// Outcome of an award claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The (message, kind) pair was claimed by this caller.
    Claimed,
    /// The pair was already claimed; the caller must not award.
    AlreadyClaimed,
}

/// Storage interface used by the progression engine.
///
/// Implementations must make `record_completion` atomic (completion row and
/// balance update commit together or not at all) and `claim_award` a single
/// claim-or-fail operation, never a separate check followed by an insert.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Create the user on first interaction, or refresh the display name to
    /// the last-seen value.
    async fn upsert_user(&self, member_id: &str, display_name: &str) -> Result<(), EngineError>;

    /// Fetch a user by member id.
    async fn get_user(&self, member_id: &str) -> Result<Option<UserRecord>, EngineError>;

    /// All completed task ids for a member, duplicates included (repeatable
    /// tasks produce one entry per completion).
    async fn completed_task_ids(&self, member_id: &str) -> Result<Vec<String>, EngineError>;

    /// Append a completion record and add its XP to the member's balance in
    /// one transaction. Returns the new balance.
    async fn record_completion(
        &self,
        member_id: &str,
        task_id: &str,
        xp: i64,
        comment: Option<&str>,
    ) -> Result<i64, EngineError>;

    /// All completion records for a member, oldest first.
    async fn completions_for(
        &self,
        member_id: &str,
    ) -> Result<Vec<CompletionRecord>, EngineError>;

    /// Atomically claim a (message, kind) award pair. At most one concurrent
    /// caller observes [`ClaimOutcome::Claimed`]; claims are never released.
    async fn claim_award(
        &self,
        message_id: &str,
        award_kind: &str,
    ) -> Result<ClaimOutcome, EngineError>;

    /// All users ordered by total XP descending.
    async fn leaderboard(&self) -> Result<Vec<UserRecord>, EngineError>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> Result<bool, EngineError>;
}

/// Connect to a ledger backend selected by URL scheme.
///
/// `sqlite:` URLs get the SQLite backend; anything else is handed to the
/// PostgreSQL backend. Migrations run before the ledger is returned.
pub async fn connect(database_url: &str) -> Result<Arc<dyn Ledger>, EngineError> {
    if database_url.starts_with("sqlite:") {
        Ok(Arc::new(SqliteLedger::connect(database_url).await?))
    } else {
        Ok(Arc::new(PostgresLedger::connect(database_url).await?))
    }
}
