// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for questline-core integration tests.
//!
//! Provides a TestContext over a file-backed SQLite ledger and the stock
//! catalog, plus assertion helpers for outcomes and ledger consistency.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use questline_core::catalog::TaskCatalog;
use questline_core::ledger::{Ledger, SqliteLedger};
use questline_core::progression::{Award, Outcome, ProgressionEngine, Rejection};

/// Test context holding the engine and direct ledger access.
pub struct TestContext {
    pub engine: Arc<ProgressionEngine>,
    pub ledger: Arc<SqliteLedger>,
    _dir: TempDir,
}

/// Set up an engine over the stock catalog and a fresh SQLite database.
pub async fn setup() -> TestContext {
    setup_with_catalog(TaskCatalog::stock()).await
}

/// Set up an engine over a custom catalog and a fresh SQLite database.
pub async fn setup_with_catalog(catalog: TaskCatalog) -> TestContext {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ledger = Arc::new(
        SqliteLedger::from_path(dir.path().join("questline.db"))
            .await
            .expect("initialize test ledger"),
    );
    let engine = Arc::new(ProgressionEngine::new(
        Arc::new(catalog),
        ledger.clone() as Arc<dyn Ledger>,
    ));
    TestContext {
        engine,
        ledger,
        _dir: dir,
    }
}

/// Unwrap an accepted outcome or panic with the rejection.
pub fn expect_award(outcome: Outcome) -> Award {
    match outcome {
        Outcome::Accepted(award) => award,
        Outcome::Rejected(rejection) => {
            panic!("expected acceptance, got rejection: {}", rejection)
        }
    }
}

/// Unwrap a rejected outcome or panic with the award.
pub fn expect_rejection(outcome: Outcome) -> Rejection {
    match outcome {
        Outcome::Rejected(rejection) => rejection,
        Outcome::Accepted(award) => panic!(
            "expected rejection, got acceptance of '{}' for {} XP",
            award.task.id, award.xp_earned
        ),
    }
}

/// Complete a task that must be accepted; returns the award.
pub async fn complete_ok(ctx: &TestContext, member_id: &str, name: &str, task_id: &str) -> Award {
    let outcome = ctx
        .engine
        .complete_task(member_id, name, task_id, None)
        .await
        .expect("complete_task");
    expect_award(outcome)
}

/// Assert the ledger invariant: total XP equals the sum of the member's
/// completion records.
pub async fn assert_balance_consistent(ctx: &TestContext, member_id: &str) {
    let user = ctx
        .ledger
        .get_user(member_id)
        .await
        .expect("get user")
        .expect("user exists");
    let sum: i64 = ctx
        .ledger
        .completions_for(member_id)
        .await
        .expect("list completions")
        .iter()
        .map(|record| record.xp_earned)
        .sum();
    assert_eq!(
        user.total_xp, sum,
        "total_xp out of sync with ledger for {}",
        member_id
    );
}
