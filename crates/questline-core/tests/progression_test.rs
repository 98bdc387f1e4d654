// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Validation gates, award paths, and ledger consistency.

mod common;

use common::{
    assert_balance_consistent, complete_ok, expect_award, expect_rejection, setup,
    setup_with_catalog,
};
use questline_core::catalog::{Task, TaskCatalog, TaskPath};
use questline_core::ledger::Ledger;
use questline_core::progression::Rejection;
use questline_core::tier::RoleTier;

const ALICE: &str = "member-alice";

#[tokio::test]
async fn test_first_completion_creates_user_and_awards_xp() {
    let ctx = setup().await;

    let award = complete_ok(&ctx, ALICE, "Alice", "on1").await;
    assert_eq!(award.xp_earned, 10);
    assert_eq!(award.total_xp, 10);
    assert_eq!(award.tier, RoleTier::Tier1);
    assert_eq!(award.task.id, "on1");

    let user = ctx.ledger.get_user(ALICE).await.unwrap().unwrap();
    assert_eq!(user.display_name, "Alice");
    assert_eq!(user.total_xp, 10);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_unknown_task_rejected() {
    let ctx = setup().await;

    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "does-not-exist", None)
        .await
        .unwrap();
    let rejection = expect_rejection(outcome);
    assert_eq!(rejection.code(), "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_special_task_rejected_on_self_service() {
    let ctx = setup().await;

    for task_id in ["s1", "s2", "s3"] {
        let outcome = ctx
            .engine
            .complete_task(ALICE, "Alice", task_id, None)
            .await
            .unwrap();
        let rejection = expect_rejection(outcome);
        assert_eq!(rejection.code(), "SPECIAL_TASK_FORBIDDEN");
    }

    // Rejected before any user state exists.
    assert!(ctx.ledger.get_user(ALICE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_special_rejection_ignores_catalog_details() {
    // Even a level-0 non-repeatable special task stays moderator-only.
    let catalog = TaskCatalog::new(vec![Task {
        id: "sx".to_string(),
        name: "Odd special".to_string(),
        path: TaskPath::Special,
        level: 0,
        xp: 5,
        repeatable: false,
        icon: "star".to_string(),
    }])
    .unwrap();
    let ctx = setup_with_catalog(catalog).await;

    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "sx", None)
        .await
        .unwrap();
    assert_eq!(expect_rejection(outcome).code(), "SPECIAL_TASK_FORBIDDEN");
}

#[tokio::test]
async fn test_non_repeatable_replay_rejected() {
    let ctx = setup().await;

    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "on1", None)
        .await
        .unwrap();
    let rejection = expect_rejection(outcome);
    assert_eq!(
        rejection,
        Rejection::AlreadyCompleted {
            task_id: "on1".to_string()
        }
    );

    let user = ctx.ledger.get_user(ALICE).await.unwrap().unwrap();
    assert_eq!(user.total_xp, 10);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_repeatable_task_accumulates() {
    let ctx = setup().await;

    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    complete_ok(&ctx, ALICE, "Alice", "on2").await;

    let first = complete_ok(&ctx, ALICE, "Alice", "o1").await;
    let second = complete_ok(&ctx, ALICE, "Alice", "o1").await;
    assert_eq!(first.total_xp, 35);
    assert_eq!(second.total_xp, 45);

    let completions = ctx.ledger.completions_for(ALICE).await.unwrap();
    let o1_count = completions.iter().filter(|r| r.task_id == "o1").count();
    assert_eq!(o1_count, 2);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_onboarding_gate_blocks_main_paths() {
    let ctx = setup().await;

    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "o1", None)
        .await
        .unwrap();
    assert_eq!(
        expect_rejection(outcome),
        Rejection::OnboardingIncomplete {
            required: 2,
            completed: 0
        }
    );

    // One onboarding task is still not enough.
    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "l2", None)
        .await
        .unwrap();
    assert_eq!(
        expect_rejection(outcome),
        Rejection::OnboardingIncomplete {
            required: 2,
            completed: 1
        }
    );

    // Two distinct onboarding tasks open both main paths.
    complete_ok(&ctx, ALICE, "Alice", "on2").await;
    complete_ok(&ctx, ALICE, "Alice", "o1").await;
    complete_ok(&ctx, ALICE, "Alice", "l2").await;
}

#[tokio::test]
async fn test_level_two_gate_requires_three_level_ones() {
    let ctx = setup().await;
    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    complete_ok(&ctx, ALICE, "Alice", "on2").await;

    complete_ok(&ctx, ALICE, "Alice", "o1").await;
    complete_ok(&ctx, ALICE, "Alice", "o2").await;

    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "o4", None)
        .await
        .unwrap();
    assert_eq!(
        expect_rejection(outcome),
        Rejection::LevelPrerequisiteUnmet {
            path: TaskPath::Outreach,
            level: 1,
            required: 3,
            completed: 2
        }
    );

    // Repeating a level-1 task does not add a distinct completion.
    complete_ok(&ctx, ALICE, "Alice", "o1").await;
    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "o4", None)
        .await
        .unwrap();
    assert_eq!(
        expect_rejection(outcome).code(),
        "LEVEL_PREREQUISITE_UNMET"
    );

    complete_ok(&ctx, ALICE, "Alice", "o3").await;
    let award = complete_ok(&ctx, ALICE, "Alice", "o4").await;
    assert_eq!(award.xp_earned, 50);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_level_three_gate_requires_two_level_twos() {
    let ctx = setup().await;
    for task_id in ["on1", "on2", "o1", "o2", "o3", "o4"] {
        complete_ok(&ctx, ALICE, "Alice", task_id).await;
    }

    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "o6", None)
        .await
        .unwrap();
    assert_eq!(
        expect_rejection(outcome),
        Rejection::LevelPrerequisiteUnmet {
            path: TaskPath::Outreach,
            level: 2,
            required: 2,
            completed: 1
        }
    );

    complete_ok(&ctx, ALICE, "Alice", "o5").await;
    let award = complete_ok(&ctx, ALICE, "Alice", "o6").await;
    assert_eq!(award.xp_earned, 120);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_level_gate_scoped_to_path() {
    let ctx = setup().await;
    for task_id in ["on1", "on2", "o1", "o2", "o3"] {
        complete_ok(&ctx, ALICE, "Alice", task_id).await;
    }

    // Three level-1 outreach completions say nothing about lobbying.
    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "l4", None)
        .await
        .unwrap();
    assert_eq!(
        expect_rejection(outcome),
        Rejection::LevelPrerequisiteUnmet {
            path: TaskPath::Lobbying,
            level: 1,
            required: 3,
            completed: 0
        }
    );
}

#[tokio::test]
async fn test_progression_scenario_end_to_end() {
    let ctx = setup().await;

    // Two onboarding tasks: 10 + 15 XP.
    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    let award = complete_ok(&ctx, ALICE, "Alice", "on2").await;
    assert_eq!(award.total_xp, 25);
    assert_eq!(award.tier, RoleTier::Tier1);
    assert_balance_consistent(&ctx, ALICE).await;

    // Three distinct level-1 outreach tasks: 10 + 15 + 20 XP.
    complete_ok(&ctx, ALICE, "Alice", "o1").await;
    complete_ok(&ctx, ALICE, "Alice", "o2").await;
    let award = complete_ok(&ctx, ALICE, "Alice", "o3").await;
    assert_eq!(award.total_xp, 70);
    assert_eq!(award.tier, RoleTier::Tier1);
    assert_balance_consistent(&ctx, ALICE).await;

    // Level-2 outreach unlocks with three level-1 prerequisites met.
    let award = complete_ok(&ctx, ALICE, "Alice", "o4").await;
    assert_eq!(award.xp_earned, 50);
    assert_eq!(award.total_xp, 120);
    assert_eq!(award.tier, RoleTier::Tier1);
    assert_balance_consistent(&ctx, ALICE).await;

    // o4 is non-repeatable; the replay is rejected.
    let outcome = ctx
        .engine
        .complete_task(ALICE, "Alice", "o4", None)
        .await
        .unwrap();
    assert_eq!(expect_rejection(outcome).code(), "ALREADY_COMPLETED");
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_award_special_accepts_and_repeats() {
    let ctx = setup().await;

    let first = expect_award(
        ctx.engine
            .award_special(ALICE, "Alice", "s2", Some("Awarded by Mod"))
            .await
            .unwrap(),
    );
    assert_eq!(first.xp_earned, 75);
    assert_eq!(first.comment.as_deref(), Some("Awarded by Mod"));

    // Special tasks are repeatable by definition.
    let second = expect_award(
        ctx.engine
            .award_special(ALICE, "Alice", "s2", None)
            .await
            .unwrap(),
    );
    assert_eq!(second.total_xp, 150);
    assert_eq!(second.tier, RoleTier::Tier2);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_award_special_rejects_non_special_and_unknown() {
    let ctx = setup().await;

    for task_id in ["o1", "on1", "nope"] {
        let outcome = ctx
            .engine
            .award_special(ALICE, "Alice", task_id, None)
            .await
            .unwrap();
        let rejection = expect_rejection(outcome);
        assert_eq!(rejection.code(), "INVALID_SPECIAL_TASK");
    }
}

#[tokio::test]
async fn test_award_special_bypasses_gates() {
    let ctx = setup().await;

    // No onboarding, no prerequisites: the moderator path has no gates.
    let award = expect_award(
        ctx.engine
            .award_special(ALICE, "Alice", "s3", None)
            .await
            .unwrap(),
    );
    assert_eq!(award.total_xp, 150);
    assert_eq!(award.tier, RoleTier::Tier2);
}

#[tokio::test]
async fn test_tier_progression_through_awards() {
    let ctx = setup().await;

    let award = expect_award(
        ctx.engine
            .award_special(ALICE, "Alice", "s3", None)
            .await
            .unwrap(),
    );
    assert_eq!(award.tier, RoleTier::Tier2); // 150 XP, boundary inclusive

    let award = expect_award(
        ctx.engine
            .award_special(ALICE, "Alice", "s3", None)
            .await
            .unwrap(),
    );
    assert_eq!(award.total_xp, 300);
    assert_eq!(award.tier, RoleTier::Tier2);

    let award = expect_award(
        ctx.engine
            .award_special(ALICE, "Alice", "s3", None)
            .await
            .unwrap(),
    );
    assert_eq!(award.total_xp, 450);
    assert_eq!(award.tier, RoleTier::Tier3);
    assert_balance_consistent(&ctx, ALICE).await;
}

#[tokio::test]
async fn test_display_name_refreshes_to_last_seen() {
    let ctx = setup().await;

    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    complete_ok(&ctx, ALICE, "Alicia", "on2").await;

    let user = ctx.ledger.get_user(ALICE).await.unwrap().unwrap();
    assert_eq!(user.display_name, "Alicia");
}

#[tokio::test]
async fn test_leaderboard_orders_by_xp() {
    let ctx = setup().await;

    complete_ok(&ctx, "member-a", "A", "on1").await; // 10 XP
    complete_ok(&ctx, "member-b", "B", "on3").await; // 20 XP
    ctx.engine
        .award_special("member-c", "C", "s3", None)
        .await
        .unwrap(); // 150 XP

    let board = ctx.engine.leaderboard().await.unwrap();
    let ids: Vec<&str> = board.iter().map(|e| e.member_id.as_str()).collect();
    assert_eq!(ids, vec!["member-c", "member-b", "member-a"]);
    assert_eq!(board[0].tier, RoleTier::Tier2);
    assert_eq!(board[1].tier, RoleTier::Tier1);
}

#[tokio::test]
async fn test_profile_lists_completions() {
    let ctx = setup().await;

    assert!(ctx.engine.profile(ALICE).await.unwrap().is_none());

    complete_ok(&ctx, ALICE, "Alice", "on1").await;
    complete_ok(&ctx, ALICE, "Alice", "on2").await;
    complete_ok(&ctx, ALICE, "Alice", "o1").await;
    complete_ok(&ctx, ALICE, "Alice", "o1").await;

    let profile = ctx.engine.profile(ALICE).await.unwrap().unwrap();
    assert_eq!(profile.total_xp, 45);
    assert_eq!(profile.tier, RoleTier::Tier1);
    assert_eq!(
        profile.completed_task_ids,
        vec!["on1", "on2", "o1", "o1"]
    );
}
