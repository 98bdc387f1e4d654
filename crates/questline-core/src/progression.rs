// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The progression engine.
//!
//! All business rules live here: the validation gates for self-service
//! completions, the moderator/trigger award path, and the exactly-once
//! reaction award flow. The engine consults the immutable [`TaskCatalog`]
//! and mutates state only through the [`Ledger`].
//!
//! Every validate-then-write sequence for one member runs under that
//! member's lock, so two concurrent attempts can never both pass a gate that
//! only one of them should satisfy.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::catalog::{Task, TaskCatalog, TaskPath};
use crate::error::EngineError;
use crate::ledger::{ClaimOutcome, Ledger};
use crate::reaction::{self, ReactionEvent};
use crate::tier::RoleTier;

/// Distinct completed onboarding tasks required before outreach or lobbying
/// tasks at level >= 1 open up.
pub const ONBOARDING_GATE: usize = 2;

/// Distinct completed level-1 tasks required to enter level 2 of a path.
pub const LEVEL_2_GATE: usize = 3;

/// Distinct completed preceding-level tasks required above level 2.
pub const HIGHER_LEVEL_GATE: usize = 2;

/// An accepted award: the committed ledger result plus everything a
/// notifier or role synchronizer needs.
#[derive(Debug, Clone)]
pub struct Award {
    /// Member who earned the award.
    pub member_id: String,
    /// Member display name at award time.
    pub display_name: String,
    /// The completed task.
    pub task: Task,
    /// XP granted by this award.
    pub xp_earned: i64,
    /// New XP balance after the award.
    pub total_xp: i64,
    /// Role tier resolved from the new balance.
    pub tier: RoleTier,
    /// Comment recorded with the completion, if any.
    pub comment: Option<String>,
}

/// Why a completion attempt was rejected.
///
/// Rejections are expected outcomes, returned to the caller with enough
/// context to render a useful message. They are never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The task id is not in the catalog.
    TaskNotFound {
        /// The unknown task id.
        task_id: String,
    },
    /// Self-service attempt on a special-category task.
    SpecialForbidden {
        /// The special task id.
        task_id: String,
    },
    /// Non-repeatable task the member has already completed.
    AlreadyCompleted {
        /// The replayed task id.
        task_id: String,
    },
    /// Too few completed onboarding tasks for an outreach/lobbying task.
    OnboardingIncomplete {
        /// Distinct onboarding completions required.
        required: usize,
        /// Distinct onboarding completions the member holds.
        completed: usize,
    },
    /// Too few completed preceding-level tasks in the task's path.
    LevelPrerequisiteUnmet {
        /// The path the prerequisite applies to.
        path: TaskPath,
        /// The preceding level that must be completed.
        level: u32,
        /// Distinct completions required at that level.
        required: usize,
        /// Distinct completions the member holds at that level.
        completed: usize,
    },
    /// Moderator award path was given an unknown or non-special task id.
    InvalidSpecialTask {
        /// The rejected task id.
        task_id: String,
    },
}

impl Rejection {
    /// Stable machine-readable code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TaskNotFound { .. } => "TASK_NOT_FOUND",
            Self::SpecialForbidden { .. } => "SPECIAL_TASK_FORBIDDEN",
            Self::AlreadyCompleted { .. } => "ALREADY_COMPLETED",
            Self::OnboardingIncomplete { .. } => "ONBOARDING_INCOMPLETE",
            Self::LevelPrerequisiteUnmet { .. } => "LEVEL_PREREQUISITE_UNMET",
            Self::InvalidSpecialTask { .. } => "INVALID_SPECIAL_TASK",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskNotFound { task_id } => write!(f, "Task '{}' not found", task_id),
            Self::SpecialForbidden { .. } => {
                write!(f, "Special tasks can only be granted by moderators")
            }
            Self::AlreadyCompleted { task_id } => {
                write!(f, "Task '{}' already completed", task_id)
            }
            Self::OnboardingIncomplete { required, .. } => {
                write!(f, "Complete at least {} onboarding tasks first", required)
            }
            Self::LevelPrerequisiteUnmet {
                path,
                level,
                required,
                ..
            } => {
                write!(
                    f,
                    "Requires {} distinct completed level-{} tasks in the {} path",
                    required, level, path
                )
            }
            Self::InvalidSpecialTask { task_id } => {
                write!(f, "Task '{}' is not a grantable special task", task_id)
            }
        }
    }
}

/// Terminal outcome of a completion attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The award was committed to the ledger.
    Accepted(Award),
    /// A validation gate rejected the attempt; nothing was written.
    Rejected(Rejection),
}

impl Outcome {
    /// The award, if accepted.
    pub fn award(&self) -> Option<&Award> {
        match self {
            Self::Accepted(award) => Some(award),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection, if rejected.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// A member profile: balance, tier, and completion history.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Member identity key.
    pub member_id: String,
    /// Display name, last-seen value.
    pub display_name: String,
    /// Accumulated XP.
    pub total_xp: i64,
    /// Resolved role tier.
    pub tier: RoleTier,
    /// Completed task ids, duplicates included for repeatable tasks.
    pub completed_task_ids: Vec<String>,
}

/// A leaderboard row.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    /// Member identity key.
    pub member_id: String,
    /// Display name, last-seen value.
    pub display_name: String,
    /// Accumulated XP.
    pub total_xp: i64,
    /// Resolved role tier.
    pub tier: RoleTier,
}

/// Orchestrates validation, ledger mutation, and tier resolution.
pub struct ProgressionEngine {
    catalog: Arc<TaskCatalog>,
    ledger: Arc<dyn Ledger>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ProgressionEngine {
    /// Create an engine over a catalog and a ledger backend.
    pub fn new(catalog: Arc<TaskCatalog>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            catalog,
            ledger,
            user_locks: DashMap::new(),
        }
    }

    /// The task catalog this engine validates against.
    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    fn user_lock(&self, member_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(member_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Self-service task completion.
    ///
    /// Validation short-circuits on the first failing gate; see the crate
    /// docs for the gate order. On success the completion record and balance
    /// update commit atomically and the new tier is resolved from the
    /// updated balance.
    #[instrument(skip_all, fields(member_id = %member_id, task_id = %task_id))]
    pub async fn complete_task(
        &self,
        member_id: &str,
        display_name: &str,
        task_id: &str,
        comment: Option<&str>,
    ) -> Result<Outcome, EngineError> {
        // 1. Task must exist
        let Some(task) = self.catalog.get(task_id) else {
            debug!("rejected: unknown task");
            return Ok(Outcome::Rejected(Rejection::TaskNotFound {
                task_id: task_id.to_string(),
            }));
        };
        let task = task.clone();

        // 2. Special tasks are moderator/trigger-only
        if task.path == TaskPath::Special {
            debug!("rejected: special task on self-service path");
            return Ok(Outcome::Rejected(Rejection::SpecialForbidden {
                task_id: task_id.to_string(),
            }));
        }

        // Serialize the whole validate-then-write sequence per member.
        let lock = self.user_lock(member_id);
        let _guard = lock.lock().await;

        self.ledger.upsert_user(member_id, display_name).await?;
        let completed = self.ledger.completed_task_ids(member_id).await?;
        let distinct: HashSet<&str> = completed.iter().map(String::as_str).collect();

        // 3. Non-repeatable replay
        if !task.repeatable && distinct.contains(task_id) {
            debug!("rejected: already completed");
            return Ok(Outcome::Rejected(Rejection::AlreadyCompleted {
                task_id: task_id.to_string(),
            }));
        }

        // 4. Onboarding gate for the main paths
        if matches!(task.path, TaskPath::Outreach | TaskPath::Lobbying) && task.level >= 1 {
            let onboarding_done = distinct
                .iter()
                .filter(|id| {
                    self.catalog
                        .get(id)
                        .is_some_and(|t| t.path == TaskPath::Onboarding)
                })
                .count();
            if onboarding_done < ONBOARDING_GATE {
                debug!(completed = onboarding_done, "rejected: onboarding gate");
                return Ok(Outcome::Rejected(Rejection::OnboardingIncomplete {
                    required: ONBOARDING_GATE,
                    completed: onboarding_done,
                }));
            }
        }

        // 5. Level gate: N distinct completions at the preceding level of
        //    the same path (N = 3 entering level 2, N = 2 above)
        if task.level > 1 {
            let required = if task.level == 2 {
                LEVEL_2_GATE
            } else {
                HIGHER_LEVEL_GATE
            };
            let preceding = task.level - 1;
            let done = self
                .catalog
                .ids_at(task.path, preceding)
                .map(|ids| distinct.iter().filter(|id| ids.contains(**id)).count())
                .unwrap_or(0);
            if done < required {
                debug!(
                    path = %task.path,
                    level = preceding,
                    completed = done,
                    "rejected: level gate"
                );
                return Ok(Outcome::Rejected(Rejection::LevelPrerequisiteUnmet {
                    path: task.path,
                    level: preceding,
                    required,
                    completed: done,
                }));
            }
        }

        let award = self
            .commit_award(member_id, display_name, &task, comment)
            .await?;
        Ok(Outcome::Accepted(award))
    }

    /// Moderator/trigger award of a special-category task.
    ///
    /// No onboarding or level gating: moderators bypass progression rules.
    /// Special tasks are repeatable by catalog definition, so the same id
    /// may be granted to the same member many times.
    #[instrument(skip_all, fields(member_id = %member_id, task_id = %task_id))]
    pub async fn award_special(
        &self,
        member_id: &str,
        display_name: &str,
        task_id: &str,
        comment: Option<&str>,
    ) -> Result<Outcome, EngineError> {
        let task = match self.catalog.get(task_id) {
            Some(task) if task.path == TaskPath::Special => task.clone(),
            _ => {
                debug!("rejected: not a special task");
                return Ok(Outcome::Rejected(Rejection::InvalidSpecialTask {
                    task_id: task_id.to_string(),
                }));
            }
        };

        let lock = self.user_lock(member_id);
        let _guard = lock.lock().await;

        self.ledger.upsert_user(member_id, display_name).await?;
        let award = self
            .commit_award(member_id, display_name, &task, comment)
            .await?;
        Ok(Outcome::Accepted(award))
    }

    /// Reaction-triggered special award, deduplicated per (message, emoji).
    ///
    /// Returns `Ok(None)` when the event is silently ignored: the reactor
    /// lacks the role-management capability, the emoji maps to no special
    /// task, or the (message, emoji) pair was already claimed. The claim
    /// commits before the award; if the award then fails, the claim stays,
    /// so later duplicates of the pair still no-op instead of retrying.
    #[instrument(skip(self, event), fields(message_id = %event.message_id, emoji = %event.emoji))]
    pub async fn award_from_reaction(
        &self,
        event: &ReactionEvent,
    ) -> Result<Option<Outcome>, EngineError> {
        if !event.reactor_can_manage_roles {
            debug!(reactor_id = %event.reactor_id, "ignored: reactor lacks role-management capability");
            return Ok(None);
        }

        let Some(task_id) = reaction::special_task_for(&event.emoji) else {
            debug!("ignored: emoji has no award mapping");
            return Ok(None);
        };

        match self
            .ledger
            .claim_award(&event.message_id, &event.emoji)
            .await?
        {
            ClaimOutcome::AlreadyClaimed => {
                debug!("ignored: duplicate trigger delivery");
                Ok(None)
            }
            ClaimOutcome::Claimed => {
                let comment = reaction::comment_preview(&event.message_text);
                let outcome = self
                    .award_special(
                        &event.author_id,
                        &event.author_name,
                        task_id,
                        comment.as_deref(),
                    )
                    .await?;
                Ok(Some(outcome))
            }
        }
    }

    /// Member profile: balance, tier, and completion history.
    pub async fn profile(&self, member_id: &str) -> Result<Option<Profile>, EngineError> {
        let Some(user) = self.ledger.get_user(member_id).await? else {
            return Ok(None);
        };
        let completed_task_ids = self.ledger.completed_task_ids(member_id).await?;
        Ok(Some(Profile {
            tier: RoleTier::for_xp(user.total_xp),
            member_id: user.member_id,
            display_name: user.display_name,
            total_xp: user.total_xp,
            completed_task_ids,
        }))
    }

    /// All members ordered by total XP descending, with resolved tiers.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let users = self.ledger.leaderboard().await?;
        Ok(users
            .into_iter()
            .map(|user| LeaderboardEntry {
                tier: RoleTier::for_xp(user.total_xp),
                member_id: user.member_id,
                display_name: user.display_name,
                total_xp: user.total_xp,
            })
            .collect())
    }

    /// Check that the ledger store is reachable.
    pub async fn health_check(&self) -> Result<bool, EngineError> {
        self.ledger.health_check().await
    }

    async fn commit_award(
        &self,
        member_id: &str,
        display_name: &str,
        task: &Task,
        comment: Option<&str>,
    ) -> Result<Award, EngineError> {
        let xp = i64::from(task.xp);
        let total_xp = self
            .ledger
            .record_completion(member_id, &task.id, xp, comment)
            .await?;
        let tier = RoleTier::for_xp(total_xp);

        info!(
            xp_earned = xp,
            total_xp,
            tier = tier.rank(),
            "completion recorded"
        );

        Ok(Award {
            member_id: member_id.to_string(),
            display_name: display_name.to_string(),
            task: task.clone(),
            xp_earned: xp,
            total_xp,
            tier,
            comment: comment.map(str::to_string),
        })
    }
}
