// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Immutable task catalog.
//!
//! The catalog is constructed once at process start, validated up front, and
//! shared by reference. Task records are fixed-shape: every field is checked
//! at load time so use sites never re-validate.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Category path a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPath {
    /// Introductory tasks every member starts with.
    Onboarding,
    /// Spreading the message.
    Outreach,
    /// Political engagement.
    Lobbying,
    /// Moderator-granted bonus contributions. Never self-service.
    Special,
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Onboarding => "onboarding",
            Self::Outreach => "outreach",
            Self::Lobbying => "lobbying",
            Self::Special => "special",
        };
        f.write_str(name)
    }
}

/// A catalog task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id, stable across catalog revisions.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category path.
    pub path: TaskPath,
    /// Difficulty level within the path. Level 0 has no prerequisites.
    pub level: u32,
    /// XP granted on completion. Snapshotted into the ledger at grant time.
    pub xp: u32,
    /// Whether the task may be completed more than once per member.
    pub repeatable: bool,
    /// Display icon key for the UI.
    pub icon: String,
}

/// Process-wide registry of task definitions.
///
/// Lookup is by id; [`TaskCatalog::tasks`] preserves insertion order. The
/// per-(path, level) grouping backing the prerequisite gates is precomputed
/// at construction.
#[derive(Debug)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
    by_id: HashMap<String, usize>,
    by_path_level: HashMap<(TaskPath, u32), HashSet<String>>,
}

impl TaskCatalog {
    /// Build a catalog from task definitions, validating each one.
    ///
    /// Rejects duplicate ids and zero-XP tasks.
    pub fn new(tasks: Vec<Task>) -> Result<Self, EngineError> {
        let mut by_id = HashMap::with_capacity(tasks.len());
        let mut by_path_level: HashMap<(TaskPath, u32), HashSet<String>> = HashMap::new();

        for (idx, task) in tasks.iter().enumerate() {
            if task.xp == 0 {
                return Err(EngineError::CatalogInvalid {
                    task_id: task.id.clone(),
                    reason: "xp value must be positive",
                });
            }
            if by_id.insert(task.id.clone(), idx).is_some() {
                return Err(EngineError::CatalogInvalid {
                    task_id: task.id.clone(),
                    reason: "duplicate task id",
                });
            }
            by_path_level
                .entry((task.path, task.level))
                .or_default()
                .insert(task.id.clone());
        }

        Ok(Self {
            tasks,
            by_id,
            by_path_level,
        })
    }

    /// The built-in stock catalog.
    pub fn stock() -> Self {
        Self::new(stock_tasks()).expect("stock catalog definitions are valid")
    }

    /// Look up a task by id.
    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.by_id.get(task_id).map(|&idx| &self.tasks[idx])
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Task ids at a given (path, level), for prerequisite evaluation.
    ///
    /// Returns `None` when no tasks exist at that position.
    pub fn ids_at(&self, path: TaskPath, level: u32) -> Option<&HashSet<String>> {
        self.by_path_level.get(&(path, level))
    }
}

fn task(
    id: &str,
    name: &str,
    path: TaskPath,
    level: u32,
    xp: u32,
    repeatable: bool,
    icon: &str,
) -> Task {
    Task {
        id: id.to_string(),
        name: name.to_string(),
        path,
        level,
        xp,
        repeatable,
        icon: icon.to_string(),
    }
}

fn stock_tasks() -> Vec<Task> {
    use TaskPath::*;
    vec![
        // Onboarding
        task("on1", "Introduce yourself in the welcome channel", Onboarding, 0, 10, false, "player"),
        task("on2", "Read the onboarding document", Onboarding, 0, 15, false, "book"),
        task("on3", "Join a welcome call", Onboarding, 0, 20, false, "conversation"),
        // Outreach
        task("o1", "Share a campaign video with a friend", Outreach, 1, 10, true, "share"),
        task("o2", "Post about AI risk on social media", Outreach, 1, 15, true, "smartphone"),
        task("o3", "Explain AGI risk to someone in person", Outreach, 1, 20, true, "talk"),
        task("o4", "Bring a new member into the community", Outreach, 2, 50, false, "person-add"),
        task("o5", "Organize a local meetup", Outreach, 2, 80, false, "round-table"),
        task("o6", "Give a talk on AI safety", Outreach, 3, 120, false, "podium"),
        // Lobbying
        task("l1", "Sign a petition", Lobbying, 1, 10, false, "scroll-signed"),
        task("l2", "Write an email to a lawmaker", Lobbying, 1, 25, true, "envelope"),
        task("l3", "Attend the weekly meeting", Lobbying, 1, 15, true, "video-conference"),
        task("l4", "Attend a political event on AI", Lobbying, 2, 40, true, "capitol"),
        task("l5", "Meet a politician or staffer in person", Lobbying, 2, 100, false, "handshake"),
        task("l6", "Write an op-ed or letter to the editor", Lobbying, 3, 80, false, "newspaper"),
        // Special
        task("s1", "Small contribution", Special, 1, 30, true, "star"),
        task("s2", "Medium contribution", Special, 1, 75, true, "double-star"),
        task("s3", "Large contribution", Special, 1, 150, true, "triple-star"),
    ]
}
