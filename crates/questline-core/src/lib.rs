// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Questline Core - Task Progression & Award Ledger Engine
//!
//! This crate implements the progression rules for a gamified community:
//! members earn experience points (XP) for completing catalog tasks, unlock
//! role tiers at fixed XP thresholds, and moderators grant bonus XP by
//! command or emoji reaction. All completions land in a durable append-only
//! ledger; reaction-triggered grants are deduplicated so a single chat
//! message is honored at most once per award kind.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     External Callers                            │
//! │        (questline-server HTTP API, chat gateway events)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     ProgressionEngine                           │
//! │        validation gates · per-user serialization · tiers        │
//! └─────────────────────────────────────────────────────────────────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌──────────────┐   ┌───────────────────┐   ┌────────────────────┐
//! │ TaskCatalog  │   │      Ledger       │   │  Notifier (trait)  │
//! │ (immutable)  │   │ SQLite / Postgres │   │ announce/sync_tier │
//! └──────────────┘   └───────────────────┘   └────────────────────┘
//! ```
//!
//! # Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `complete_task` | Self-service completion, runs all validation gates |
//! | `award_special` | Moderator/trigger grant of a special-category task |
//! | `award_from_reaction` | Emoji-triggered grant, exactly-once per (message, emoji) |
//! | `profile` | Member balance, tier, and completed task ids |
//! | `leaderboard` | All members ordered by total XP descending |
//!
//! # Validation sequence
//!
//! `complete_task` short-circuits on the first failing gate:
//!
//! 1. Task must exist in the catalog.
//! 2. Special-category tasks are never self-service.
//! 3. Non-repeatable tasks reject a second completion.
//! 4. Outreach/lobbying tasks at level >= 1 require 2 distinct completed
//!    onboarding tasks.
//! 5. Tasks above level 1 require N distinct completed same-path tasks at
//!    the preceding level (N = 3 entering level 2, N = 2 above).
//!
//! Gate failures are [`progression::Rejection`] values, not errors: they are
//! expected, frequent outcomes returned to the caller. Only store failures
//! surface as [`error::EngineError`].
//!
//! # Consistency
//!
//! Validation and ledger write for one member run under that member's lock,
//! so each member's completions are linearizable even under concurrent
//! callers. The ledger write itself (completion row + balance update) is a
//! single transaction, keeping `total_xp` equal to the sum of the member's
//! completion records at all times. Reaction claims are linearizable per
//! (message, kind) pair through a uniqueness-constrained insert.
//!
//! # Modules
//!
//! - [`catalog`]: Immutable task registry loaded once at startup
//! - [`tier`]: XP to role tier resolution (single shared threshold table)
//! - [`ledger`]: Durable completion ledger and award idempotency guard
//! - [`progression`]: The engine - validation gates and atomic awards
//! - [`reaction`]: Reaction trigger events and the emoji award table
//! - [`notify`]: Post-commit notification/role-sync capability interface
//! - [`error`]: Store and catalog error types

#![deny(missing_docs)]

/// Immutable task catalog: definitions, lookup, and path/level grouping.
pub mod catalog;

/// Store and catalog-load error types.
pub mod error;

/// Durable completion ledger and award idempotency guard (SQLite/Postgres).
pub mod ledger;

/// Post-commit notification and role-sync capability interface.
pub mod notify;

/// The progression engine: validation gates, atomic awards, leaderboard.
pub mod progression;

/// Reaction trigger events and the emoji to special-task award table.
pub mod reaction;

/// Role tier resolution from accumulated XP.
pub mod tier;
