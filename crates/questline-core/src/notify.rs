// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Post-commit notification and role-sync capability interface.
//!
//! Accepted awards carry everything an announcer and a role synchronizer
//! need; implementations of [`Notifier`] deliver them to the outside world.
//! The engine itself never talks to a messaging platform: callers invoke the
//! notifier after the ledger commit, fire-and-forget. A notifier failure is
//! logged by the implementation and never unwinds the commit.

use async_trait::async_trait;

use crate::progression::Award;
use crate::tier::RoleTier;

/// Capability interface for announcing awards and syncing tier roles.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce an accepted award.
    async fn announce(&self, award: &Award);

    /// Reassign the member's tier role to match the resolved tier.
    async fn sync_tier(&self, member_id: &str, tier: RoleTier);
}

/// Notifier that does nothing. Used in tests and embedded setups.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn announce(&self, _award: &Award) {}

    async fn sync_tier(&self, _member_id: &str, _tier: RoleTier) {}
}
