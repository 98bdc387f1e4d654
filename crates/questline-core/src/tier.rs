// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Role tier resolution from accumulated XP.
//!
//! This is the single threshold table for the whole system. The API layer
//! and the chat gateway both resolve tiers through [`RoleTier::for_xp`];
//! there is deliberately no second copy to drift out of sync.

use serde::Serialize;

/// XP required to reach tier 2.
pub const TIER_2_XP: i64 = 150;

/// XP required to reach tier 3.
pub const TIER_3_XP: i64 = 400;

/// Coarse role classification derived purely from total XP.
///
/// Monotonic step function with no hysteresis: boundary values belong to the
/// higher tier (150 XP is tier 2, 400 XP is tier 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum RoleTier {
    /// Entry tier, below 150 XP.
    Tier1,
    /// Mid tier, 150 to 399 XP.
    Tier2,
    /// Top tier, 400 XP and above.
    Tier3,
}

impl RoleTier {
    /// Resolve the tier for an XP balance.
    pub fn for_xp(xp: i64) -> Self {
        if xp >= TIER_3_XP {
            Self::Tier3
        } else if xp >= TIER_2_XP {
            Self::Tier2
        } else {
            Self::Tier1
        }
    }

    /// Numeric rank, 1 through 3.
    pub fn rank(self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    /// Display name for announcements and role sync.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tier1 => "Concerned Citizen",
            Self::Tier2 => "Activist",
            Self::Tier3 => "Guardian of Humanity",
        }
    }
}

impl From<RoleTier> for u8 {
    fn from(tier: RoleTier) -> Self {
        tier.rank()
    }
}
