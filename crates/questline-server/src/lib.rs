// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Questline Server - HTTP API over the progression engine.
//!
//! Exposes the task catalog, self-service completions, moderator awards,
//! the leaderboard, and the chat-gateway reaction callback. Member identity
//! arrives from the trusted gateway as request headers; session issuance
//! itself lives upstream. Announcements and tier-role sync go out through
//! the Discord notifier after the ledger commit, fire-and-forget.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/tasks` | Full task catalog, no auth |
//! | GET | `/api/me` | Profile of the authenticated member |
//! | POST | `/api/complete-task` | Self-service completion |
//! | POST | `/api/award` | Moderator grant of a special task |
//! | POST | `/api/events/reaction` | Gateway reaction trigger callback |
//! | GET | `/api/leaderboard` | Members by XP descending |
//! | GET | `/api/health` | Store reachability |

/// Server configuration from environment variables.
pub mod config;

/// Discord notifier: completion announcements and tier-role sync.
pub mod discord;

/// API routes and request handlers.
pub mod routes;
