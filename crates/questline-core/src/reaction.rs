// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reaction trigger events and the emoji award table.
//!
//! A moderator reacting to a member's message with one of three star emojis
//! grants the matching special task to the message author. The emoji symbol
//! doubles as the award kind in the idempotency guard, so the same message
//! can receive each award tier once.

use serde::{Deserialize, Serialize};

/// Reaction award comments keep at most this many characters of the source
/// message text.
pub const COMMENT_PREVIEW_CHARS: usize = 100;

/// An external reaction event delivered by the chat gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Id of the message that was reacted to.
    pub message_id: String,
    /// Member who added the reaction.
    pub reactor_id: String,
    /// Whether the reactor holds the role-management capability.
    pub reactor_can_manage_roles: bool,
    /// Author of the message; the member who receives the award.
    pub author_id: String,
    /// Author display name, last seen by the gateway.
    pub author_name: String,
    /// The reaction emoji symbol.
    pub emoji: String,
    /// Text of the message, used as the award comment.
    pub message_text: String,
}

/// Map an emoji symbol to its special task id.
///
/// Three tiers: small, medium, and large contribution.
pub fn special_task_for(emoji: &str) -> Option<&'static str> {
    match emoji {
        "\u{2b50}" => Some("s1"),         // ⭐ 30 XP
        "\u{1f31f}" => Some("s2"),        // 🌟 75 XP
        "\u{1f4ab}" => Some("s3"),        // 💫 150 XP
        _ => None,
    }
}

/// Truncate message text into an award comment.
///
/// Keeps the first [`COMMENT_PREVIEW_CHARS`] characters and appends an
/// ellipsis when the text was longer. Empty text yields no comment.
pub fn comment_preview(message_text: &str) -> Option<String> {
    if message_text.is_empty() {
        return None;
    }
    let mut preview: String = message_text.chars().take(COMMENT_PREVIEW_CHARS).collect();
    if message_text.chars().count() > COMMENT_PREVIEW_CHARS {
        preview.push_str("...");
    }
    Some(preview)
}
