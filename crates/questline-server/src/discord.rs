// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Discord notifier: completion announcements and tier-role sync.
//!
//! Both operations run after the ledger commit as fire-and-forget side
//! effects. Every failure is logged and swallowed here; a missed
//! announcement never unwinds a committed completion.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use questline_core::notify::Notifier;
use questline_core::progression::Award;
use questline_core::tier::RoleTier;

use crate::config::DiscordConfig;

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Notifier backed by the Discord REST API.
pub struct DiscordNotifier {
    http: reqwest::Client,
    config: DiscordConfig,
}

impl DiscordNotifier {
    /// Create a notifier from Discord configuration.
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.config.bot_token)
    }

    async fn set_role(&self, member_id: &str, role_id: &str, grant: bool) {
        let url = format!(
            "{}/guilds/{}/members/{}/roles/{}",
            DISCORD_API, self.config.guild_id, member_id, role_id
        );
        let request = if grant {
            self.http.put(&url)
        } else {
            self.http.delete(&url)
        };
        match request
            .header("Authorization", self.auth_header())
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    member_id,
                    role_id,
                    grant,
                    status = %response.status(),
                    "role update refused"
                );
            }
            Ok(_) => {}
            Err(err) => {
                warn!(member_id, role_id, grant, error = %err, "role update failed");
            }
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn announce(&self, award: &Award) {
        let mut fields = vec![
            json!({ "name": "Member", "value": format!("<@{}>", award.member_id), "inline": true }),
            json!({ "name": "XP", "value": format!("+{}", award.xp_earned), "inline": true }),
            json!({ "name": "Total", "value": format!("{} XP", award.total_xp), "inline": true }),
            json!({ "name": "Task", "value": award.task.name.as_str(), "inline": false }),
        ];
        if let Some(comment) = &award.comment {
            fields.push(json!({ "name": "Comment", "value": comment.as_str(), "inline": false }));
        }

        let body = json!({
            "embeds": [{
                "title": "✅ Task completed!",
                "color": 0x4caf50,
                "fields": fields,
            }]
        });

        let url = format!(
            "{}/channels/{}/messages",
            DISCORD_API, self.config.announce_channel_id
        );
        match self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "announcement refused");
            }
            Ok(_) => {
                debug!(member_id = %award.member_id, task_id = %award.task.id, "announcement sent");
            }
            Err(err) => {
                warn!(error = %err, "announcement failed");
            }
        }
    }

    async fn sync_tier(&self, member_id: &str, tier: RoleTier) {
        // Strip the other tier roles, then grant the resolved one.
        for (idx, role_id) in self.config.tier_role_ids.iter().enumerate() {
            let is_target = idx + 1 == usize::from(tier.rank());
            self.set_role(member_id, role_id, is_target).await;
        }
    }
}
