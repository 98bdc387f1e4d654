// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;

/// Questline server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL or SQLite connection URL
    pub database_url: String,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Discord notifier settings; None disables announcements and role sync
    pub discord: Option<DiscordConfig>,
}

/// Discord notifier configuration
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Bot token used for REST calls
    pub bot_token: String,
    /// Channel that receives completion announcements
    pub announce_channel_id: String,
    /// Guild whose member roles are synced
    pub guild_id: String,
    /// Role ids for tiers 1 through 3
    pub tier_role_ids: [String; 3],
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `QUESTLINE_DATABASE_URL`: PostgreSQL or SQLite connection string
    ///
    /// Optional (with defaults):
    /// - `QUESTLINE_HTTP_PORT`: HTTP listen port (default: 8000)
    ///
    /// Optional Discord group, enabled by `QUESTLINE_DISCORD_TOKEN`; when the
    /// token is set the rest of the group is required:
    /// - `QUESTLINE_ANNOUNCE_CHANNEL_ID`
    /// - `QUESTLINE_GUILD_ID`
    /// - `QUESTLINE_TIER_ROLE_1` / `_2` / `_3`
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("QUESTLINE_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("QUESTLINE_DATABASE_URL"))?;

        let http_port: u16 = std::env::var("QUESTLINE_HTTP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("QUESTLINE_HTTP_PORT", "must be a valid port number")
            })?;

        let discord = match std::env::var("QUESTLINE_DISCORD_TOKEN") {
            Ok(bot_token) => Some(DiscordConfig {
                bot_token,
                announce_channel_id: require("QUESTLINE_ANNOUNCE_CHANNEL_ID")?,
                guild_id: require("QUESTLINE_GUILD_ID")?,
                tier_role_ids: [
                    require("QUESTLINE_TIER_ROLE_1")?,
                    require("QUESTLINE_TIER_ROLE_2")?,
                    require("QUESTLINE_TIER_ROLE_3")?,
                ],
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            discord,
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
