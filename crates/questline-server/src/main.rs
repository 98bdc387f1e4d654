// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Questline Server - HTTP API over the progression engine.
//!
//! Wires together:
//! - Durable ledger (SQLite or PostgreSQL, selected by URL scheme)
//! - Progression engine over the stock task catalog
//! - Discord notifier (when configured)
//! - axum HTTP API

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use questline_core::catalog::TaskCatalog;
use questline_core::ledger;
use questline_core::notify::{NoopNotifier, Notifier};
use questline_core::progression::ProgressionEngine;
use questline_server::config::Config;
use questline_server::discord::DiscordNotifier;
use questline_server::routes::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("questline_core=info".parse().unwrap())
                .add_directive("questline_server=info".parse().unwrap()),
        )
        .init();

    info!("Starting Questline Server");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_addr = %config.http_addr,
        notifier = if config.discord.is_some() { "discord" } else { "disabled" },
        "Configuration loaded"
    );

    // Connect to the ledger store and run migrations
    info!("Connecting to the progression store...");
    let ledger = ledger::connect(&config.database_url).await?;
    info!("Store connection established, migrations applied");

    // Catalog is loaded once and shared; the engine owns all business rules
    let catalog = Arc::new(TaskCatalog::stock());
    info!(tasks = catalog.tasks().len(), "Task catalog loaded");
    let engine = ProgressionEngine::new(catalog, ledger);

    let notifier: Arc<dyn Notifier> = match config.discord {
        Some(discord_config) => Arc::new(DiscordNotifier::new(discord_config)),
        None => Arc::new(NoopNotifier),
    };

    let state = Arc::new(AppState { engine, notifier });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "Questline Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    }
    info!("Shutting down...");
}
