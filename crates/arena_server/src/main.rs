//! Mana Arena - Dedicated Server
//!
//! Usage: `arena-server [config.ron]`
//!
//! Hosts a bot-vs-bot exhibition room, logs the result and exits.

use std::process::ExitCode;

use arena_server::lobby::Lobby;
use arena_server::session::SessionEvent;
use arena_server::ServerConfig;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Mana Arena Dedicated Server");

    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| ServerConfig::from_ron_str(&text).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    let catalog = match config.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(cards = catalog.len(), tick_rate = config.tick_rate, "Catalog loaded");

    let mut lobby = Lobby::new(catalog, config);
    let room = match lobby.create_room(2) {
        Ok(room) => room,
        Err(e) => {
            tracing::error!("Failed to create exhibition room: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut events = match lobby.subscribe(room) {
        Ok(events) => events,
        Err(e) => {
            tracing::error!("Failed to follow room {room}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut last_tick = 0;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::Snapshot(snapshot)) => last_tick = snapshot.tick,
                Ok(SessionEvent::GameOver(event)) => {
                    tracing::info!(winner = ?event.winner, ticks = last_tick, "Exhibition finished");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Snapshot subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    lobby.close_all().await;
    ExitCode::SUCCESS
}
