//! Tickworld - headless world server
//!
//! Usage: `rpg_server [world.ron]`
//!
//! Emitted world events are written to stdout as JSON lines.

use std::path::PathBuf;

use rpg_core::store::EntityStorage;
use rpg_core::world::WorldManager;
use rpg_server::{spawn_world_actor, ServerConfig, TokioClock};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Tickworld server");

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => match ServerConfig::with_world_file(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded world config");
                config
            }
            Err(e) => {
                tracing::error!(error = %e, "Invalid world config");
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    let mut world = WorldManager::new(
        config.world.clone(),
        EntityStorage::new(),
        TokioClock::from_system_time(),
    );
    if let Err(e) = world.initialize() {
        tracing::error!(error = %e, "World failed to start");
        std::process::exit(1);
    }

    let (handle, task) = spawn_world_actor(world, &config);

    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "Could not encode event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
    }
    tracing::info!("Shutdown requested");

    if let Err(e) = handle.shutdown().await {
        tracing::warn!(error = %e, "World task already gone");
    }
    drop(handle);

    match task.await {
        Ok(world) => tracing::info!(status = ?world.status(), "World stopped"),
        Err(e) => tracing::error!(error = %e, "World task panicked"),
    }
    let _ = printer.await;
}
