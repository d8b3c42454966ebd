//! # RPG World Server
//!
//! Headless host for a single world.
//!
//! The [`WorldManager`](rpg_core::world::WorldManager) lives on one tokio
//! task. Timers and inbound commands are producers into that task's
//! `select!` loop, so world state has exactly one writer. Emitted events are
//! fanned out to subscribers over a broadcast channel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actor;
pub mod clock;

use std::path::Path;

use rpg_core::config::WorldConfig;
use rpg_core::error::GameError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use actor::{spawn_world_actor, WorldCommand, WorldHandle};
pub use clock::TokioClock;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Queued commands before senders wait.
    pub command_buffer: usize,
    /// Events retained for slow subscribers before they lag.
    pub event_buffer: usize,
    /// World tunables.
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
            event_buffer: 1024,
            world: WorldConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Default server settings around a world config read from `path`.
    pub fn with_world_file(path: &Path) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let world = WorldConfig::from_ron_str(&path.display().to_string(), &text)?;
        Ok(Self {
            world,
            ..Self::default()
        })
    }
}

/// Errors surfaced to callers of the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The world task has exited.
    #[error("world actor has stopped")]
    ActorStopped,

    /// The world rejected a request.
    #[error(transparent)]
    World(#[from] GameError),

    /// A config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
