//! Error types for the world simulation.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Entity identifiers must be non-blank.
    #[error("Invalid entity ID: {0:?}")]
    InvalidEntityId(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with this ID is already registered.
    #[error("Entity already exists: {0}")]
    DuplicateEntity(EntityId),

    /// A coordinate could not be represented in simulation space.
    #[error("Invalid position ({x}, {y}, {z}): {reason}")]
    InvalidPosition {
        /// Raw x coordinate.
        x: f64,
        /// Raw y coordinate.
        y: f64,
        /// Raw z coordinate.
        z: f64,
        /// Why the coordinate was rejected.
        reason: &'static str,
    },

    /// The world has not finished initializing, or is shutting down.
    #[error("World is not ready (phase: {0})")]
    NotReady(&'static str),

    /// First-time world generation failed.
    #[error("World generation failed: {0}")]
    WorldGeneration(String),

    /// A periodic maintenance task failed.
    #[error("Maintenance task '{task}' failed: {message}")]
    Maintenance {
        /// Task that failed.
        task: &'static str,
        /// Error message.
        message: String,
    },

    /// Combat was requested inside a safe zone.
    #[error("Combat is not allowed in safe zone '{region}'")]
    CombatInSafeZone {
        /// Name of the safe region.
        region: &'static str,
    },

    /// Configuration parsing error.
    #[error("Failed to parse config '{source_name}': {message}")]
    ConfigParse {
        /// Name of the config source (file path or label).
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Configuration parsed but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
