//! World configuration.
//!
//! Configuration is plain data deserialized from RON. This module does no
//! IO; hosts read the file and hand the text to [`WorldConfig::from_ron_str`].
//!
//! # Example RON
//!
//! ```ron
//! WorldConfig(
//!     tick_rate: 20,
//!     autosave_interval_ms: 300000,
//!     min_save_interval_ms: 30000,
//!     default_spawn: (x: 3222, y: 0, z: 3218),
//! )
//! ```
//!
//! Omitted fields take their defaults. Fixed-point navigation values are
//! written as raw bits (`4294967296` is `1.0`).

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec3Fixed};
use crate::navigation::NavigationConfig;

/// Default simulation ticks per second.
pub const TICK_RATE: u32 = 20;

/// Default world-time tick interval (1 second).
pub const WORLD_TIME_INTERVAL_MS: u64 = 1_000;

/// Default autosave interval (5 minutes).
pub const AUTOSAVE_INTERVAL_MS: u64 = 5 * 60 * 1_000;

/// Minimum spacing between two saves, whatever triggered them (30 seconds).
pub const MIN_SAVE_INTERVAL_MS: u64 = 30 * 1_000;

/// Default cleanup sweep interval (60 seconds).
pub const CLEANUP_INTERVAL_MS: u64 = 60 * 1_000;

/// Whole-unit spawn coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (height).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl SpawnPoint {
    /// Position in simulation space.
    #[must_use]
    pub fn to_vec3(self) -> Vec3Fixed {
        Vec3Fixed::from_ints(self.x, self.y, self.z)
    }
}

/// Tunables for a world instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Navigation ticks per second.
    pub tick_rate: u32,
    /// Interval of the world-time counter.
    pub world_time_interval_ms: u64,
    /// Interval between scheduled autosaves.
    pub autosave_interval_ms: u64,
    /// Minimum spacing between two saves.
    pub min_save_interval_ms: u64,
    /// Interval between cleanup sweeps.
    pub cleanup_interval_ms: u64,
    /// Run first-time world generation when the store starts empty.
    pub generate_world_on_start: bool,
    /// Where players without a saved position appear.
    pub default_spawn: SpawnPoint,
    /// Path-following tunables.
    pub navigation: NavigationConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            world_time_interval_ms: WORLD_TIME_INTERVAL_MS,
            autosave_interval_ms: AUTOSAVE_INTERVAL_MS,
            min_save_interval_ms: MIN_SAVE_INTERVAL_MS,
            cleanup_interval_ms: CLEANUP_INTERVAL_MS,
            generate_world_on_start: true,
            default_spawn: SpawnPoint {
                x: 3222,
                y: 0,
                z: 3218,
            },
            navigation: NavigationConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parse and validate a RON document. `source_name` labels errors.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidConfig(e.to_string()))
    }

    /// Reject values the scheduler or navigation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 || self.tick_rate > 1_000 {
            return Err(GameError::InvalidConfig(format!(
                "tick_rate must be between 1 and 1000, got {}",
                self.tick_rate
            )));
        }

        let intervals = [
            ("world_time_interval_ms", self.world_time_interval_ms),
            ("autosave_interval_ms", self.autosave_interval_ms),
            ("cleanup_interval_ms", self.cleanup_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(GameError::InvalidConfig(format!("{name} must be positive")));
            }
        }

        if self.navigation.default_speed <= Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "navigation.default_speed must be positive".to_string(),
            ));
        }
        if self.navigation.arrival_threshold < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "navigation.arrival_threshold must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Duration of one navigation tick in milliseconds.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u32 {
        1_000 / self.tick_rate.max(1)
    }
}
