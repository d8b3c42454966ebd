//! # RPG Core
//!
//! Deterministic simulation core for the Tickworld server.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (time arrives through an injected [`world::Clock`])
//! - No randomness (hit chances are probabilities, not rolls)
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`navigation`] - Waypoint path following
//! - [`combat`] - Accuracy and defence rolls, hit chance
//! - [`skills`] - Experience table, levels and combat level
//! - [`world`] - World lifecycle, sessions, saves and regions
//! - [`store`] - Entity storage seam
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod math;
pub mod navigation;
pub mod skills;
pub mod store;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{
        hit_chance, hit_chance_between, ActivePrayers, AttackType, CombatBonuses, CombatStyle,
        Combatant, CombatantStats, StyleBonuses,
    };
    pub use crate::components::{Entity, EntityId, RenderNode};
    pub use crate::config::WorldConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::navigation::{ArrivalCallback, NavigationSystem};
    pub use crate::skills::{combat_level, level_for_xp, xp_for_level, Skill, SkillSet, SkillState};
    pub use crate::store::{EntityStorage, EntityStore};
    pub use crate::world::{
        Clock, InboundEvent, ManualClock, SaveOutcome, SystemClock, WorldEvent, WorldManager,
        WorldPhase, WorldServices, WorldStatus,
    };
}
