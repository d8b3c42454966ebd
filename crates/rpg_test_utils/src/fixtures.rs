//! Test fixtures and helpers.
//!
//! Pre-built worlds, entities and combatants for consistent testing.
//! Helpers panic on bad input; they are meant for tests only.

use fixed::types::I32F32;
use rpg_core::combat::{CombatBonuses, Combatant, CombatantStats, StyleBonuses};
use rpg_core::components::EntityId;
use rpg_core::config::WorldConfig;
use rpg_core::math::Vec3Fixed;
use rpg_core::store::EntityStorage;
use rpg_core::world::{ManualClock, SpawnRequest, WorldManager};

/// Milliseconds the fixture clock starts at.
pub const FIXTURE_START_MS: u64 = 1_700_000_000_000;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Integer position.
#[must_use]
pub fn vec3(x: i32, y: i32, z: i32) -> Vec3Fixed {
    Vec3Fixed::from_ints(x, y, z)
}

/// Entity id from a literal.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
pub fn entity_id(id: &str) -> EntityId {
    EntityId::new(id).expect("fixture ids are never blank")
}

/// An initialized world with default config and a manual clock.
///
/// # Panics
///
/// Panics if initialization fails, which the default services never do.
#[must_use]
pub fn ready_world() -> (WorldManager, ManualClock) {
    ready_world_with(WorldConfig::default())
}

/// An initialized world with `config` and a manual clock.
///
/// # Panics
///
/// Panics if initialization fails.
#[must_use]
pub fn ready_world_with(config: WorldConfig) -> (WorldManager, ManualClock) {
    let clock = ManualClock::new(FIXTURE_START_MS);
    let mut world = WorldManager::new(config, EntityStorage::new(), clock.clone());
    world.initialize().expect("fixture world initializes");
    (world, clock)
}

/// Place an NPC through the admin spawn path.
///
/// # Panics
///
/// Panics if the id is already taken.
pub fn spawn_npc(world: &mut WorldManager, id: &str, position: Vec3Fixed) -> EntityId {
    let id = entity_id(id);
    world
        .spawn_entity(SpawnRequest {
            kind: "npc".to_string(),
            id: id.clone(),
            position,
            metadata: None,
        })
        .expect("fixture ids are unique");
    id
}

/// Advance the clock by `ms` and run due tasks.
pub fn advance(world: &mut WorldManager, clock: &ManualClock, ms: u64) -> usize {
    clock.advance(ms);
    world.update()
}

/// A combatant with every combat skill at `level` and no gear.
#[must_use]
pub fn combatant(level: u8) -> Combatant {
    Combatant {
        stats: CombatantStats::uniform(level),
        ..Combatant::default()
    }
}

/// A combatant with every combat skill at `level` and flat gear bonuses.
#[must_use]
pub fn geared_combatant(level: u8, attack_bonus: i32, defense_bonus: i32) -> Combatant {
    let flat = |value| StyleBonuses {
        stab: value,
        slash: value,
        crush: value,
        ranged: value,
        magic: value,
    };
    Combatant {
        stats: CombatantStats::uniform(level),
        bonuses: CombatBonuses {
            attack: flat(attack_bonus),
            defense: flat(defense_bonus),
        },
        ..Combatant::default()
    }
}
