//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a world produces identical
//! results given identical inputs.
//!
//! # Sources of non-determinism
//!
//! - **Floating-point math**: positions and hit chances use
//!   [`rpg_core::math::Fixed`] throughout.
//! - **HashMap iteration order**: paths, sessions and entities live in
//!   ordered maps and are processed in id order.
//! - **Wall-clock time**: worlds under test run on a
//!   [`ManualClock`](rpg_core::world::ManualClock) that only moves when the
//!   test advances it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use rpg_core::world::{ManualClock, WorldManager};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic world).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "World is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// A world paired with the clock that drives it.
pub type ClockedWorld = (WorldManager, ManualClock);

/// Run a scenario multiple times and verify determinism.
///
/// # Example
///
/// ```
/// use rpg_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Advance a clocked world by `step_ms` and run its due tasks.
pub fn step_world(world: &mut ClockedWorld, step_ms: u64) {
    world.1.advance(step_ms);
    world.0.update();
}

/// Run a world scenario twice and compare final state hashes.
pub fn verify_world_determinism<F>(setup_fn: F, steps: u64, step_ms: u64) -> bool
where
    F: Fn() -> ClockedWorld,
{
    verify_determinism(
        2,
        steps,
        &setup_fn,
        |world| step_world(world, step_ms),
        |world| world.0.state_hash(),
    )
    .is_deterministic
}

/// Result of parallel world runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each world.
    pub hashes: Vec<u64>,
    /// Number of steps each world ran.
    pub steps: u64,
    /// Number of worlds run.
    pub num_worlds: usize,
}

impl ParallelRunResult {
    /// Check if all worlds produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all worlds matched.
    ///
    /// # Panics
    ///
    /// Panics if worlds produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            panic!(
                "Parallel worlds diverged!\n\
                 Worlds: {}\n\
                 Steps: {}\n\
                 All hashes: {:?}",
                self.num_worlds, self.steps, self.hashes
            );
        }
    }
}

/// Run N worlds on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_worlds<F>(
    setup_fn: F,
    num_worlds: usize,
    steps: u64,
    step_ms: u64,
) -> ParallelRunResult
where
    F: Fn() -> ClockedWorld + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_worlds)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..steps {
                        step_world(&mut world, step_ms);
                    }
                    world.0.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("world thread panicked"))
            .collect()
    });

    ParallelRunResult {
        hashes,
        steps,
        num_worlds,
    }
}

/// Step two copies of a world in lockstep, returning the first step at which
/// their hashes differ.
///
/// `None` means the runs stayed identical for all `steps`.
pub fn find_first_divergence<F>(setup_fn: F, steps: u64, step_ms: u64) -> Option<u64>
where
    F: Fn() -> ClockedWorld,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.0.state_hash() != b.0.state_hash() {
        return Some(0);
    }

    for step in 1..=steps {
        step_world(&mut a, step_ms);
        step_world(&mut b, step_ms);

        if a.0.state_hash() != b.0.state_hash() {
            tracing::warn!(step, "Worlds diverged");
            return Some(step);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for world and combat inputs.
pub mod strategies {
    use proptest::prelude::*;
    use rpg_core::combat::{
        ActivePrayers, AttackType, CombatBonuses, CombatStyle, Combatant, CombatantStats,
        StyleBonuses,
    };
    use rpg_core::math::{Fixed, Vec3Fixed};
    use rpg_core::skills::{SkillState, MAX_LEVEL, MAX_XP};

    /// Fixed-point coordinate within a typical map.
    ///
    /// Range: -5000 to 5000
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-5000i32..5000i32).prop_map(Fixed::from_num)
    }

    /// Fixed-point 3D position.
    pub fn arb_position() -> impl Strategy<Value = Vec3Fixed> {
        (arb_coordinate(), arb_coordinate(), arb_coordinate())
            .prop_map(|(x, y, z)| Vec3Fixed::new(x, y, z))
    }

    /// Movement speed in units per second.
    ///
    /// Range: 1 to 20
    pub fn arb_speed() -> impl Strategy<Value = Fixed> {
        (1i32..20i32).prop_map(Fixed::from_num)
    }

    /// Any skill level.
    pub fn arb_level() -> impl Strategy<Value = u8> {
        1u8..=MAX_LEVEL
    }

    /// Any legal experience total.
    pub fn arb_xp() -> impl Strategy<Value = u32> {
        0u32..=MAX_XP
    }

    /// Any attack type.
    pub fn arb_attack_type() -> impl Strategy<Value = AttackType> {
        prop_oneof![
            Just(AttackType::Melee),
            Just(AttackType::Ranged),
            Just(AttackType::Magic),
        ]
    }

    /// Any combat style.
    pub fn arb_style() -> impl Strategy<Value = CombatStyle> {
        prop_oneof![
            Just(CombatStyle::Accurate),
            Just(CombatStyle::Aggressive),
            Just(CombatStyle::Defensive),
            Just(CombatStyle::Controlled),
            Just(CombatStyle::Longrange),
        ]
    }

    /// Combat stats with independent levels.
    pub fn arb_stats() -> impl Strategy<Value = CombatantStats> {
        proptest::array::uniform7(1u8..=MAX_LEVEL).prop_map(|levels| {
            let [attack, strength, defense, hitpoints, prayer, ranged, magic] =
                levels.map(SkillState::at_level);
            CombatantStats {
                attack,
                strength,
                defense,
                hitpoints,
                prayer,
                ranged,
                magic,
            }
        })
    }

    /// Equipment bonuses in the range real gear produces.
    ///
    /// Range: -64 to 200 per field, so rolls stay non-negative.
    pub fn arb_style_bonuses() -> impl Strategy<Value = StyleBonuses> {
        proptest::array::uniform5(-64i32..200i32).prop_map(|[stab, slash, crush, ranged, magic]| {
            StyleBonuses {
                stab,
                slash,
                crush,
                ranged,
                magic,
            }
        })
    }

    /// Any prayer combination.
    pub fn arb_prayers() -> impl Strategy<Value = ActivePrayers> {
        proptest::array::uniform7(any::<bool>()).prop_map(
            |[piety, rigour, augury, chivalry, steel_skin, rock_skin, thick_skin]| ActivePrayers {
                piety,
                rigour,
                augury,
                chivalry,
                steel_skin,
                rock_skin,
                thick_skin,
            },
        )
    }

    /// A full combatant.
    pub fn arb_combatant() -> impl Strategy<Value = Combatant> {
        (
            arb_stats(),
            arb_style_bonuses(),
            arb_style_bonuses(),
            arb_prayers(),
            arb_style(),
        )
            .prop_map(|(stats, attack, defense, prayers, style)| Combatant {
                stats,
                bonuses: CombatBonuses { attack, defense },
                prayers,
                style,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ready_world, spawn_npc, vec3};
    use rpg_core::math::Fixed;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_nondeterminism() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let counter = AtomicU64::new(0);
        let result = verify_determinism(
            3,
            1,
            || counter.fetch_add(1, Ordering::SeqCst),
            |_| {},
            |n| *n,
        );

        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    fn moving_world() -> ClockedWorld {
        let (mut world, clock) = ready_world();
        for i in 0..10 {
            let id = spawn_npc(&mut world, &format!("npc_{i}"), vec3(i, 0, 0));
            world.navigate_to(&id, vec3(100 - i, 0, i * 3), Some(Fixed::from_num(3)), None);
        }
        (world, clock)
    }

    #[test]
    fn test_moving_world_is_deterministic() {
        assert!(verify_world_determinism(moving_world, 200, 50));
    }

    #[test]
    fn test_parallel_worlds_match() {
        run_parallel_worlds(moving_world, 4, 200, 50).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(moving_world, 100, 50), None);
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&"goblin"), compute_hash(&"goblin"));
        assert_ne!(compute_hash(&1u8), compute_hash(&2u8));
    }
}
