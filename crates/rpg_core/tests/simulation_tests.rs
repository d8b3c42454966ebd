//! End-to-end checks of the simulation core.
//!
//! These drive navigation, combat, skills and the world manager through
//! their public APIs, using shared fixtures from `rpg_test_utils`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rpg_core::combat::{hit_chance, hit_chance_between, AttackType};
use rpg_core::components::Entity;
use rpg_core::config::WorldConfig;
use rpg_core::math::Fixed;
use rpg_core::navigation::{ArrivalCallback, NavigationSystem};
use rpg_core::skills::{
    combat_level, level_for_xp, xp_for_level, xp_to_next_level, CombatLevels, MAX_LEVEL,
};
use rpg_core::store::{EntityStorage, EntityStore};
use rpg_core::world::{is_in_safe_zone, InboundEvent, WorldEvent};
use rpg_test_utils::determinism::strategies::{
    arb_attack_type, arb_combatant, arb_position, arb_speed, arb_xp,
};
use rpg_test_utils::determinism::{find_first_divergence, run_parallel_worlds, ClockedWorld};
use rpg_test_utils::fixtures::{
    advance, combatant, entity_id, fixed, fixed_f, ready_world, ready_world_with, spawn_npc, vec3,
};
use rpg_test_utils::proptest::prelude::*;

// =============================================================================
// Helpers
// =============================================================================

fn counting_callback() -> (Arc<AtomicUsize>, ArrivalCallback) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    (
        count,
        Box::new(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

fn count_saves(events: &[WorldEvent]) -> usize {
    events
        .iter()
        .filter(|e| e.event_name() == "world:save")
        .count()
}

// =============================================================================
// Skills
// =============================================================================

#[test]
fn test_every_level_round_trips() {
    for level in 1..=MAX_LEVEL {
        assert_eq!(level_for_xp(xp_for_level(level)), level, "level {level}");
    }
}

#[test]
fn test_minimum_combat_level_is_three() {
    let levels = CombatLevels {
        attack: 1,
        strength: 1,
        defence: 1,
        hitpoints: 10,
        ranged: 1,
        magic: 1,
        prayer: 1,
    };
    assert_eq!(combat_level(levels), 3);
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn test_equal_rolls_are_just_under_even() {
    for roll in [0, 1, 64, 576, 10_000, 1_000_000] {
        let chance = hit_chance(roll, roll);
        assert!(chance < fixed_f(0.5), "roll {roll}");
        if roll >= 10_000 {
            assert!(fixed_f(0.5) - chance < fixed_f(0.001));
        }
    }
}

#[test]
fn test_stronger_attacker_beats_coin_flip() {
    let chance = hit_chance_between(&combatant(90), &combatant(30), AttackType::Melee);
    assert!(chance > fixed_f(0.5));
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_five_one_second_ticks_reach_destination() {
    let mut store = EntityStorage::new();
    let hero = entity_id("hero");
    store
        .insert(Entity::new(hero.clone(), "player", vec3(0, 0, 0)))
        .unwrap();

    let mut nav = NavigationSystem::new();
    let (count, callback) = counting_callback();
    assert!(nav.navigate_to(&store, &hero, vec3(10, 0, 0), Some(fixed(2)), Some(callback)));

    for _ in 0..4 {
        nav.fixed_update(&mut store, 1_000);
    }
    assert!(nav.is_navigating(&hero));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    let arrived = nav.fixed_update(&mut store, 1_000);
    assert_eq!(arrived, vec![hero.clone()]);
    assert_eq!(store.position(&hero), Some(vec3(10, 0, 0)));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    nav.fixed_update(&mut store, 1_000);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stop_freezes_entity_and_suppresses_callback() {
    let mut store = EntityStorage::new();
    let hero = entity_id("hero");
    store
        .insert(Entity::new(hero.clone(), "player", vec3(0, 0, 0)))
        .unwrap();

    let mut nav = NavigationSystem::new();
    let (count, callback) = counting_callback();
    nav.navigate_to(&store, &hero, vec3(10, 0, 0), None, Some(callback));
    nav.fixed_update(&mut store, 1_000);
    nav.stop_navigation(&hero);
    nav.stop_navigation(&hero);

    let frozen = store.position(&hero);
    for _ in 0..10 {
        nav.fixed_update(&mut store, 1_000);
    }
    assert_eq!(store.position(&hero), frozen);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(!nav.is_navigating(&hero));
}

// =============================================================================
// World
// =============================================================================

#[test]
fn test_safe_zone_lookup() {
    assert!(is_in_safe_zone(vec3(3230, 0, 3230)));
    assert!(!is_in_safe_zone(vec3(0, 0, 0)));
}

#[test]
fn test_double_save_within_window_emits_once() {
    let (mut world, clock) = ready_world();
    world.handle_event(InboundEvent::AdminSave).unwrap();
    clock.advance(10_000);
    world.handle_event(InboundEvent::AdminSave).unwrap();

    assert_eq!(count_saves(&world.drain_events()), 1);
}

#[test]
fn test_autosave_every_five_minutes() {
    let (mut world, clock) = ready_world();
    advance(&mut world, &clock, 15 * 60 * 1_000);

    let events = world.drain_events();
    assert_eq!(count_saves(&events), 3);
    assert_eq!(world.status().world_time, 15 * 60);
}

#[test]
fn test_custom_intervals_from_config() {
    let config = WorldConfig::from_ron_str(
        "test",
        "(autosave_interval_ms: 60000, min_save_interval_ms: 1000, world_time_interval_ms: 500)",
    )
    .unwrap();
    let (mut world, clock) = ready_world_with(config);
    advance(&mut world, &clock, 120_000);

    let events = world.drain_events();
    assert_eq!(count_saves(&events), 2);
    assert_eq!(world.status().world_time, 240);
}

#[test]
fn test_player_session_lifecycle() {
    let (mut world, _clock) = ready_world();
    world
        .handle_event(InboundEvent::PlayerConnect {
            player_id: entity_id("p1"),
            username: None,
        })
        .unwrap();
    world
        .handle_event(InboundEvent::PlayerConnect {
            player_id: entity_id("p2"),
            username: Some("Lynx".into()),
        })
        .unwrap();
    assert_eq!(world.status().player_count, 2);

    for _ in 0..3 {
        world
            .handle_event(InboundEvent::PlayerDisconnect {
                player_id: entity_id("p1"),
            })
            .unwrap();
    }
    assert_eq!(world.status().player_count, 1);

    let names: Vec<&str> = world.events().iter().map(WorldEvent::event_name).collect();
    assert_eq!(
        names,
        vec![
            "player:connected",
            "player:connected",
            "player:disconnected",
            "player:disconnected",
            "player:disconnected",
        ]
    );
}

#[test]
fn test_walk_out_of_safe_zone_then_fight() {
    let (mut world, clock) = ready_world();
    let guard = spawn_npc(&mut world, "guard", vec3(3255, 0, 3230));
    let goblin = spawn_npc(&mut world, "goblin", vec3(3270, 0, 3230));
    let fighter = combatant(20);

    assert!(world
        .evaluate_attack(&guard, &goblin, &fighter, &fighter, AttackType::Melee)
        .is_err());

    world.navigate_to(&guard, vec3(3265, 0, 3230), Some(fixed(5)), None);
    advance(&mut world, &clock, 3_000);
    assert!(!world.is_navigating(&guard));

    let chance = world
        .evaluate_attack(&guard, &goblin, &fighter, &fighter, AttackType::Melee)
        .unwrap();
    assert_eq!(chance, hit_chance_between(&fighter, &fighter, AttackType::Melee));
}

// =============================================================================
// Determinism
// =============================================================================

fn crowded_world() -> ClockedWorld {
    let (mut world, clock) = ready_world();
    for i in 0..25 {
        let id = spawn_npc(&mut world, &format!("npc_{i:02}"), vec3(i * 7, 0, -i));
        world.navigate_to(&id, vec3(-i * 3, 2, i * 11), Some(fixed(1 + i % 5)), None);
    }
    (world, clock)
}

#[test]
fn test_crowded_world_never_diverges() {
    assert_eq!(find_first_divergence(crowded_world, 400, 50), None);
}

#[test]
fn test_crowded_world_parallel() {
    run_parallel_worlds(crowded_world, 4, 400, 50).assert_deterministic();
}

proptest! {
    #[test]
    fn prop_hit_chance_in_unit_interval(a in 0i32..=i32::MAX, d in 0i32..=i32::MAX) {
        let chance = hit_chance(a, d);
        prop_assert!(chance >= Fixed::ZERO && chance <= Fixed::ONE);
    }

    #[test]
    fn prop_combatant_hit_chance_in_unit_interval(
        attacker in arb_combatant(),
        defender in arb_combatant(),
        attack_type in arb_attack_type(),
    ) {
        let chance = hit_chance_between(&attacker, &defender, attack_type);
        prop_assert!(chance >= Fixed::ZERO && chance <= Fixed::ONE);
    }

    #[test]
    fn prop_xp_to_next_zero_iff_max_level(xp in arb_xp()) {
        prop_assert_eq!(xp_to_next_level(xp) == 0, level_for_xp(xp) == MAX_LEVEL);
    }

    #[test]
    fn prop_level_for_xp_is_monotone(a in arb_xp(), b in arb_xp()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_for_xp(lo) <= level_for_xp(hi));
    }

    #[test]
    fn prop_navigation_is_deterministic(
        start in arb_position(),
        destination in arb_position(),
        speed in arb_speed(),
    ) {
        let setup = move || {
            let (mut world, clock) = ready_world();
            let id = spawn_npc(&mut world, "walker", start);
            world.navigate_to(&id, destination, Some(speed), None);
            (world, clock)
        };
        prop_assert_eq!(find_first_divergence(setup, 40, 250), None);
    }

    #[test]
    fn prop_navigation_never_overshoots(
        destination in arb_position(),
        speed in arb_speed(),
    ) {
        let (mut world, clock) = ready_world();
        let id = spawn_npc(&mut world, "walker", vec3(0, 0, 0));
        world.navigate_to(&id, destination, Some(speed), None);

        let total = destination.length();
        for _ in 0..20 {
            advance(&mut world, &clock, 1_000);
            let travelled = world.store().position(&id).unwrap().length();
            prop_assert!(travelled <= total + fixed_f(0.001));
        }
    }
}
