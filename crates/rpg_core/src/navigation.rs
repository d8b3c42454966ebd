//! Straight-line path following, advanced once per simulation tick.
//!
//! A request builds a two-point path from the entity's current position to
//! the destination. Each tick moves the entity toward its current waypoint
//! at `speed` units per second without overshooting, and fires the arrival
//! callback exactly once when the last waypoint is reached.
//!
//! Bad requests never fail loudly: they are logged and resolved by invoking
//! the arrival callback immediately, so one broken caller cannot stall the
//! tick for everyone else.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{fixed_serde, Fixed, Vec3Fixed};
use crate::store::EntityStore;

/// Default movement speed in units per second.
pub const DEFAULT_SPEED: Fixed = Fixed::const_from_int(2);

/// Distance at which a waypoint counts as reached (0.5 units).
pub const ARRIVAL_THRESHOLD: Fixed = Fixed::from_bits(1 << 31);

/// Called once when navigation for an entity finishes.
pub type ArrivalCallback = Box<dyn FnOnce(&EntityId) + Send>;

/// Tunables for path following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Speed used when a request does not name one (units per second).
    #[serde(with = "fixed_serde")]
    pub default_speed: Fixed,
    /// Distance at which a waypoint counts as reached.
    #[serde(with = "fixed_serde")]
    pub arrival_threshold: Fixed,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            default_speed: DEFAULT_SPEED,
            arrival_threshold: ARRIVAL_THRESHOLD,
        }
    }
}

/// An active movement order for one entity.
pub struct NavigationPath {
    /// Entity being moved.
    pub entity_id: EntityId,
    /// Points to visit in order; never empty.
    pub waypoints: Vec<Vec3Fixed>,
    /// Index of the waypoint currently being approached.
    pub current_waypoint_index: usize,
    /// Units per second.
    pub speed: Fixed,
    /// Set once the path has finished or was cancelled.
    pub arrived: bool,
    on_arrive: Option<ArrivalCallback>,
}

impl NavigationPath {
    /// Waypoint currently being approached, if any remain.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec3Fixed> {
        self.waypoints.get(self.current_waypoint_index).copied()
    }

    /// Final destination of the path.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3Fixed> {
        self.waypoints.last().copied()
    }

    /// Move on to the next waypoint, finishing the path after the last one.
    fn advance(&mut self) {
        self.current_waypoint_index += 1;
        if self.current_waypoint_index >= self.waypoints.len() {
            self.finish();
        }
    }

    /// Mark arrived and fire the callback. Safe to call repeatedly.
    fn finish(&mut self) {
        self.arrived = true;
        if let Some(callback) = self.on_arrive.take() {
            callback(&self.entity_id);
        }
    }

    /// Mark arrived without telling anyone.
    fn cancel(&mut self) {
        self.arrived = true;
        self.on_arrive = None;
    }
}

impl fmt::Debug for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationPath")
            .field("entity_id", &self.entity_id)
            .field("waypoints", &self.waypoints)
            .field("current_waypoint_index", &self.current_waypoint_index)
            .field("speed", &self.speed)
            .field("arrived", &self.arrived)
            .field("has_callback", &self.on_arrive.is_some())
            .finish()
    }
}

/// Moves entities along straight-line paths.
#[derive(Debug, Default)]
pub struct NavigationSystem {
    config: NavigationConfig,
    paths: BTreeMap<EntityId, NavigationPath>,
}

impl NavigationSystem {
    /// Create a system with default tunables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a system with explicit tunables.
    #[must_use]
    pub fn with_config(config: NavigationConfig) -> Self {
        Self {
            config,
            paths: BTreeMap::new(),
        }
    }

    /// Start moving `entity_id` toward `destination`.
    ///
    /// Replaces any path the entity already had; the old callback is dropped
    /// unfired. If the id is blank, the speed is not positive, the entity
    /// cannot be found, or the destination is too far away to measure in
    /// fixed point, the failure is logged and `on_arrive` runs immediately.
    /// Returns whether a path was started.
    pub fn navigate_to(
        &mut self,
        store: &dyn EntityStore,
        entity_id: &EntityId,
        destination: Vec3Fixed,
        speed: Option<Fixed>,
        on_arrive: Option<ArrivalCallback>,
    ) -> bool {
        let resolve_now = |on_arrive: Option<ArrivalCallback>| {
            if let Some(callback) = on_arrive {
                callback(entity_id);
            }
            false
        };

        if !entity_id.is_valid() {
            tracing::warn!(entity = %entity_id, "Navigation rejected: invalid entity id");
            return resolve_now(on_arrive);
        }

        let speed = speed.unwrap_or(self.config.default_speed);
        if speed <= Fixed::ZERO {
            tracing::warn!(
                entity = %entity_id,
                %speed,
                "Navigation rejected: speed must be positive"
            );
            return resolve_now(on_arrive);
        }

        let Some(start) = store.position(entity_id) else {
            tracing::warn!(entity = %entity_id, "Navigation rejected: entity not found");
            return resolve_now(on_arrive);
        };

        if reach(start, destination).is_none() {
            tracing::warn!(
                entity = %entity_id,
                from = %start,
                to = %destination,
                "Navigation rejected: destination out of reach"
            );
            return resolve_now(on_arrive);
        }

        tracing::debug!(
            entity = %entity_id,
            from = %start,
            to = %destination,
            %speed,
            "Navigation started"
        );

        self.paths.insert(
            entity_id.clone(),
            NavigationPath {
                entity_id: entity_id.clone(),
                waypoints: vec![start, destination],
                current_waypoint_index: 1,
                speed,
                arrived: false,
                on_arrive,
            },
        );
        true
    }

    /// Cancel navigation without firing the arrival callback.
    ///
    /// Takes effect immediately; calling it again, or for an entity that is
    /// not moving, does nothing.
    pub fn stop_navigation(&mut self, entity_id: &EntityId) {
        if let Some(path) = self.paths.get_mut(entity_id) {
            if !path.arrived {
                tracing::debug!(entity = %entity_id, "Navigation stopped");
            }
            path.cancel();
        }
    }

    /// Whether the entity has an unfinished path.
    #[must_use]
    pub fn is_navigating(&self, entity_id: &EntityId) -> bool {
        self.paths.get(entity_id).is_some_and(|p| !p.arrived)
    }

    /// The entity's path, including one that finished but was not yet swept.
    #[must_use]
    pub fn path(&self, entity_id: &EntityId) -> Option<&NavigationPath> {
        self.paths.get(entity_id)
    }

    /// Number of unfinished paths.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.paths.values().filter(|p| !p.arrived).count()
    }

    /// Drop every path without firing callbacks.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Entities with unfinished paths, in id order, with their destinations.
    pub fn active_destinations(&self) -> impl Iterator<Item = (&EntityId, Vec3Fixed)> {
        self.paths
            .values()
            .filter(|p| !p.arrived)
            .filter_map(|p| p.destination().map(|d| (&p.entity_id, d)))
    }

    /// Advance every active path by `delta_ms` milliseconds.
    ///
    /// Paths are processed in entity-id order. Returns the ids whose paths
    /// finished during this call (cancelled paths are not reported).
    pub fn fixed_update(&mut self, store: &mut dyn EntityStore, delta_ms: u32) -> Vec<EntityId> {
        #[cfg(feature = "debug-validation")]
        self.validate_paths();

        let delta_seconds = Fixed::from_num(delta_ms) / Fixed::from_num(1000);
        let threshold = self.config.arrival_threshold;
        let mut arrived = Vec::new();

        for path in self.paths.values_mut() {
            if path.arrived {
                continue;
            }

            step_path(path, store, delta_seconds, threshold);

            if path.arrived {
                arrived.push(path.entity_id.clone());
            }
        }

        self.paths.retain(|_, path| !path.arrived);
        arrived
    }

    #[cfg(feature = "debug-validation")]
    fn validate_paths(&self) {
        for path in self.paths.values() {
            assert!(
                !path.waypoints.is_empty(),
                "path for {} has no waypoints",
                path.entity_id
            );
            assert!(
                path.arrived || path.current_waypoint_index < path.waypoints.len(),
                "path for {} points past its last waypoint",
                path.entity_id
            );
        }
    }
}

/// Offset from `from` to `to` and its length, if both fit the fixed-point
/// range.
fn reach(from: Vec3Fixed, to: Vec3Fixed) -> Option<(Vec3Fixed, Fixed)> {
    let offset = to.checked_sub(from)?;
    Some((offset, offset.checked_length()?))
}

/// Advance a single path by one tick.
fn step_path(
    path: &mut NavigationPath,
    store: &mut dyn EntityStore,
    delta_seconds: Fixed,
    threshold: Fixed,
) {
    let Some(current) = store.position(&path.entity_id) else {
        tracing::warn!(entity = %path.entity_id, "Navigating entity disappeared; resolving path");
        path.finish();
        return;
    };

    let Some(target) = path.current_waypoint() else {
        path.finish();
        return;
    };

    let Some((offset, distance)) = reach(current, target) else {
        tracing::warn!(
            entity = %path.entity_id,
            from = %current,
            to = %target,
            "Waypoint out of reach of fixed-point range; resolving path"
        );
        path.finish();
        return;
    };

    if distance <= threshold {
        path.advance();
        return;
    }

    let step = path.speed.saturating_mul(delta_seconds);
    let next = if step >= distance {
        target
    } else {
        // Lands between current and target, so only rounding can overflow.
        current
            .checked_add(offset.normalize().scale(step))
            .unwrap_or(target)
    };

    store.set_position(&path.entity_id, next);
    if let Some(node) = store.render_node_mut(&path.entity_id) {
        node.sync(next);
    }

    if step >= distance || distance - step <= threshold {
        path.advance();
    }

    if path.arrived {
        tracing::debug!(entity = %path.entity_id, position = %next, "Navigation arrived");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::components::{Entity, RenderNode};
    use crate::store::EntityStorage;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn store_with(name: &str, position: Vec3Fixed) -> EntityStorage {
        let mut store = EntityStorage::new();
        let node = RenderNode::new(7, position);
        let entity = Entity::new(id(name), "player", position).with_render_node(node);
        store.insert(entity).unwrap();
        store
    }

    fn counting_callback() -> (Arc<AtomicUsize>, ArrivalCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: ArrivalCallback = Box::new(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_five_one_second_ticks_reach_ten_units() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();

        assert!(nav.navigate_to(
            &store,
            &id("hero"),
            Vec3Fixed::from_ints(10, 0, 0),
            Some(Fixed::from_num(2)),
            Some(callback),
        ));

        for tick in 1..=4 {
            nav.fixed_update(&mut store, 1000);
            assert!(nav.is_navigating(&id("hero")), "still moving after tick {tick}");
            assert_eq!(count.load(Ordering::SeqCst), 0);
        }

        let arrived = nav.fixed_update(&mut store, 1000);
        assert_eq!(arrived, vec![id("hero")]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!nav.is_navigating(&id("hero")));
        assert_eq!(store.position(&id("hero")), Some(Vec3Fixed::from_ints(10, 0, 0)));

        // Further ticks never fire the callback again.
        nav.fixed_update(&mut store, 1000);
        nav.fixed_update(&mut store, 1000);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(nav.active_count(), 0);
    }

    #[test]
    fn test_movement_is_clamped_and_mirrored() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let speed = Some(Fixed::from_num(10));
        nav.navigate_to(&store, &id("hero"), Vec3Fixed::from_ints(0, 0, 3), speed, None);

        nav.fixed_update(&mut store, 1000);
        let expected = Vec3Fixed::from_ints(0, 0, 3);
        assert_eq!(store.position(&id("hero")), Some(expected));
        let node = store.get(&id("hero")).unwrap().render_node.unwrap();
        assert_eq!(node.position, expected);
    }

    #[test]
    fn test_partial_step_moves_along_direction() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        nav.navigate_to(&store, &id("hero"), Vec3Fixed::from_ints(30, 0, 40), None, None);

        // Default speed 2 u/s for 500 ms moves 1 unit along (0.6, 0, 0.8).
        nav.fixed_update(&mut store, 500);
        let pos = store.position(&id("hero")).unwrap();
        let epsilon = Fixed::ONE / Fixed::from_num(10_000);
        assert!((pos.x - Fixed::from_num(0.6)).abs() < epsilon);
        assert!((pos.z - Fixed::from_num(0.8)).abs() < epsilon);
        assert_eq!(pos.y, Fixed::ZERO);
    }

    #[test]
    fn test_stop_navigation_suppresses_callback() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();
        let target = Vec3Fixed::from_ints(10, 0, 0);
        nav.navigate_to(&store, &id("hero"), target, None, Some(callback));

        nav.fixed_update(&mut store, 1000);
        let stopped_at = store.position(&id("hero"));

        nav.stop_navigation(&id("hero"));
        nav.stop_navigation(&id("hero"));
        assert!(!nav.is_navigating(&id("hero")));

        for _ in 0..10 {
            nav.fixed_update(&mut store, 1000);
        }
        assert_eq!(store.position(&id("hero")), stopped_at);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_without_path_is_noop() {
        let mut nav = NavigationSystem::new();
        nav.stop_navigation(&id("nobody"));
        assert!(!nav.is_navigating(&id("nobody")));
    }

    #[test]
    fn test_unknown_entity_resolves_immediately() {
        let store = EntityStorage::new();
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();

        let started =
            nav.navigate_to(&store, &id("ghost"), Vec3Fixed::ZERO, None, Some(callback));

        assert!(!started);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!nav.is_navigating(&id("ghost")));
    }

    #[test]
    fn test_blank_id_resolves_immediately() {
        let store = EntityStorage::new();
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();
        let blank: EntityId = ron::from_str("\"\"").unwrap();

        assert!(!nav.navigate_to(&store, &blank, Vec3Fixed::ZERO, None, Some(callback)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_positive_speed_resolves_immediately() {
        let store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();

        assert!(!nav.navigate_to(
            &store,
            &id("hero"),
            Vec3Fixed::from_ints(5, 0, 0),
            Some(Fixed::ZERO),
            Some(callback),
        ));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_destination_within_threshold_arrives_next_tick() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();
        let near = Vec3Fixed::new(Fixed::from_num(0.25), Fixed::ZERO, Fixed::ZERO);

        nav.navigate_to(&store, &id("hero"), near, None, Some(callback));
        assert!(nav.is_navigating(&id("hero")));

        nav.fixed_update(&mut store, 50);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        // Within the threshold the entity is not snapped onto the waypoint.
        assert_eq!(store.position(&id("hero")), Some(Vec3Fixed::ZERO));
    }

    #[test]
    fn test_entity_removed_mid_path_resolves() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();
        let target = Vec3Fixed::from_ints(100, 0, 0);
        nav.navigate_to(&store, &id("hero"), target, None, Some(callback));

        store.remove(&id("hero"));
        let arrived = nav.fixed_update(&mut store, 1000);

        assert_eq!(arrived, vec![id("hero")]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_request_replaces_path_without_firing_old_callback() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (first, first_cb) = counting_callback();
        let (second, second_cb) = counting_callback();

        let far = Vec3Fixed::from_ints(100, 0, 0);
        let near = Vec3Fixed::from_ints(0, 0, 1);
        nav.navigate_to(&store, &id("hero"), far, None, Some(first_cb));
        nav.navigate_to(&store, &id("hero"), near, None, Some(second_cb));

        nav.fixed_update(&mut store, 1000);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_one_bad_path_does_not_stall_others() {
        let mut store = store_with("a", Vec3Fixed::ZERO);
        store
            .insert(Entity::new(id("b"), "npc", Vec3Fixed::ZERO))
            .unwrap();
        let mut nav = NavigationSystem::new();
        nav.navigate_to(&store, &id("a"), Vec3Fixed::from_ints(10, 0, 0), None, None);
        nav.navigate_to(&store, &id("b"), Vec3Fixed::from_ints(10, 0, 0), None, None);
        store.remove(&id("a"));

        nav.fixed_update(&mut store, 1000);
        assert!(!nav.is_navigating(&id("a")));
        assert!(nav.is_navigating(&id("b")));
        assert_eq!(store.position(&id("b")), Some(Vec3Fixed::from_ints(2, 0, 0)));
    }

    fn far(x: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::checked_from_f64(x, 0.0, z).unwrap()
    }

    #[test]
    fn test_out_of_reach_destination_resolves_immediately() {
        let store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();

        let started = nav.navigate_to(&store, &id("hero"), far(2e9, 2e9), None, Some(callback));

        assert!(!started);
        assert!(!nav.is_navigating(&id("hero")));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_opposite_ends_of_range_resolve_immediately() {
        let store = store_with("hero", far(-2e9, 0.0));
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();

        assert!(!nav.navigate_to(&store, &id("hero"), far(2e9, 0.0), None, Some(callback)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_entity_moved_out_of_reach_resolves_without_stalling_others() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        store
            .insert(Entity::new(id("npc"), "npc", Vec3Fixed::ZERO))
            .unwrap();
        let mut nav = NavigationSystem::new();
        let (count, callback) = counting_callback();
        assert!(nav.navigate_to(&store, &id("hero"), far(2e9, 0.0), None, Some(callback)));
        nav.navigate_to(&store, &id("npc"), Vec3Fixed::from_ints(10, 0, 0), None, None);

        store.set_position(&id("hero"), far(-2e9, 0.0));
        let arrived = nav.fixed_update(&mut store, 1000);

        assert_eq!(arrived, vec![id("hero")]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.position(&id("hero")), Some(far(-2e9, 0.0)));
        assert_eq!(store.position(&id("npc")), Some(Vec3Fixed::from_ints(2, 0, 0)));
    }

    #[test]
    fn test_long_path_near_range_edge_moves() {
        let mut store = store_with("hero", Vec3Fixed::ZERO);
        let mut nav = NavigationSystem::new();
        assert!(nav.navigate_to(&store, &id("hero"), far(2e9, 0.0), None, None));

        nav.fixed_update(&mut store, 1000);
        assert_eq!(store.position(&id("hero")), Some(Vec3Fixed::from_ints(2, 0, 0)));
        assert!(nav.is_navigating(&id("hero")));
    }
}
