//! World lifecycle: scheduling, player sessions, saves and region lookup.
//!
//! [`WorldManager`] is the single writer for a world. Every mutation happens
//! inside one of its `&mut self` methods; hosts that receive input on many
//! threads funnel it into the one task that owns the manager.
//!
//! # Phases
//!
//! `Uninitialized -> Initializing -> Ready -> ShuttingDown`. Saves and
//! cleanup sweeps complete inside a single call, so they overlap `Ready`
//! rather than being phases of their own.
//!
//! # Example
//!
//! ```
//! use rpg_core::config::WorldConfig;
//! use rpg_core::store::EntityStorage;
//! use rpg_core::world::{ManualClock, WorldManager};
//!
//! let clock = ManualClock::new(0);
//! let mut world = WorldManager::new(WorldConfig::default(), EntityStorage::new(), clock.clone());
//! world.initialize().unwrap();
//!
//! clock.advance(1_000);
//! world.update();
//! assert_eq!(world.status().world_time, 1);
//! ```

pub mod events;
pub mod regions;
pub mod scheduler;
pub mod services;

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

pub use events::{InboundEvent, SpawnRequest, WorldEvent};
pub use regions::{is_in_safe_zone, region_at, Region, REGIONS};
pub use scheduler::{Clock, DueTask, ManualClock, Scheduler, SystemClock, TaskKind};
pub use services::{NoopServices, WorldServices};

use crate::combat::{hit_chance_between, AttackType, Combatant};
use crate::components::{Entity, EntityId};
use crate::config::WorldConfig;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec3Fixed};
use crate::navigation::{ArrivalCallback, NavigationSystem};
use crate::store::{EntityStorage, EntityStore};

/// Lifecycle phase of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldPhase {
    /// Constructed but not started.
    Uninitialized,
    /// Wiring handlers and generating the world.
    Initializing,
    /// Running.
    Ready,
    /// Stopped; no further input is accepted.
    ShuttingDown,
}

impl WorldPhase {
    /// Short name for logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WorldPhase::Uninitialized => "uninitialized",
            WorldPhase::Initializing => "initializing",
            WorldPhase::Ready => "ready",
            WorldPhase::ShuttingDown => "shutting_down",
        }
    }
}

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A `world:save` event was emitted.
    Saved,
    /// The previous save was too recent; nothing was emitted.
    Throttled,
}

/// Read-only snapshot of world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStatus {
    /// Whether initialization has completed.
    pub initialized: bool,
    /// Current phase.
    pub phase: WorldPhase,
    /// Connected players.
    pub player_count: usize,
    /// Entities in the store.
    pub entity_count: usize,
    /// Seconds of world time since initialization.
    pub world_time: u64,
}

/// A connected player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerSession {
    /// Display name.
    pub username: String,
    /// Where the player spawned.
    pub spawn_position: Vec3Fixed,
    /// Clock time of the connection.
    pub connected_at_ms: u64,
}

/// Owns the state of one running world.
pub struct WorldManager<S: EntityStore = EntityStorage> {
    config: WorldConfig,
    store: S,
    clock: Box<dyn Clock>,
    services: Box<dyn WorldServices>,
    navigation: NavigationSystem,
    scheduler: Scheduler,
    phase: WorldPhase,
    /// Set once `initialize` completes; survives shutdown.
    initialized: bool,
    sessions: BTreeMap<EntityId, PlayerSession>,
    world_time: u64,
    last_save_ms: Option<u64>,
    events: Vec<WorldEvent>,
}

impl<S: EntityStore> fmt::Debug for WorldManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldManager")
            .field("phase", &self.phase)
            .field("players", &self.sessions.len())
            .field("entities", &self.store.len())
            .field("world_time", &self.world_time)
            .field("navigating", &self.navigation.active_count())
            .finish_non_exhaustive()
    }
}

impl<S: EntityStore> WorldManager<S> {
    /// Create an uninitialized world over `store`, timed by `clock`.
    pub fn new(config: WorldConfig, store: S, clock: impl Clock + 'static) -> Self {
        Self {
            navigation: NavigationSystem::with_config(config.navigation),
            config,
            store,
            clock: Box::new(clock),
            services: Box::new(NoopServices),
            scheduler: Scheduler::new(),
            phase: WorldPhase::Uninitialized,
            initialized: false,
            sessions: BTreeMap::new(),
            world_time: 0,
            last_save_ms: None,
            events: Vec::new(),
        }
    }

    /// Replace the external collaborators.
    #[must_use]
    pub fn with_services(mut self, services: impl WorldServices + 'static) -> Self {
        self.services = Box::new(services);
        self
    }

    /// Start the world.
    ///
    /// Calling this again after success only logs. If first-time world
    /// generation fails the world stays uninitialized and the error is
    /// returned.
    pub fn initialize(&mut self) -> Result<()> {
        if self.phase != WorldPhase::Uninitialized {
            tracing::info!(phase = self.phase.as_str(), "World already initialized");
            return Ok(());
        }

        self.phase = WorldPhase::Initializing;
        tracing::info!("Initializing world");

        if self.config.generate_world_on_start && self.store.is_empty() {
            tracing::info!("Store is empty; generating world");
            if let Err(e) = self.services.generate_world(&mut self.store) {
                tracing::error!(error = %e, "World generation failed");
                self.phase = WorldPhase::Uninitialized;
                return Err(e);
            }
        }

        let now = self.clock.now_ms();
        let tick_ms = u64::from(self.config.tick_interval_ms());
        self.scheduler.schedule(TaskKind::Navigation, tick_ms, now);
        self.scheduler
            .schedule(TaskKind::WorldTime, self.config.world_time_interval_ms, now);
        self.scheduler
            .schedule(TaskKind::Cleanup, self.config.cleanup_interval_ms, now);
        self.scheduler
            .schedule(TaskKind::Autosave, self.config.autosave_interval_ms, now);

        self.phase = WorldPhase::Ready;
        self.initialized = true;
        tracing::info!(
            entities = self.store.len(),
            tick_ms,
            "World ready"
        );
        Ok(())
    }

    /// Run every periodic task that is due by the clock's current time.
    ///
    /// Returns the number of task runs performed.
    pub fn update(&mut self) -> usize {
        if self.phase != WorldPhase::Ready {
            return 0;
        }

        let due = self.scheduler.due(self.clock.now_ms());
        for task in &due {
            self.run_task(*task);
        }
        due.len()
    }

    fn run_task(&mut self, task: DueTask) {
        match task.kind {
            TaskKind::Navigation => {
                let delta_ms = self.config.tick_interval_ms();
                let arrived = self.navigation.fixed_update(&mut self.store, delta_ms);
                if !arrived.is_empty() {
                    tracing::trace!(count = arrived.len(), "Paths completed");
                }
            }
            TaskKind::WorldTime => {
                self.world_time += 1;
                self.events.push(WorldEvent::Time {
                    time: self.world_time,
                });
            }
            TaskKind::Cleanup => self.run_cleanup(task.due_ms),
            TaskKind::Autosave => {
                tracing::debug!("Autosave triggered");
                self.save_at(task.due_ms);
            }
        }
    }

    fn run_cleanup(&mut self, now_ms: u64) {
        match self.services.cleanup(&mut self.store, now_ms) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Cleanup sweep finished"),
            Err(e) => tracing::error!(error = %e, "Cleanup sweep failed"),
        }
    }

    /// Dispatch an inbound event.
    pub fn handle_event(&mut self, event: InboundEvent) -> Result<()> {
        self.ensure_ready()?;
        tracing::trace!(event = event.event_name(), "Handling event");

        match event {
            InboundEvent::PlayerConnect {
                player_id,
                username,
            } => self.handle_player_connect(player_id, username)?,
            InboundEvent::PlayerDisconnect { player_id } => {
                self.handle_player_disconnect(&player_id)?;
            }
            InboundEvent::AdminSave => {
                self.save_world()?;
            }
            InboundEvent::AdminSpawn(request) => self.spawn_entity(request)?,
        }
        Ok(())
    }

    /// Register a player session and announce the spawn.
    ///
    /// A repeated connect for a live session refreshes it without counting
    /// the player twice.
    pub fn handle_player_connect(
        &mut self,
        player_id: EntityId,
        username: Option<String>,
    ) -> Result<()> {
        self.ensure_ready()?;
        let now = self.clock.now_ms();
        let position = self
            .services
            .saved_position(&player_id)
            .unwrap_or_else(|| self.config.default_spawn.to_vec3());
        let username = username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| player_id.to_string());

        let session = PlayerSession {
            username: username.clone(),
            spawn_position: position,
            connected_at_ms: now,
        };
        if self.sessions.insert(player_id.clone(), session).is_some() {
            tracing::warn!(player = %player_id, "Player connected twice; session refreshed");
        }

        tracing::info!(
            player = %player_id,
            %username,
            region = region_at(position),
            players = self.sessions.len(),
            "Player connected"
        );

        self.events.push(WorldEvent::PlayerConnected {
            player_id,
            username,
            position,
            timestamp: now,
        });
        Ok(())
    }

    /// Drop a player session.
    pub fn handle_player_disconnect(&mut self, player_id: &EntityId) -> Result<()> {
        self.ensure_ready()?;
        if self.sessions.remove(player_id).is_none() {
            tracing::warn!(player = %player_id, "Disconnect for unknown player");
        }
        self.navigation.stop_navigation(player_id);

        tracing::info!(
            player = %player_id,
            players = self.sessions.len(),
            "Player disconnected"
        );

        self.events.push(WorldEvent::PlayerDisconnected {
            player_id: player_id.clone(),
            timestamp: self.clock.now_ms(),
        });
        Ok(())
    }

    /// Place an entity requested by an operator.
    pub fn spawn_entity(&mut self, request: SpawnRequest) -> Result<()> {
        self.ensure_ready()?;
        if !request.id.is_valid() {
            return Err(GameError::InvalidEntityId(request.id.to_string()));
        }

        let mut entity = Entity::new(request.id.clone(), request.kind.clone(), request.position);
        entity.metadata = request.metadata.unwrap_or_default();
        self.store.insert(entity)?;

        tracing::info!(
            entity = %request.id,
            kind = %request.kind,
            position = %request.position,
            "Entity spawned"
        );
        self.events.push(WorldEvent::EntitySpawned {
            id: request.id,
            kind: request.kind,
            position: request.position,
        });
        Ok(())
    }

    /// Request a save, honouring the minimum interval between saves.
    pub fn save_world(&mut self) -> Result<SaveOutcome> {
        match self.phase {
            WorldPhase::Ready | WorldPhase::ShuttingDown => Ok(self.save_at(self.clock.now_ms())),
            phase => Err(GameError::NotReady(phase.as_str())),
        }
    }

    fn save_at(&mut self, now_ms: u64) -> SaveOutcome {
        if let Some(last) = self.last_save_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < self.config.min_save_interval_ms {
                tracing::debug!(elapsed_ms = elapsed, "Save skipped; last save too recent");
                return SaveOutcome::Throttled;
            }
        }

        self.last_save_ms = Some(now_ms);
        let event = WorldEvent::Save {
            timestamp: now_ms,
            entity_count: self.store.len(),
            player_count: self.sessions.len(),
        };
        tracing::info!(
            entities = self.store.len(),
            players = self.sessions.len(),
            "World save requested"
        );
        self.events.push(event);
        SaveOutcome::Saved
    }

    /// Start moving an entity. See [`NavigationSystem::navigate_to`].
    pub fn navigate_to(
        &mut self,
        entity_id: &EntityId,
        destination: Vec3Fixed,
        speed: Option<Fixed>,
        on_arrive: Option<ArrivalCallback>,
    ) -> bool {
        self.navigation
            .navigate_to(&self.store, entity_id, destination, speed, on_arrive)
    }

    /// Cancel an entity's movement without firing its callback.
    pub fn stop_navigation(&mut self, entity_id: &EntityId) {
        self.navigation.stop_navigation(entity_id);
    }

    /// Whether the entity is currently moving.
    #[must_use]
    pub fn is_navigating(&self, entity_id: &EntityId) -> bool {
        self.navigation.is_navigating(entity_id)
    }

    /// Hit chance of one entity attacking another.
    ///
    /// Fails if either entity is unknown or stands in a safe zone.
    pub fn evaluate_attack(
        &self,
        attacker_id: &EntityId,
        defender_id: &EntityId,
        attacker: &Combatant,
        defender: &Combatant,
        attack_type: AttackType,
    ) -> Result<Fixed> {
        for id in [attacker_id, defender_id] {
            let position = self
                .store
                .position(id)
                .ok_or_else(|| GameError::EntityNotFound(id.clone()))?;
            if let Some(region) = regions::find_region(position).filter(|r| r.safe) {
                return Err(GameError::CombatInSafeZone {
                    region: region.name,
                });
            }
        }

        Ok(hit_chance_between(attacker, defender, attack_type))
    }

    /// Whether combat is disallowed at `position`.
    #[must_use]
    pub fn is_in_safe_zone(&self, position: Vec3Fixed) -> bool {
        is_in_safe_zone(position)
    }

    /// Name of the region at `position`.
    #[must_use]
    pub fn region_at(&self, position: Vec3Fixed) -> &'static str {
        region_at(position)
    }

    /// Stop the world: final save, paths dropped, timers disarmed.
    pub fn shutdown(&mut self) {
        if self.phase == WorldPhase::ShuttingDown {
            return;
        }
        let was_ready = self.phase == WorldPhase::Ready;
        self.phase = WorldPhase::ShuttingDown;
        tracing::info!("World shutting down");

        if was_ready {
            self.save_at(self.clock.now_ms());
        }
        self.navigation.clear();
        self.scheduler.clear();
    }

    /// Snapshot of world state.
    #[must_use]
    pub fn status(&self) -> WorldStatus {
        WorldStatus {
            initialized: self.initialized,
            phase: self.phase,
            player_count: self.sessions.len(),
            entity_count: self.store.len(),
            world_time: self.world_time,
        }
    }

    /// Whether the world accepts input.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == WorldPhase::Ready
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> WorldPhase {
        self.phase
    }

    /// Connected player's session.
    #[must_use]
    pub fn session(&self, player_id: &EntityId) -> Option<&PlayerSession> {
        self.sessions.get(player_id)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Read access to the entity store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write access to the entity store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Current time of the injected clock.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Events emitted since the last drain.
    #[must_use]
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    /// Take all emitted events, in emission order.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deterministic hash of simulation state.
    ///
    /// Covers world time, sessions, entity positions and active paths.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.world_time.hash(&mut hasher);
        for (id, session) in &self.sessions {
            id.hash(&mut hasher);
            session.hash(&mut hasher);
        }
        for id in self.store.ids() {
            id.hash(&mut hasher);
            self.store.position(&id).hash(&mut hasher);
        }
        for (id, destination) in self.navigation.active_destinations() {
            id.hash(&mut hasher);
            destination.hash(&mut hasher);
        }

        hasher.finish()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.phase == WorldPhase::Ready {
            Ok(())
        } else {
            Err(GameError::NotReady(self.phase.as_str()))
        }
    }
}
