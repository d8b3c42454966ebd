//! Single-writer world task.

use std::time::Duration;

use rpg_core::components::{Entity, EntityId};
use rpg_core::error::{GameError, Result as GameResult};
use rpg_core::math::{Fixed, Vec3Fixed};
use rpg_core::store::EntityStore;
use rpg_core::world::{InboundEvent, WorldEvent, WorldManager, WorldStatus};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{ServerConfig, ServerError};

/// Entity kind the host gives connected players.
pub const PLAYER_KIND: &str = "player";

/// Requests accepted by the world task.
#[derive(Debug)]
pub enum WorldCommand {
    /// Dispatch an inbound event.
    Event {
        /// The event.
        event: InboundEvent,
        /// Outcome of the dispatch.
        reply: oneshot::Sender<GameResult<()>>,
    },
    /// Move an entity. `arrived` resolves when the path ends or the request
    /// is rejected, and is dropped unresolved if the path is cancelled.
    NavigateTo {
        /// Entity to move.
        entity_id: EntityId,
        /// Destination in world units.
        destination: [f64; 3],
        /// Units per second, or the world default.
        speed: Option<f64>,
        /// Completion signal.
        arrived: oneshot::Sender<EntityId>,
    },
    /// Cancel an entity's movement.
    StopNavigation(EntityId),
    /// Report current world status.
    Status(oneshot::Sender<WorldStatus>),
    /// Save, stop the world and end the task.
    Shutdown,
}

/// Cloneable handle to a running world task.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    commands: mpsc::Sender<WorldCommand>,
    events: broadcast::Sender<WorldEvent>,
}

impl WorldHandle {
    /// Receive every event the world emits from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.events.subscribe()
    }

    /// Dispatch an inbound event and wait for the world's verdict.
    pub async fn send_event(&self, event: InboundEvent) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Event { event, reply }).await?;
        rx.await.map_err(|_| ServerError::ActorStopped)??;
        Ok(())
    }

    /// Start moving an entity; the receiver resolves on arrival.
    pub async fn navigate_to(
        &self,
        entity_id: EntityId,
        destination: [f64; 3],
        speed: Option<f64>,
    ) -> Result<oneshot::Receiver<EntityId>, ServerError> {
        let (arrived, rx) = oneshot::channel();
        self.send(WorldCommand::NavigateTo {
            entity_id,
            destination,
            speed,
            arrived,
        })
        .await?;
        Ok(rx)
    }

    /// Cancel an entity's movement.
    pub async fn stop_navigation(&self, entity_id: EntityId) -> Result<(), ServerError> {
        self.send(WorldCommand::StopNavigation(entity_id)).await
    }

    /// Current world status.
    pub async fn status(&self) -> Result<WorldStatus, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(WorldCommand::Status(reply)).await?;
        rx.await.map_err(|_| ServerError::ActorStopped)
    }

    /// Ask the world task to stop.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        self.send(WorldCommand::Shutdown).await
    }

    async fn send(&self, command: WorldCommand) -> Result<(), ServerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ServerError::ActorStopped)
    }
}

/// Move `world` onto its own task.
///
/// The world should already be initialized. The task ends on
/// [`WorldCommand::Shutdown`] or when every handle is dropped, and yields the
/// world back for inspection.
pub fn spawn_world_actor(
    world: WorldManager,
    config: &ServerConfig,
) -> (WorldHandle, JoinHandle<WorldManager>) {
    let (commands, command_rx) = mpsc::channel(config.command_buffer.max(1));
    let (events, _) = broadcast::channel(config.event_buffer.max(1));
    let tick = Duration::from_millis(u64::from(world.config().tick_interval_ms().max(1)));

    let task = tokio::spawn(run_world(world, command_rx, events.clone(), tick));
    (WorldHandle { commands, events }, task)
}

async fn run_world(
    mut world: WorldManager,
    mut commands: mpsc::Receiver<WorldCommand>,
    events: broadcast::Sender<WorldEvent>,
    tick: Duration,
) -> WorldManager {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(tick_ms = tick.as_millis(), "World task started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                world.update();
            }
            command = commands.recv() => match command {
                Some(WorldCommand::Shutdown) | None => {
                    world.shutdown();
                    publish(&mut world, &events);
                    break;
                }
                Some(command) => handle_command(&mut world, command),
            },
        }

        publish(&mut world, &events);
    }

    tracing::info!("World task stopped");
    world
}

fn handle_command(world: &mut WorldManager, command: WorldCommand) {
    match command {
        WorldCommand::Event { event, reply } => {
            let result = dispatch_event(world, event);
            if let Err(e) = &result {
                tracing::warn!(error = %e, "Event rejected");
            }
            let _ = reply.send(result);
        }
        WorldCommand::NavigateTo {
            entity_id,
            destination,
            speed,
            arrived,
        } => navigate(world, entity_id, destination, speed, arrived),
        WorldCommand::StopNavigation(entity_id) => world.stop_navigation(&entity_id),
        WorldCommand::Status(reply) => {
            let _ = reply.send(world.status());
        }
        // Handled by the loop.
        WorldCommand::Shutdown => {}
    }
}

/// Run an event through the world and keep player entities in step with
/// sessions.
fn dispatch_event(world: &mut WorldManager, event: InboundEvent) -> GameResult<()> {
    match event {
        InboundEvent::PlayerConnect {
            player_id,
            username,
        } => {
            world.handle_event(InboundEvent::PlayerConnect {
                player_id: player_id.clone(),
                username,
            })?;
            let position = world
                .session(&player_id)
                .map(|session| session.spawn_position)
                .ok_or_else(|| GameError::EntityNotFound(player_id.clone()))?;
            if world.store().contains(&player_id) {
                world.store_mut().set_position(&player_id, position);
            } else {
                world
                    .store_mut()
                    .insert(Entity::new(player_id, PLAYER_KIND, position))?;
            }
            Ok(())
        }
        InboundEvent::PlayerDisconnect { player_id } => {
            world.handle_event(InboundEvent::PlayerDisconnect {
                player_id: player_id.clone(),
            })?;
            world.store_mut().remove(&player_id);
            Ok(())
        }
        other => world.handle_event(other),
    }
}

fn navigate(
    world: &mut WorldManager,
    entity_id: EntityId,
    destination: [f64; 3],
    speed: Option<f64>,
    arrived: oneshot::Sender<EntityId>,
) {
    let [x, y, z] = destination;
    let destination = match Vec3Fixed::checked_from_f64(x, y, z) {
        Ok(destination) => destination,
        Err(e) => {
            tracing::warn!(entity = %entity_id, error = %e, "Navigation rejected");
            let _ = arrived.send(entity_id);
            return;
        }
    };

    // Non-positive speeds are rejected by the navigation system itself.
    let speed = match speed {
        None => None,
        Some(raw) => match Fixed::checked_from_num(raw) {
            Some(speed) => Some(speed),
            None => {
                tracing::warn!(entity = %entity_id, speed = raw, "Navigation rejected: bad speed");
                let _ = arrived.send(entity_id);
                return;
            }
        },
    };

    world.navigate_to(
        &entity_id,
        destination,
        speed,
        Some(Box::new(move |id: &EntityId| {
            let _ = arrived.send(id.clone());
        })),
    );
}

fn publish(world: &mut WorldManager, events: &broadcast::Sender<WorldEvent>) {
    for event in world.drain_events() {
        // No subscribers is fine; events are fire-and-forget.
        if events.send(event).is_err() {
            tracing::trace!("Event dropped; no subscribers");
        }
    }
}
