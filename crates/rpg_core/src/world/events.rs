//! Messages consumed and emitted by the world manager.
//!
//! Each wire name maps to exactly one variant, so handlers are checked for
//! exhaustiveness at compile time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::Vec3Fixed;

/// Request to place an entity into the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Entity type, e.g. `"npc"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Id of the new entity.
    pub id: EntityId,
    /// Where to place it.
    pub position: Vec3Fixed,
    /// Extra key/value data.
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Events the world manager consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum InboundEvent {
    /// A player joined.
    #[serde(rename = "player:connect")]
    PlayerConnect {
        /// Player id.
        player_id: EntityId,
        /// Display name, if the client sent one.
        #[serde(default)]
        username: Option<String>,
    },
    /// A player left.
    #[serde(rename = "player:disconnect")]
    PlayerDisconnect {
        /// Player id.
        player_id: EntityId,
    },
    /// An operator asked for an immediate save.
    #[serde(rename = "admin:save")]
    AdminSave,
    /// An operator spawned an entity.
    #[serde(rename = "admin:spawn")]
    AdminSpawn(SpawnRequest),
}

impl InboundEvent {
    /// Wire name of this event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            InboundEvent::PlayerConnect { .. } => "player:connect",
            InboundEvent::PlayerDisconnect { .. } => "player:disconnect",
            InboundEvent::AdminSave => "admin:save",
            InboundEvent::AdminSpawn(_) => "admin:spawn",
        }
    }
}

/// Events the world manager emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum WorldEvent {
    /// A player finished connecting.
    #[serde(rename = "player:connected")]
    PlayerConnected {
        /// Player id.
        player_id: EntityId,
        /// Display name.
        username: String,
        /// Spawn position.
        position: Vec3Fixed,
        /// Clock time in milliseconds.
        timestamp: u64,
    },
    /// A player left.
    #[serde(rename = "player:disconnected")]
    PlayerDisconnected {
        /// Player id.
        player_id: EntityId,
        /// Clock time in milliseconds.
        timestamp: u64,
    },
    /// World time advanced.
    #[serde(rename = "world:time")]
    Time {
        /// World time in seconds since initialization.
        time: u64,
    },
    /// World state should be persisted.
    #[serde(rename = "world:save")]
    Save {
        /// Clock time in milliseconds.
        timestamp: u64,
        /// Entities in the store.
        entity_count: usize,
        /// Connected players.
        player_count: usize,
    },
    /// An entity was placed by an admin spawn.
    #[serde(rename = "world:entity_spawned")]
    EntitySpawned {
        /// Entity id.
        id: EntityId,
        /// Entity type.
        #[serde(rename = "type")]
        kind: String,
        /// Spawn position.
        position: Vec3Fixed,
    },
}

impl WorldEvent {
    /// Wire name of this event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            WorldEvent::PlayerConnected { .. } => "player:connected",
            WorldEvent::PlayerDisconnected { .. } => "player:disconnected",
            WorldEvent::Time { .. } => "world:time",
            WorldEvent::Save { .. } => "world:save",
            WorldEvent::EntitySpawned { .. } => "world:entity_spawned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(InboundEvent::AdminSave.event_name(), "admin:save");
        assert_eq!(WorldEvent::Time { time: 3 }.event_name(), "world:time");
    }

    #[test]
    fn test_spawn_event_name() {
        let request = SpawnRequest {
            kind: "npc".to_string(),
            id: EntityId::new("goblin").unwrap(),
            position: Vec3Fixed::ZERO,
            metadata: None,
        };
        assert_eq!(InboundEvent::AdminSpawn(request).event_name(), "admin:spawn");
    }
}
