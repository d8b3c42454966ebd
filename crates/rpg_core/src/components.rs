//! Entity data shapes shared by the store, navigation and world manager.
//!
//! Components are pure data with no behavior.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Vec3Fixed;

/// Unique identifier for entities and players.
///
/// Ordered so that every sweep over entities iterates in the same order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id, rejecting blank strings.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(GameError::InvalidEntityId(id));
        }
        Ok(Self(id))
    }

    /// Whether this id can address an entity.
    ///
    /// Ids built through [`EntityId::new`] are always valid; ids that arrive
    /// through deserialization are checked at the point of use.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a presentation-layer node that mirrors an entity's position.
///
/// The node itself belongs to the renderer; the simulation only writes
/// the latest position into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderNode {
    /// Opaque handle assigned by the presentation layer.
    pub handle: u64,
    /// Last position written by the simulation.
    pub position: Vec3Fixed,
}

impl RenderNode {
    /// Create a node handle at the given position.
    #[must_use]
    pub const fn new(handle: u64, position: Vec3Fixed) -> Self {
        Self { handle, position }
    }

    /// Mirror a simulation position onto the node.
    pub fn sync(&mut self, position: Vec3Fixed) {
        self.position = position;
    }
}

/// A world entity as seen by the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Free-form entity type, e.g. `"npc"` or `"item"`.
    pub kind: String,
    /// World position.
    pub position: Vec3Fixed,
    /// Presentation node mirrored on every position write.
    pub render_node: Option<RenderNode>,
    /// Arbitrary key/value data attached by spawners.
    pub metadata: BTreeMap<String, String>,
}

impl Entity {
    /// Create an entity with no render node and no metadata.
    #[must_use]
    pub fn new(id: EntityId, kind: impl Into<String>, position: Vec3Fixed) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            render_node: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a render node.
    #[must_use]
    pub fn with_render_node(mut self, node: RenderNode) -> Self {
        self.render_node = Some(node);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_rejects_blank() {
        assert!(EntityId::new("").is_err());
        assert!(EntityId::new("   ").is_err());
        assert_eq!(EntityId::new("goblin-1").unwrap().as_str(), "goblin-1");
    }

    #[test]
    fn test_deserialized_blank_id_is_invalid() {
        let id: EntityId = ron::from_str("\"\"").unwrap();
        assert!(!id.is_valid());
    }

    #[test]
    fn test_entity_ids_order_lexically() {
        let mut ids = vec![
            EntityId::new("b").unwrap(),
            EntityId::new("a").unwrap(),
            EntityId::new("c").unwrap(),
        ];
        ids.sort();
        let names: Vec<_> = ids.iter().map(EntityId::as_str).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
