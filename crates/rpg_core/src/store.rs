//! Entity lookup capability and the in-crate entity storage.
//!
//! Navigation and the world manager address entities by id only. They reach
//! positions through [`EntityStore`], which hosts implement once over
//! whatever owns their entities. [`EntityStorage`] is the default
//! implementation used by the server and by tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Entity, EntityId, RenderNode};
use crate::error::{GameError, Result};
use crate::math::Vec3Fixed;

/// Lookup-by-id access to the entities the simulation moves.
///
/// Missing entities are reported as `None`/`false`, never as errors.
pub trait EntityStore {
    /// Current position of an entity.
    fn position(&self, id: &EntityId) -> Option<Vec3Fixed>;

    /// Overwrite an entity's position. Returns `false` if it does not exist.
    fn set_position(&mut self, id: &EntityId, position: Vec3Fixed) -> bool;

    /// Presentation node attached to an entity, if any.
    fn render_node_mut(&mut self, _id: &EntityId) -> Option<&mut RenderNode> {
        None
    }

    /// Register a new entity.
    fn insert(&mut self, entity: Entity) -> Result<()>;

    /// Remove an entity by ID.
    fn remove(&mut self, id: &EntityId) -> Option<Entity>;

    /// Number of entities.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entity ids in ascending order.
    fn ids(&self) -> Vec<EntityId>;
}

/// Storage for all entities known to a world.
///
/// A `BTreeMap` keeps iteration in id order without a separate sort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStorage {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Iterate over all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}

impl EntityStore for EntityStorage {
    fn position(&self, id: &EntityId) -> Option<Vec3Fixed> {
        self.entities.get(id).map(|e| e.position)
    }

    fn set_position(&mut self, id: &EntityId, position: Vec3Fixed) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.position = position;
                true
            }
            None => false,
        }
    }

    fn render_node_mut(&mut self, id: &EntityId) -> Option<&mut RenderNode> {
        self.entities
            .get_mut(id)
            .and_then(|e| e.render_node.as_mut())
    }

    fn insert(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(GameError::DuplicateEntity(entity.id));
        }
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    fn len(&self) -> usize {
        self.entities.len()
    }

    fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = EntityStorage::new();
        store
            .insert(Entity::new(id("cow"), "npc", Vec3Fixed::from_ints(1, 0, 2)))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.position(&id("cow")), Some(Vec3Fixed::from_ints(1, 0, 2)));
        assert_eq!(store.position(&id("missing")), None);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut store = EntityStorage::new();
        store
            .insert(Entity::new(id("cow"), "npc", Vec3Fixed::ZERO))
            .unwrap();
        let err = store
            .insert(Entity::new(id("cow"), "npc", Vec3Fixed::ZERO))
            .unwrap_err();
        assert!(matches!(err, GameError::DuplicateEntity(_)));
    }

    #[test]
    fn test_set_position_on_missing_entity() {
        let mut store = EntityStorage::new();
        assert!(!store.set_position(&id("ghost"), Vec3Fixed::ZERO));
    }

    #[test]
    fn test_ids_are_sorted() {
        let mut store = EntityStorage::new();
        for name in ["zed", "alpha", "mid"] {
            store
                .insert(Entity::new(id(name), "npc", Vec3Fixed::ZERO))
                .unwrap();
        }
        assert_eq!(store.ids(), vec![id("alpha"), id("mid"), id("zed")]);
    }
}
