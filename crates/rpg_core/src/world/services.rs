//! Collaborators the world manager delegates to.

use crate::components::EntityId;
use crate::error::Result;
use crate::math::Vec3Fixed;
use crate::store::EntityStore;

/// Host-provided hooks for work the simulation core does not own.
///
/// Every method has a do-nothing default.
pub trait WorldServices: Send {
    /// Populate an empty world on first start. Errors abort initialization.
    fn generate_world(&mut self, _store: &mut dyn EntityStore) -> Result<()> {
        Ok(())
    }

    /// Last saved position of a returning player.
    fn saved_position(&self, _player_id: &EntityId) -> Option<Vec3Fixed> {
        None
    }

    /// Periodic sweep of expired state (dropped loot, stale corpses).
    ///
    /// Returns how many items were removed. Errors are logged by the caller
    /// and do not stop later sweeps.
    fn cleanup(&mut self, _store: &mut dyn EntityStore, _now_ms: u64) -> Result<usize> {
        Ok(0)
    }
}

/// Services that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopServices;

impl WorldServices for NoopServices {}
