//! Reusable world fixtures.
//!
//! [`sample_world`] spawns one entity of every typed kind plus one
//! unclassified entity and one that the host has not registered yet.

use std::sync::Arc;

use tether_core::{EntityId, EntityKind, HostRef, Vector3};

use crate::host::MockHost;

/// A populated mock host and handles to the entities in it.
pub struct SampleWorld {
    pub host: Arc<MockHost>,
    pub grid: HostRef,
    pub character: HostRef,
    pub voxel: HostRef,
    pub floating: HostRef,
    pub meteor: HostRef,
    /// Kind with no typed wrapper.
    pub unknown: HostRef,
    /// In the scene but still carrying id 0.
    pub unregistered: HostRef,
}

impl SampleWorld {
    /// Every entity in spawn order.
    pub fn all(&self) -> Vec<HostRef> {
        vec![
            self.grid.clone(),
            self.character.clone(),
            self.voxel.clone(),
            self.floating.clone(),
            self.meteor.clone(),
            self.unknown.clone(),
            self.unregistered.clone(),
        ]
    }
}

/// Seven entities, ids 1..=6 plus one unassigned.
pub fn sample_world() -> SampleWorld {
    let host = Arc::new(MockHost::new());
    let grid = host.spawn(EntityKind::CubeGrid, EntityId(1), Vector3::new(10.0, 0.0, 0.0));
    host.edit(&grid, |s| s.name = "Red Ship".into());
    let character = host.spawn(EntityKind::Character, EntityId(2), Vector3::new(0.0, 2.0, 0.0));
    let voxel = host.spawn(EntityKind::VoxelMap, EntityId(3), Vector3::new(-500.0, 0.0, 0.0));
    let floating = host.spawn(EntityKind::FloatingObject, EntityId(4), Vector3::new(1.0, 1.0, 1.0));
    let meteor = host.spawn(EntityKind::Meteor, EntityId(5), Vector3::new(0.0, 900.0, 0.0));
    let unknown = host.spawn(EntityKind::Other(42), EntityId(6), Vector3::ZERO);
    let unregistered = host.spawn(EntityKind::CubeGrid, EntityId::NONE, Vector3::ZERO);
    SampleWorld {
        host,
        grid,
        character,
        voxel,
        floating,
        meteor,
        unknown,
        unregistered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_world_populates_scene() {
        let world = sample_world();
        assert_eq!(world.host.scene_len(), 7);
        assert!(world.all().iter().all(|e| world.host.in_scene(e)));
        let grid = world.host.state_of(&world.grid).unwrap();
        assert_eq!(grid.name, "Red Ship");
    }
}
