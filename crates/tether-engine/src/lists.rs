//! Per-kind list builders over a fresh snapshot.

use tether_core::HostError;

use crate::entity::{CubeGrid, Character, EntityClass, FloatingObject, Meteor, VoxelMap};
use crate::enumerate::ObjectGraphEnumerator;

/// Snapshot-and-classify shortcuts, one per typed kind.
///
/// Each call takes its own snapshot.
pub struct EntityLists<'a> {
    enumerator: &'a ObjectGraphEnumerator,
}

impl<'a> EntityLists<'a> {
    /// Lists backed by `enumerator`.
    pub fn new(enumerator: &'a ObjectGraphEnumerator) -> Self {
        Self { enumerator }
    }

    /// Every live entity of kind `K::KIND`.
    pub fn of_kind<K: EntityClass>(&self) -> Result<Vec<K>, HostError> {
        let snapshot = self.enumerator.snapshot_entities()?;
        Ok(self.enumerator.classify(&snapshot))
    }

    /// Live ships and stations.
    pub fn cube_grids(&self) -> Result<Vec<CubeGrid>, HostError> {
        self.of_kind()
    }

    /// Live characters.
    pub fn characters(&self) -> Result<Vec<Character>, HostError> {
        self.of_kind()
    }

    /// Live voxel maps.
    pub fn voxel_maps(&self) -> Result<Vec<VoxelMap>, HostError> {
        self.of_kind()
    }

    /// Live floating objects.
    pub fn floating_objects(&self) -> Result<Vec<FloatingObject>, HostError> {
        self.of_kind()
    }

    /// Live meteors.
    pub fn meteors(&self) -> Result<Vec<Meteor>, HostError> {
        self.of_kind()
    }
}
