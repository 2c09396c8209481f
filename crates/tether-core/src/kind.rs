//! Entity kinds and the host's entity descriptor.

use std::fmt;

use crate::id::EntityId;
use crate::math::PositionAndOrientation;

/// Discriminant the host reports for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A grid of blocks (ship or station).
    CubeGrid,
    /// A player or NPC body.
    Character,
    /// An asteroid or terrain volume.
    VoxelMap,
    /// A loose item floating in the world.
    FloatingObject,
    /// A meteor.
    Meteor,
    /// A kind the bridge has no typed wrapper for, with the host's raw code.
    Other(u32),
}

impl EntityKind {
    /// Name of the kind, used as a display-name fallback.
    pub fn name(self) -> &'static str {
        match self {
            Self::CubeGrid => "CubeGrid",
            Self::Character => "Character",
            Self::VoxelMap => "VoxelMap",
            Self::FloatingObject => "FloatingObject",
            Self::Meteor => "Meteor",
            Self::Other(_) => "Other",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Other({code})"),
            kind => f.write_str(kind.name()),
        }
    }
}

/// The host's self-description of an entity.
///
/// Returned by the descriptor accessor. The bridge classifies entities
/// by [`kind`](EntityDescriptor::kind) and reads placement from it
/// without touching the live object.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDescriptor {
    /// Kind discriminant.
    pub kind: EntityKind,
    /// Host-assigned id, or [`EntityId::NONE`].
    pub entity_id: EntityId,
    /// Display name; may be empty.
    pub name: String,
    /// Placement, if the entity has one.
    pub placement: Option<PositionAndOrientation>,
}

impl EntityDescriptor {
    /// Descriptor with no name and no placement.
    pub fn new(kind: EntityKind, entity_id: EntityId) -> Self {
        Self {
            kind,
            entity_id,
            name: String::new(),
            placement: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the placement.
    pub fn with_placement(mut self, placement: PositionAndOrientation) -> Self {
        self.placement = Some(placement);
        self
    }
}
