//! Typed per-entity facade.
//!
//! A [`BaseEntity`] pairs an opaque entity reference with the descriptor
//! read when it was enumerated. Getters read the descriptor; setters
//! update it locally, mark the entity changed, and schedule the matching
//! mutation. Nothing here touches the host directly except
//! [`BaseEntity::id`] when the descriptor carries no id.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tether_binding::BindingResolver;
use tether_core::{
    ActionSeq, EntityDescriptor, EntityId, EntityKind, HostError, HostRef, MutationKind,
    PositionAndOrientation, QueueError, Vector3,
};

use crate::queue::MutationQueue;

/// An entity of any kind.
#[derive(Clone)]
pub struct BaseEntity {
    entity: HostRef,
    descriptor: EntityDescriptor,
    changed: bool,
    queue: MutationQueue,
    resolver: Arc<BindingResolver>,
}

impl BaseEntity {
    /// Wrap `entity` with its descriptor.
    pub fn new(
        entity: HostRef,
        descriptor: EntityDescriptor,
        queue: MutationQueue,
        resolver: Arc<BindingResolver>,
    ) -> Self {
        Self {
            entity,
            descriptor,
            changed: false,
            queue,
            resolver,
        }
    }

    /// The opaque host reference.
    pub fn entity(&self) -> &HostRef {
        &self.entity
    }

    /// The local descriptor, including unsent setter changes.
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Kind discriminant.
    pub fn kind(&self) -> EntityKind {
        self.descriptor.kind
    }

    /// Whether a setter changed the local descriptor.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Entity id from the descriptor, or the live id when the descriptor has none.
    pub fn id(&self) -> Result<EntityId, HostError> {
        if self.descriptor.entity_id.is_assigned() {
            return Ok(self.descriptor.entity_id);
        }
        self.resolver.entity_id(&self.entity)
    }

    /// Descriptor name, or the kind name when the name is empty.
    pub fn display_name(&self) -> &str {
        if self.descriptor.name.is_empty() {
            self.descriptor.kind.name()
        } else {
            &self.descriptor.name
        }
    }

    fn placement(&self) -> PositionAndOrientation {
        self.descriptor.placement.unwrap_or_default()
    }

    fn placement_mut(&mut self) -> &mut PositionAndOrientation {
        self.descriptor.placement.get_or_insert_with(Default::default)
    }

    /// World position.
    pub fn position(&self) -> Vector3 {
        self.placement().position
    }

    /// Up basis vector.
    pub fn up(&self) -> Vector3 {
        self.placement().up
    }

    /// Forward basis vector.
    pub fn forward(&self) -> Vector3 {
        self.placement().forward
    }

    /// Move the entity. `Ok(None)` when `position` is already current.
    pub fn set_position(&mut self, position: Vector3) -> Result<Option<ActionSeq>, QueueError> {
        if self.position() == position {
            return Ok(None);
        }
        self.placement_mut().position = position;
        self.changed = true;
        self.schedule(MutationKind::SetPosition, Some(position)).map(Some)
    }

    /// Replace the up vector. `Ok(None)` when unchanged.
    pub fn set_up(&mut self, up: Vector3) -> Result<Option<ActionSeq>, QueueError> {
        if self.up() == up {
            return Ok(None);
        }
        self.placement_mut().up = up;
        self.changed = true;
        self.schedule(MutationKind::SetUp, Some(up)).map(Some)
    }

    /// Replace the forward vector. `Ok(None)` when unchanged.
    pub fn set_forward(&mut self, forward: Vector3) -> Result<Option<ActionSeq>, QueueError> {
        if self.forward() == forward {
            return Ok(None);
        }
        self.placement_mut().forward = forward;
        self.changed = true;
        self.schedule(MutationKind::SetForward, Some(forward)).map(Some)
    }

    /// Set linear velocity.
    pub fn set_velocity(&mut self, velocity: Vector3) -> Result<ActionSeq, QueueError> {
        self.changed = true;
        self.schedule(MutationKind::SetVelocity, Some(velocity))
    }

    /// Set angular velocity.
    pub fn set_angular_velocity(&mut self, velocity: Vector3) -> Result<ActionSeq, QueueError> {
        self.changed = true;
        self.schedule(MutationKind::SetAngularVelocity, Some(velocity))
    }

    /// Add the entity to the world and broadcast it.
    pub fn add_to_world(&self) -> Result<ActionSeq, QueueError> {
        self.schedule(MutationKind::Add, None)
    }

    /// Remove the entity from the world.
    pub fn remove_from_world(&self) -> Result<ActionSeq, QueueError> {
        self.schedule(MutationKind::Remove, None)
    }

    fn schedule(&self, kind: MutationKind, payload: Option<Vector3>) -> Result<ActionSeq, QueueError> {
        self.queue.schedule(kind, self.entity.clone(), payload)
    }
}

impl fmt::Debug for BaseEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseEntity")
            .field("entity", &self.entity)
            .field("descriptor", &self.descriptor)
            .field("changed", &self.changed)
            .finish()
    }
}

/// A typed wrapper for one entity kind.
pub trait EntityClass: Sized {
    /// The kind this wrapper accepts.
    const KIND: EntityKind;

    /// Wrap a base entity already known to be of [`KIND`](EntityClass::KIND).
    fn from_base(base: BaseEntity) -> Self;

    /// The wrapped base entity.
    fn base(&self) -> &BaseEntity;

    /// Wrap `base` if its kind matches.
    fn try_from_base(base: BaseEntity) -> Option<Self> {
        (base.kind() == Self::KIND).then(|| Self::from_base(base))
    }
}

macro_rules! entity_class {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name(BaseEntity);

        impl EntityClass for $name {
            const KIND: EntityKind = $kind;

            fn from_base(base: BaseEntity) -> Self {
                Self(base)
            }

            fn base(&self) -> &BaseEntity {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = BaseEntity;

            fn deref(&self) -> &BaseEntity {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut BaseEntity {
                &mut self.0
            }
        }
    };
}

entity_class!(
    /// A ship or station.
    CubeGrid => EntityKind::CubeGrid
);
entity_class!(
    /// A player or NPC body.
    Character => EntityKind::Character
);
entity_class!(
    /// An asteroid or terrain volume.
    VoxelMap => EntityKind::VoxelMap
);
entity_class!(
    /// A loose item.
    FloatingObject => EntityKind::FloatingObject
);
entity_class!(
    /// A meteor.
    Meteor => EntityKind::Meteor
);
