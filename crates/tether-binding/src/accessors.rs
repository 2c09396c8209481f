//! Typed accessors over the dynamic host calls.
//!
//! These are the only functions in the workspace that know which role
//! answers which question. Each one resolves its role through the
//! [`BindingResolver`], invokes it, and checks the shape of the result.

use std::sync::Arc;

use smallvec::smallvec;

use tether_core::{
    Args, EntityDescriptor, EntityId, HostError, HostLock, HostRef, HostValue, InvocationError,
    Role, Vector3,
};

use crate::resolver::BindingResolver;
use crate::table::roles;

fn unexpected(role: Role, expected: &'static str, found: &HostValue) -> InvocationError {
    InvocationError::UnexpectedValue {
        role: role.as_str().to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Expect an integer result.
pub fn into_int(role: Role, value: HostValue) -> Result<i64, InvocationError> {
    match value {
        HostValue::Int(v) => Ok(v),
        other => Err(unexpected(role, "int", &other)),
    }
}

/// Expect a vector result.
pub fn into_vector(role: Role, value: HostValue) -> Result<Vector3, InvocationError> {
    match value {
        HostValue::Vector(v) => Ok(v),
        other => Err(unexpected(role, "vector", &other)),
    }
}

/// Expect an orientation result, as `(forward, up)`.
pub fn into_orientation(role: Role, value: HostValue) -> Result<(Vector3, Vector3), InvocationError> {
    match value {
        HostValue::Orientation { forward, up } => Ok((forward, up)),
        other => Err(unexpected(role, "orientation", &other)),
    }
}

/// Expect a single object result.
pub fn into_object(role: Role, value: HostValue) -> Result<HostRef, InvocationError> {
    match value {
        HostValue::Object(r) => Ok(r),
        other => Err(unexpected(role, "object", &other)),
    }
}

/// Expect an object collection result.
pub fn into_objects(role: Role, value: HostValue) -> Result<Vec<HostRef>, InvocationError> {
    match value {
        HostValue::Objects(v) => Ok(v),
        other => Err(unexpected(role, "objects", &other)),
    }
}

/// Expect an entity descriptor result.
pub fn into_descriptor(role: Role, value: HostValue) -> Result<EntityDescriptor, InvocationError> {
    match value {
        HostValue::Descriptor(d) => Ok(d),
        other => Err(unexpected(role, "descriptor", &other)),
    }
}

/// Expect a lock result.
pub fn into_lock(role: Role, value: HostValue) -> Result<Arc<dyn HostLock>, InvocationError> {
    match value {
        HostValue::Lock(l) => Ok(l),
        other => Err(unexpected(role, "lock", &other)),
    }
}

impl BindingResolver {
    /// The object manager's resource lock.
    pub fn resource_lock(&self) -> Result<Arc<dyn HostLock>, HostError> {
        let role = roles::OBJECT_MANAGER_RESOURCE_LOCK;
        Ok(into_lock(role, self.call(role, None, &[])?)?)
    }

    /// The object manager's live entity set, exactly as the host returns it.
    ///
    /// Callers must hold the resource lock; see the enumerator.
    pub fn live_entities(&self) -> Result<Vec<HostRef>, HostError> {
        let role = roles::OBJECT_MANAGER_ENTITY_SET;
        Ok(into_objects(role, self.call(role, None, &[])?)?)
    }

    /// Insert `entity` into the host scene.
    pub fn add_entity(&self, entity: &HostRef) -> Result<(), HostError> {
        let args: Args = smallvec![HostValue::Object(entity.clone()), HostValue::Bool(true)];
        self.call(roles::OBJECT_MANAGER_ADD_ENTITY, None, &args)?;
        Ok(())
    }

    /// Broadcast an entity descriptor to the host's network observers.
    pub fn send_entity(&self, descriptor: &EntityDescriptor) -> Result<(), HostError> {
        let args: Args = smallvec![HostValue::Descriptor(descriptor.clone())];
        self.call(roles::NETWORK_SERIALIZER_SEND_ENTITY, None, &args)?;
        Ok(())
    }

    /// Ask the host for a fresh entity id.
    pub fn generate_entity_id(&self) -> Result<EntityId, HostError> {
        let role = roles::UTILITY_GENERATE_ENTITY_ID;
        Ok(EntityId(into_int(role, self.call(role, None, &[])?)?))
    }

    /// Live entity id of `entity`.
    pub fn entity_id(&self, entity: &HostRef) -> Result<EntityId, HostError> {
        let role = roles::ENTITY_GET_ID;
        Ok(EntityId(into_int(role, self.call(role, Some(entity), &[])?)?))
    }

    /// Overwrite the entity id field of `entity`.
    pub fn set_entity_id(&self, entity: &HostRef, id: EntityId) -> Result<(), HostError> {
        let args: Args = smallvec![HostValue::from(id)];
        self.call(roles::ENTITY_ID_FIELD, Some(entity), &args)?;
        Ok(())
    }

    /// The entity's descriptor ("object builder").
    pub fn descriptor(&self, entity: &HostRef) -> Result<EntityDescriptor, HostError> {
        let role = roles::ENTITY_GET_DESCRIPTOR;
        let args: Args = smallvec![HostValue::Bool(false)];
        Ok(into_descriptor(role, self.call(role, Some(entity), &args)?)?)
    }

    /// Close (remove) the entity.
    pub fn close_entity(&self, entity: &HostRef) -> Result<(), HostError> {
        self.call(roles::ENTITY_CLOSE, Some(entity), &[])?;
        Ok(())
    }

    /// `(forward, up)` orientation of the entity.
    pub fn orientation(&self, entity: &HostRef) -> Result<(Vector3, Vector3), HostError> {
        let role = roles::ENTITY_GET_ORIENTATION;
        Ok(into_orientation(role, self.call(role, Some(entity), &[])?)?)
    }

    /// Replace the entity's orientation basis.
    pub fn set_orientation(
        &self,
        entity: &HostRef,
        forward: Vector3,
        up: Vector3,
    ) -> Result<(), HostError> {
        let args: Args = smallvec![HostValue::Orientation { forward, up }];
        self.call(roles::ENTITY_SET_ORIENTATION, Some(entity), &args)?;
        Ok(())
    }

    /// The entity's rigid body, through its physics component.
    pub fn rigid_body(&self, entity: &HostRef) -> Result<HostRef, HostError> {
        let role = roles::ENTITY_PHYSICS_OBJECT;
        let physics = into_object(role, self.call(role, Some(entity), &[])?)?;
        let role = roles::PHYSICS_OBJECT_RIGID_BODY;
        Ok(into_object(role, self.call(role, Some(&physics), &[])?)?)
    }

    /// Current physical position of the entity's rigid body.
    pub fn body_position(&self, entity: &HostRef) -> Result<Vector3, HostError> {
        let body = self.rigid_body(entity)?;
        let role = roles::RIGID_BODY_GET_POSITION;
        Ok(into_vector(role, self.call(role, Some(&body), &[])?)?)
    }

    /// Move the entity's rigid body.
    pub fn set_body_position(&self, entity: &HostRef, position: Vector3) -> Result<(), HostError> {
        self.set_body_vector(entity, roles::RIGID_BODY_SET_POSITION, position)
    }

    /// Set the rigid body's linear velocity.
    pub fn set_body_velocity(&self, entity: &HostRef, velocity: Vector3) -> Result<(), HostError> {
        self.set_body_vector(entity, roles::RIGID_BODY_SET_LINEAR_VELOCITY, velocity)
    }

    /// Set the rigid body's angular velocity.
    pub fn set_body_angular_velocity(
        &self,
        entity: &HostRef,
        velocity: Vector3,
    ) -> Result<(), HostError> {
        self.set_body_vector(entity, roles::RIGID_BODY_SET_ANGULAR_VELOCITY, velocity)
    }

    fn set_body_vector(&self, entity: &HostRef, role: Role, value: Vector3) -> Result<(), HostError> {
        let body = self.rigid_body(entity)?;
        let args: Args = smallvec![HostValue::Vector(value)];
        self.call(role, Some(&body), &args)?;
        Ok(())
    }
}
