//! Opaque host references and the dynamic value type.
//!
//! The bridge never looks inside a host object. A [`HostRef`] is an
//! identity-compared handle that is only ever passed back to the host's
//! own accessors; a [`HostValue`] is what crosses the boundary on every
//! dynamic call.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::id::EntityId;
use crate::kind::EntityDescriptor;
use crate::math::Vector3;
use crate::traits::HostLock;

/// Argument list for a dynamic host call.
///
/// Host members take at most a couple of arguments, so the list stays
/// inline.
pub type Args = SmallVec<[HostValue; 2]>;

/// Opaque, identity-compared reference to a host object.
///
/// Two `HostRef`s are equal iff they refer to the same host allocation.
/// Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct HostRef {
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostRef {
    /// Wrap a fresh host object.
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        Self {
            inner: Arc::new(object),
        }
    }

    /// Wrap an already shared host object, preserving its identity.
    pub fn from_arc(inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self { inner }
    }

    /// Borrow the underlying object as `T`, for host implementations.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Address of the referenced allocation. Stable for the object's lifetime.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }
}

impl PartialEq for HostRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for HostRef {}

impl Hash for HostRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostRef({:#x})", self.addr())
    }
}

/// A value crossing the host boundary.
#[derive(Clone)]
pub enum HostValue {
    /// No value (void return).
    Unit,
    /// Boolean.
    Bool(bool),
    /// Integer (host `long`).
    Int(i64),
    /// Floating point.
    Float(f64),
    /// String.
    Text(String),
    /// Three-component vector.
    Vector(Vector3),
    /// Orientation basis as `(forward, up)`.
    Orientation {
        /// Forward basis vector.
        forward: Vector3,
        /// Up basis vector.
        up: Vector3,
    },
    /// A single host object.
    Object(HostRef),
    /// A collection of host objects.
    Objects(Vec<HostRef>),
    /// An entity's self-description.
    Descriptor(EntityDescriptor),
    /// The host's resource lock.
    Lock(Arc<dyn HostLock>),
}

impl HostValue {
    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Vector(_) => "vector",
            Self::Orientation { .. } => "orientation",
            Self::Object(_) => "object",
            Self::Objects(_) => "objects",
            Self::Descriptor(_) => "descriptor",
            Self::Lock(_) => "lock",
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Vector(v) => f.debug_tuple("Vector").field(v).finish(),
            Self::Orientation { forward, up } => f
                .debug_struct("Orientation")
                .field("forward", forward)
                .field("up", up)
                .finish(),
            Self::Object(r) => f.debug_tuple("Object").field(r).finish(),
            Self::Objects(v) => write!(f, "Objects(len={})", v.len()),
            Self::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
            Self::Lock(_) => f.write_str("Lock(..)"),
        }
    }
}

impl From<Vector3> for HostValue {
    fn from(v: Vector3) -> Self {
        Self::Vector(v)
    }
}

impl From<HostRef> for HostValue {
    fn from(r: HostRef) -> Self {
        Self::Object(r)
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<EntityId> for HostValue {
    fn from(id: EntityId) -> Self {
        Self::Int(id.0)
    }
}

impl From<EntityDescriptor> for HostValue {
    fn from(d: EntityDescriptor) -> Self {
        Self::Descriptor(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn clones_share_identity() {
        let a = HostRef::new(5u32);
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.addr(), b.addr());
    }

    #[test]
    fn equal_payloads_are_distinct_objects() {
        let a = HostRef::new(5u32);
        let b = HostRef::new(5u32);
        assert_ne!(a, b);
    }

    #[test]
    fn identity_set_dedups_clones() {
        let a = HostRef::new("grid");
        let b = HostRef::new("grid");
        let set: HashSet<HostRef> = [a.clone(), a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn downcast_recovers_payload() {
        let r = HostRef::new(42i64);
        assert_eq!(r.downcast_ref::<i64>(), Some(&42));
        assert!(r.downcast_ref::<u8>().is_none());
    }

    #[test]
    fn type_names_are_stable() {
        assert_eq!(HostValue::Unit.type_name(), "unit");
        assert_eq!(HostValue::from(Vector3::ZERO).type_name(), "vector");
        assert_eq!(HostValue::from(EntityId(3)).type_name(), "int");
    }
}
