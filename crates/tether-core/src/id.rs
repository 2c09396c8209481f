//! Strongly-typed identifiers and the [`Role`] name type.

use std::fmt;

/// Identifies an entity inside the host.
///
/// Assigned by the host. `EntityId(0)` is the host's "not yet
/// registered" value; mutations against such entities are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId(pub i64);

impl EntityId {
    /// The unassigned id.
    pub const NONE: EntityId = EntityId(0);

    /// Whether the host has assigned a real id.
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Monotonic submission sequence number assigned by the mutation queue.
///
/// Every scheduled action receives the next value at enqueue time, so
/// ordering by `ActionSeq` is ordering by submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionSeq(pub u64);

impl fmt::Display for ActionSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load generation reported by a host module.
///
/// Changes whenever the host unloads and reloads its module. Resolved
/// bindings are only valid for the generation they were resolved in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadGeneration(pub u64);

impl fmt::Display for LoadGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable symbolic name for a capability the bridge needs from the host.
///
/// Type roles have no dot (`"ObjectManager"`). Member roles are written
/// `"<TypeRole>.<Member>"` and resolve against their owning type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role(&'static str);

impl Role {
    /// Wrap a static role name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The role name.
    pub fn as_str(self) -> &'static str {
        self.0
    }

    /// The owning type role of a member role, or `None` for a type role.
    ///
    /// ```
    /// use tether_core::Role;
    ///
    /// assert_eq!(Role::new("Entity.Close").owner(), Some("Entity"));
    /// assert_eq!(Role::new("Entity").owner(), None);
    /// ```
    pub fn owner(self) -> Option<&'static str> {
        self.0.split_once('.').map(|(owner, _)| owner)
    }

    /// Whether this is a member role.
    pub fn is_member(self) -> bool {
        self.owner().is_some()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
