//! The identifier table: role → opaque host handle.
//!
//! All host-specific magic values live here. Adapting to a new host
//! build means editing [`STANDARD_IDENTIFIERS`]; nothing else in the
//! workspace names a host handle.

use indexmap::IndexMap;
use tether_core::{BindingError, Role};

/// Role names the bridge resolves.
pub mod roles {
    use tether_core::Role;

    /// Object manager type.
    pub const OBJECT_MANAGER: Role = Role::new("ObjectManager");
    /// Static field holding the object manager's resource lock.
    pub const OBJECT_MANAGER_RESOURCE_LOCK: Role = Role::new("ObjectManager.ResourceLock");
    /// Static accessor for the live entity set.
    pub const OBJECT_MANAGER_ENTITY_SET: Role = Role::new("ObjectManager.GetEntityHashSet");
    /// Static `(entity, insert_into_scene)` add call.
    pub const OBJECT_MANAGER_ADD_ENTITY: Role = Role::new("ObjectManager.AddEntity");

    /// Network serializer type.
    pub const NETWORK_SERIALIZER: Role = Role::new("NetworkSerializer");
    /// Static broadcast of an entity descriptor to connected clients.
    pub const NETWORK_SERIALIZER_SEND_ENTITY: Role = Role::new("NetworkSerializer.SendEntity");

    /// Utility type.
    pub const UTILITY: Role = Role::new("Utility");
    /// Static entity id generator.
    pub const UTILITY_GENERATE_ENTITY_ID: Role = Role::new("Utility.GenerateEntityId");

    /// Base entity type.
    pub const ENTITY: Role = Role::new("Entity");
    /// Instance accessor for the entity's physics component.
    pub const ENTITY_PHYSICS_OBJECT: Role = Role::new("Entity.GetPhysicsObject");
    /// Instance field holding the entity id (write).
    pub const ENTITY_ID_FIELD: Role = Role::new("Entity.EntityIdField");
    /// Instance accessor for the entity id (read).
    pub const ENTITY_GET_ID: Role = Role::new("Entity.GetEntityId");
    /// Instance accessor for the entity descriptor.
    pub const ENTITY_GET_DESCRIPTOR: Role = Role::new("Entity.GetObjectBuilder");
    /// Instance close (removal) call.
    pub const ENTITY_CLOSE: Role = Role::new("Entity.Close");
    /// Instance accessor for the `(forward, up)` orientation basis.
    pub const ENTITY_GET_ORIENTATION: Role = Role::new("Entity.GetOrientation");
    /// Instance setter for the `(forward, up)` orientation basis.
    pub const ENTITY_SET_ORIENTATION: Role = Role::new("Entity.SetOrientation");

    /// Physics component type.
    pub const PHYSICS_OBJECT: Role = Role::new("PhysicsObject");
    /// Instance accessor for the physics component's rigid body.
    pub const PHYSICS_OBJECT_RIGID_BODY: Role = Role::new("PhysicsObject.GetRigidBody");

    /// Rigid body type.
    pub const RIGID_BODY: Role = Role::new("RigidBody");
    /// Rigid body position getter.
    pub const RIGID_BODY_GET_POSITION: Role = Role::new("RigidBody.GetPosition");
    /// Rigid body position setter.
    pub const RIGID_BODY_SET_POSITION: Role = Role::new("RigidBody.SetPosition");
    /// Rigid body linear velocity setter.
    pub const RIGID_BODY_SET_LINEAR_VELOCITY: Role = Role::new("RigidBody.SetLinearVelocity");
    /// Rigid body angular velocity setter.
    pub const RIGID_BODY_SET_ANGULAR_VELOCITY: Role = Role::new("RigidBody.SetAngularVelocity");
}

/// The compiled-in `(role, handle)` list for the supported host build.
pub const STANDARD_IDENTIFIERS: &[(Role, &str)] = &[
    (
        roles::OBJECT_MANAGER,
        "5BCAC68007431E61367F5B2CF24E2D6F.CAF1EB435F77C7B77580E2E16F988BED",
    ),
    (roles::OBJECT_MANAGER_RESOURCE_LOCK, "6EF7F983A8061B40A5606D75C890AF07"),
    (roles::OBJECT_MANAGER_ENTITY_SET, "84C54760C0F0DDDA50B0BE27B7116ED8"),
    (roles::OBJECT_MANAGER_ADD_ENTITY, "E5E18F5CAD1F62BB276DF991F20AE6AF"),
    (
        roles::NETWORK_SERIALIZER,
        "5F381EA9388E0A32A8C817841E192BE8.8EFE49A46AB934472427B7D117FD3C64",
    ),
    (roles::NETWORK_SERIALIZER_SEND_ENTITY, "A6B585C993B43E72219511726BBB0649"),
    (
        roles::UTILITY,
        "5BCAC68007431E61367F5B2CF24E2D6F.226D9974B43A7269CDD3E322CC8110D5",
    ),
    (roles::UTILITY_GENERATE_ENTITY_ID, "3B4924802BEBD1AE13B29920376CE914"),
    (
        roles::ENTITY,
        "5BCAC68007431E61367F5B2CF24E2D6F.F6DF01EE4159339113BB9650DEEE1913",
    ),
    (roles::ENTITY_PHYSICS_OBJECT, "691FA4830C80511C934826203A251981"),
    (roles::ENTITY_ID_FIELD, "F7E51DBA5F2FD0CCF8BBE66E3573BEAC"),
    (roles::ENTITY_GET_ID, "53C3FFA07960404AABBEAAF931E5487E"),
    (roles::ENTITY_GET_DESCRIPTOR, "GetObjectBuilder"),
    (roles::ENTITY_CLOSE, "Close"),
    (roles::ENTITY_GET_ORIENTATION, "get_Orientation"),
    (roles::ENTITY_SET_ORIENTATION, "set_Orientation"),
    (roles::PHYSICS_OBJECT, "Sandbox.Engine.Physics.MyPhysicsBody"),
    (roles::PHYSICS_OBJECT_RIGID_BODY, "634E5EC534E45874230868BD089055B1"),
    (roles::RIGID_BODY, "Havok.HkRigidBody"),
    (roles::RIGID_BODY_GET_POSITION, "get_Position"),
    (roles::RIGID_BODY_SET_POSITION, "set_Position"),
    (roles::RIGID_BODY_SET_LINEAR_VELOCITY, "set_LinearVelocity"),
    (roles::RIGID_BODY_SET_ANGULAR_VELOCITY, "set_AngularVelocity"),
];

/// One row of the identifier table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierEntry {
    /// Symbolic role.
    pub role: Role,
    /// Opaque handle understood by the host's loader.
    pub handle: &'static str,
}

/// Read-only role → handle mapping.
///
/// Built once from a literal list. There is no mutation API; a new host
/// build gets a new list.
#[derive(Clone, Debug)]
pub struct IdentifierTable {
    entries: IndexMap<&'static str, IdentifierEntry>,
}

impl IdentifierTable {
    /// Build a table from a literal list, rejecting duplicate roles.
    pub fn from_entries(list: &[(Role, &'static str)]) -> Result<Self, BindingError> {
        let mut entries = IndexMap::with_capacity(list.len());
        for &(role, handle) in list {
            let entry = IdentifierEntry { role, handle };
            if entries.insert(role.as_str(), entry).is_some() {
                return Err(BindingError::DuplicateRole {
                    role: role.as_str().to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// The table for the supported host build.
    ///
    /// # Panics
    ///
    /// Panics if [`STANDARD_IDENTIFIERS`] lists a role twice.
    pub fn standard() -> Self {
        match Self::from_entries(STANDARD_IDENTIFIERS) {
            Ok(table) => table,
            Err(e) => panic!("standard identifier table is malformed: {e}"),
        }
    }

    /// Handle for `role`, or `UnknownRole`.
    pub fn lookup(&self, role: &str) -> Result<&'static str, BindingError> {
        self.entries
            .get(role)
            .map(|e| e.handle)
            .ok_or_else(|| BindingError::UnknownRole {
                role: role.to_string(),
            })
    }

    /// Full entry for `role`.
    pub fn entry(&self, role: &str) -> Option<&IdentifierEntry> {
        self.entries.get(role)
    }

    /// Owning type role of a member role present in the table.
    ///
    /// `None` for type roles, for roles not in the table, and for member
    /// roles whose owner is missing.
    pub fn owner_of(&self, role: &str) -> Option<Role> {
        let owner = self.entries.get(role)?.role.owner()?;
        self.entries.get(owner).map(|e| e.role)
    }

    /// Whether `role` is present.
    pub fn contains(&self, role: &str) -> bool {
        self.entries.contains_key(role)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &IdentifierEntry> {
        self.entries.values()
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_builds() {
        let table = IdentifierTable::standard();
        assert_eq!(table.len(), STANDARD_IDENTIFIERS.len());
        assert_eq!(
            table.lookup("ObjectManager.AddEntity"),
            Ok("E5E18F5CAD1F62BB276DF991F20AE6AF")
        );
    }

    #[test]
    fn every_member_role_has_its_owner_type() {
        let table = IdentifierTable::standard();
        for entry in table.entries() {
            if let Some(owner) = entry.role.owner() {
                assert!(
                    table.contains(owner),
                    "member role {} has no owner type {owner}",
                    entry.role
                );
            }
        }
    }

    #[test]
    fn owner_of_member_and_type() {
        let table = IdentifierTable::standard();
        assert_eq!(table.owner_of("RigidBody.SetPosition"), Some(roles::RIGID_BODY));
        assert_eq!(table.owner_of("RigidBody"), None);
        assert_eq!(table.owner_of("Nope.Close"), None);
    }

    #[test]
    fn unknown_role_is_reported() {
        let table = IdentifierTable::standard();
        assert_eq!(
            table.lookup("Entity.Teleport"),
            Err(BindingError::UnknownRole {
                role: "Entity.Teleport".into()
            })
        );
    }

    #[test]
    fn duplicate_roles_are_rejected() {
        let list = [
            (roles::ENTITY, "A"),
            (roles::ENTITY_CLOSE, "Close"),
            (roles::ENTITY, "B"),
        ];
        let err = IdentifierTable::from_entries(&list).unwrap_err();
        assert_eq!(
            err,
            BindingError::DuplicateRole {
                role: "Entity".into()
            }
        );
    }

    #[test]
    fn entries_keep_declaration_order() {
        let list = [(roles::UTILITY, "U"), (roles::ENTITY, "E")];
        let table = IdentifierTable::from_entries(&list).unwrap();
        let order: Vec<_> = table.entries().map(|e| e.role.as_str()).collect();
        assert_eq!(order, vec!["Utility", "Entity"]);
    }
}
