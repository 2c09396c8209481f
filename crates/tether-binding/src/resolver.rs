//! Host binding resolver: resolve-once, read-forever handle cache.
//!
//! [`BindingResolver::initialize`] attaches to the host module and eagerly
//! resolves the object-manager and entity types. Every other role is
//! resolved on first use. Each role owns one `OnceLock` slot, built when
//! the resolver is constructed from the identifier table, so the cache is
//! write-once per role and readers never take a lock.
//!
//! Failures are cached too: a role that does not resolve fails the same
//! way on every call.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use tracing::{info, warn};

use tether_core::{
    BindingError, HostError, HostModule, HostRef, HostValue, InvocationError, LoadGeneration, Role,
};

use crate::table::{roles, IdentifierTable};

/// Types resolved eagerly during [`BindingResolver::initialize`].
pub const REQUIRED_TYPES: [Role; 2] = [roles::OBJECT_MANAGER, roles::ENTITY];

/// A resolved host type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeHandle {
    role: Role,
    token: HostRef,
}

impl TypeHandle {
    /// The role this handle was resolved for.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The host's opaque type token.
    pub fn token(&self) -> &HostRef {
        &self.token
    }
}

/// A resolved host member (method, property accessor, or field).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberHandle {
    role: Role,
    token: HostRef,
}

impl MemberHandle {
    /// The role this handle was resolved for.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The host's opaque member token.
    pub fn token(&self) -> &HostRef {
        &self.token
    }
}

type Slot = OnceLock<Result<HostRef, BindingError>>;

/// Resolves identifier-table roles against the loaded host module.
///
/// There is one resolver per host binding context. It is `Send + Sync`
/// and shared behind an `Arc`; after a role's first resolution every
/// lookup is a plain read.
pub struct BindingResolver {
    module: Arc<dyn HostModule>,
    table: Arc<IdentifierTable>,
    attached: LoadGeneration,
    slots: IndexMap<&'static str, Slot>,
}

// Compile-time assertion: BindingResolver must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<BindingResolver>();
};

impl BindingResolver {
    /// Attach to `module` and resolve the required types.
    ///
    /// Fails with [`BindingError::ModuleLoad`] if the module cannot be
    /// attached and [`BindingError::TypeResolution`] if a required type
    /// is missing. Either is fatal: the bridge cannot run without them.
    pub fn initialize(
        module: Arc<dyn HostModule>,
        table: Arc<IdentifierTable>,
    ) -> Result<Self, BindingError> {
        let attached = module.attach().map_err(|reason| BindingError::ModuleLoad {
            module: module.name().to_string(),
            reason,
        })?;

        let slots = table
            .entries()
            .map(|entry| (entry.role.as_str(), OnceLock::new()))
            .collect();

        let resolver = Self {
            module,
            table,
            attached,
            slots,
        };

        for role in REQUIRED_TYPES {
            resolver.resolve_type(role)?;
        }

        info!(
            module = resolver.module.name(),
            generation = attached.0,
            roles = resolver.table.len(),
            "host bindings initialized"
        );
        Ok(resolver)
    }

    /// The identifier table this resolver reads.
    pub fn table(&self) -> &IdentifierTable {
        &self.table
    }

    /// The host module.
    pub fn module(&self) -> &Arc<dyn HostModule> {
        &self.module
    }

    /// Load generation observed at attach time.
    pub fn attached_generation(&self) -> LoadGeneration {
        self.attached
    }

    /// Number of roles whose resolution has completed (either way).
    pub fn resolved_count(&self) -> usize {
        self.slots.values().filter(|s| s.get().is_some()).count()
    }

    /// Fail if the module was reloaded since attach.
    pub fn ensure_loaded(&self) -> Result<(), BindingError> {
        let current = self.module.load_generation();
        if current != self.attached {
            return Err(BindingError::ModuleReloaded {
                attached: self.attached,
                current,
            });
        }
        Ok(())
    }

    /// Resolve a type role.
    pub fn resolve_type(&self, role: Role) -> Result<TypeHandle, BindingError> {
        self.ensure_loaded()?;
        if role.is_member() {
            return Err(BindingError::TypeResolution {
                role: role.as_str().to_string(),
            });
        }
        let token = self.cached(role, || {
            let handle = self.table.lookup(role.as_str())?;
            self.module
                .resolve_type(handle)
                .ok_or_else(|| BindingError::TypeResolution {
                    role: role.as_str().to_string(),
                })
        })?;
        Ok(TypeHandle { role, token })
    }

    /// Resolve a member role against its owning type.
    pub fn resolve_member(&self, role: Role) -> Result<MemberHandle, BindingError> {
        self.ensure_loaded()?;
        let Some(owner) = role.owner() else {
            return Err(BindingError::MemberResolution {
                role: role.as_str().to_string(),
            });
        };
        let token = self.cached(role, || {
            let handle = self.table.lookup(role.as_str())?;
            let owner_role =
                self.table
                    .owner_of(role.as_str())
                    .ok_or_else(|| BindingError::UnknownRole {
                        role: owner.to_string(),
                    })?;
            let owner_type = self.resolve_type(owner_role)?;
            self.module
                .resolve_member(owner_type.token(), handle)
                .ok_or_else(|| BindingError::MemberResolution {
                    role: role.as_str().to_string(),
                })
        })?;
        Ok(MemberHandle { role, token })
    }

    /// Dynamic call through a resolved member.
    ///
    /// `target` is `None` for static members. A host fault comes back as
    /// [`InvocationError::Faulted`] naming the member's role. A handle
    /// resolved before a module reload is refused with
    /// [`InvocationError::StaleBinding`] and never reaches the host.
    pub fn invoke(
        &self,
        member: &MemberHandle,
        target: Option<&HostRef>,
        args: &[HostValue],
    ) -> Result<HostValue, InvocationError> {
        let current = self.module.load_generation();
        if current != self.attached {
            return Err(InvocationError::StaleBinding {
                role: member.role().as_str().to_string(),
                attached: self.attached,
                current,
            });
        }
        self.module
            .invoke(member.token(), target, args)
            .map_err(|fault| InvocationError::Faulted {
                role: member.role().as_str().to_string(),
                fault,
            })
    }

    /// Resolve `role` and invoke it.
    pub fn call(
        &self,
        role: Role,
        target: Option<&HostRef>,
        args: &[HostValue],
    ) -> Result<HostValue, HostError> {
        let member = self.resolve_member(role)?;
        Ok(self.invoke(&member, target, args)?)
    }

    fn cached(
        &self,
        role: Role,
        resolve: impl FnOnce() -> Result<HostRef, BindingError>,
    ) -> Result<HostRef, BindingError> {
        let Some(slot) = self.slots.get(role.as_str()) else {
            return Err(BindingError::UnknownRole {
                role: role.as_str().to_string(),
            });
        };
        slot.get_or_init(|| {
            let result = resolve();
            if let Err(e) = &result {
                warn!(role = role.as_str(), error = %e, "host binding failed to resolve");
            }
            result
        })
        .clone()
    }
}
