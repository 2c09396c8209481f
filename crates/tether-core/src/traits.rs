//! Seams between the bridge and the host runtime.

use crate::error::HostFault;
use crate::id::LoadGeneration;
use crate::value::{HostRef, HostValue};

/// The loaded host module, reached only through opaque handles.
///
/// Implemented by the embedding that owns the connection to the host
/// runtime. Every method except [`invoke`](HostModule::invoke) is a
/// pure lookup; `invoke` runs host code and may raise.
pub trait HostModule: Send + Sync {
    /// Human-readable module name, for diagnostics.
    fn name(&self) -> &str;

    /// Attach to the module, returning the load generation observed.
    fn attach(&self) -> Result<LoadGeneration, HostFault>;

    /// Current load generation. Differs from the attach value after a reload.
    fn load_generation(&self) -> LoadGeneration;

    /// Resolve a type handle, or `None` if the module exposes no such type.
    fn resolve_type(&self, handle: &str) -> Option<HostRef>;

    /// Resolve a member handle on a previously resolved type.
    fn resolve_member(&self, owner: &HostRef, handle: &str) -> Option<HostRef>;

    /// Call a resolved member. `target` is `None` for static members.
    fn invoke(
        &self,
        member: &HostRef,
        target: Option<&HostRef>,
        args: &[HostValue],
    ) -> Result<HostValue, HostFault>;
}

/// The host's own shared/exclusive lock over its entity collections.
///
/// The bridge only ever takes shared access and always releases through
/// [`release_shared`](HostLock::release_shared) after a successful
/// [`acquire_shared`](HostLock::acquire_shared).
pub trait HostLock: Send + Sync {
    /// Block until shared access is granted.
    fn acquire_shared(&self) -> Result<(), HostFault>;

    /// Release one shared acquisition.
    fn release_shared(&self);
}
