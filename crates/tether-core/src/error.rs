//! Error types for the Tether host bridge.
//!
//! Organized by subsystem: binding (resolution), invocation (dynamic
//! calls), lock acquisition, and the mutation queue. [`HostError`]
//! unifies the first three for operations that can hit any of them.

use std::error::Error;
use std::fmt;

use crate::id::LoadGeneration;

/// A failure raised by host code.
///
/// The host's equivalent of a thrown exception. Carries only the host's
/// message; the bridge attaches role or action context when it wraps it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostFault {
    /// Message reported by the host.
    pub message: String,
}

impl HostFault {
    /// Construct from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for HostFault {}

/// Errors from resolving roles against the host module.
///
/// Fatal when returned from resolver initialization; elsewhere the
/// dependent operation logs it and reports failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingError {
    /// The host module could not be attached.
    ModuleLoad {
        /// Module name.
        module: String,
        /// Host's reason.
        reason: HostFault,
    },
    /// A type role did not resolve (host version mismatch).
    TypeResolution {
        /// The type role.
        role: String,
    },
    /// A member role did not resolve (host version mismatch).
    MemberResolution {
        /// The member role.
        role: String,
    },
    /// The role is not present in the identifier table.
    UnknownRole {
        /// The role looked up.
        role: String,
    },
    /// The identifier table lists a role twice.
    DuplicateRole {
        /// The repeated role.
        role: String,
    },
    /// The host module was reloaded after initialization.
    ModuleReloaded {
        /// Generation observed at attach time.
        attached: LoadGeneration,
        /// Generation the module reports now.
        current: LoadGeneration,
    },
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleLoad { module, reason } => {
                write!(f, "failed to attach host module '{module}': {reason}")
            }
            Self::TypeResolution { role } => write!(f, "type role '{role}' did not resolve"),
            Self::MemberResolution { role } => write!(f, "member role '{role}' did not resolve"),
            Self::UnknownRole { role } => write!(f, "role '{role}' is not in the identifier table"),
            Self::DuplicateRole { role } => {
                write!(f, "role '{role}' appears twice in the identifier table")
            }
            Self::ModuleReloaded { attached, current } => write!(
                f,
                "host module reloaded (attached generation {attached}, now {current})"
            ),
        }
    }
}

impl Error for BindingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ModuleLoad { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Errors from a dynamic call against the host. Always recoverable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationError {
    /// Host code raised while executing the member.
    Faulted {
        /// The member role.
        role: String,
        /// Host's fault.
        fault: HostFault,
    },
    /// The member returned a value of the wrong shape.
    UnexpectedValue {
        /// The member role.
        role: String,
        /// Shape the bridge expected.
        expected: &'static str,
        /// Shape the host returned.
        found: &'static str,
    },
    /// The member was resolved against a module that has since reloaded.
    StaleBinding {
        /// The member role.
        role: String,
        /// Generation observed at attach time.
        attached: LoadGeneration,
        /// Generation the module reports now.
        current: LoadGeneration,
    },
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Faulted { role, fault } => write!(f, "call to '{role}' faulted: {fault}"),
            Self::UnexpectedValue {
                role,
                expected,
                found,
            } => write!(f, "call to '{role}' returned {found}, expected {expected}"),
            Self::StaleBinding {
                role,
                attached,
                current,
            } => write!(
                f,
                "call to '{role}' refused: bound at generation {attached}, module now at {current}"
            ),
        }
    }
}

impl Error for InvocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Faulted { fault, .. } => Some(fault),
            Self::UnexpectedValue { .. } | Self::StaleBinding { .. } => None,
        }
    }
}

/// The host's resource lock could not be obtained.
///
/// Always propagated to the caller of the lock adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockAcquisitionError {
    /// Why acquisition failed.
    pub reason: String,
}

impl fmt::Display for LockAcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to acquire host resource lock: {}", self.reason)
    }
}

impl Error for LockAcquisitionError {}

/// Any failure reaching into the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    /// Resolution failed.
    Binding(BindingError),
    /// The call itself failed.
    Invocation(InvocationError),
    /// The resource lock could not be taken.
    Lock(LockAcquisitionError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding(e) => write!(f, "binding: {e}"),
            Self::Invocation(e) => write!(f, "invocation: {e}"),
            Self::Lock(e) => write!(f, "lock: {e}"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Binding(e) => Some(e),
            Self::Invocation(e) => Some(e),
            Self::Lock(e) => Some(e),
        }
    }
}

impl From<BindingError> for HostError {
    fn from(e: BindingError) -> Self {
        Self::Binding(e)
    }
}

impl From<InvocationError> for HostError {
    fn from(e: InvocationError) -> Self {
        Self::Invocation(e)
    }
}

impl From<LockAcquisitionError> for HostError {
    fn from(e: LockAcquisitionError) -> Self {
        Self::Lock(e)
    }
}

/// Errors from the deferred mutation queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// `drain_and_execute` was called from a thread other than the host thread.
    WrongThread {
        /// Debug name of the bound host thread.
        bound: String,
        /// Debug name of the calling thread.
        caller: String,
    },
    /// Every producer handle was dropped and the queue is empty.
    Disconnected,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongThread { bound, caller } => write!(
                f,
                "mutation queue drained from {caller}, but it is bound to host thread {bound}"
            ),
            Self::Disconnected => write!(f, "all mutation producers disconnected"),
        }
    }
}

impl Error for QueueError {}
