//! Mutation kinds, pending mutations, and execution receipts.

use std::fmt;

use crate::error::HostError;
use crate::id::ActionSeq;
use crate::math::Vector3;
use crate::value::HostRef;

/// A state change the bridge can ask the host to perform.
///
/// Each kind owns one staging slot in the mutation queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationKind {
    /// Move the entity's physical body.
    SetPosition,
    /// Set linear velocity.
    SetVelocity,
    /// Set angular velocity.
    SetAngularVelocity,
    /// Replace the up vector, keeping forward.
    SetUp,
    /// Replace the forward vector, keeping up.
    SetForward,
    /// Add the entity to the world and broadcast it.
    Add,
    /// Restage, settle, close, settle.
    Remove,
}

impl MutationKind {
    /// Every kind, in slot order.
    pub const ALL: [MutationKind; 7] = [
        Self::SetPosition,
        Self::SetVelocity,
        Self::SetAngularVelocity,
        Self::SetUp,
        Self::SetForward,
        Self::Add,
        Self::Remove,
    ];

    /// Number of kinds (and staging slots).
    pub const COUNT: usize = Self::ALL.len();

    /// Slot index of this kind.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether this kind carries a vector payload.
    pub fn takes_payload(self) -> bool {
        !matches!(self, Self::Add | Self::Remove)
    }

    /// Action name used in logs and receipts.
    pub fn name(self) -> &'static str {
        match self {
            Self::SetPosition => "set_position",
            Self::SetVelocity => "set_velocity",
            Self::SetAngularVelocity => "set_angular_velocity",
            Self::SetUp => "set_up",
            Self::SetForward => "set_forward",
            Self::Add => "add_entity",
            Self::Remove => "remove_entity",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A mutation waiting to run on the host thread.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingMutation {
    /// Entity to mutate.
    pub target: HostRef,
    /// What to do.
    pub kind: MutationKind,
    /// Vector payload for kinds that take one.
    pub payload: Option<Vector3>,
}

impl PendingMutation {
    /// Construct a pending mutation.
    pub fn new(kind: MutationKind, target: HostRef, payload: Option<Vector3>) -> Self {
        Self {
            target,
            kind,
            payload,
        }
    }
}

/// How a queued action ended.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    /// The action ran to completion.
    Applied,
    /// The action had nothing to do.
    Skipped {
        /// Why it was skipped.
        reason: &'static str,
    },
    /// The action returned an error.
    Failed(HostError),
    /// The action panicked.
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl ActionOutcome {
    /// Whether the action ran to completion.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Whether the action failed or panicked.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Panicked { .. })
    }
}

/// Record of one executed queue entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReceipt {
    /// Submission sequence number.
    pub seq: ActionSeq,
    /// Action name (mutation kind name, or the name given to a custom action).
    pub action: String,
    /// The mutation kind, for typed mutations.
    pub kind: Option<MutationKind>,
    /// Outcome.
    pub outcome: ActionOutcome,
}
