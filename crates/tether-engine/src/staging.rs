//! Per-kind staging slots.
//!
//! Each [`MutationKind`] owns one slot that moves through
//! `Idle -> Staged -> Executing -> Idle`. Staging into a slot that is
//! already `Staged` replaces the target and payload; the replaced values
//! are never applied.

use tether_core::{HostRef, MutationKind, Vector3};

/// Target and payload held in a staged slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Staged {
    /// Entity to mutate.
    pub target: HostRef,
    /// Vector payload, for kinds that take one.
    pub payload: Option<Vector3>,
}

/// Observable state of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing pending.
    Idle,
    /// A target and payload wait for the executor.
    Staged,
    /// The executor took the values and is running the action.
    Executing,
}

#[derive(Debug)]
enum Slot {
    Idle,
    Staged(Staged),
    Executing,
}

/// One slot per mutation kind.
#[derive(Debug)]
pub(crate) struct StagingSlots {
    slots: [Slot; MutationKind::COUNT],
}

impl StagingSlots {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::Idle),
        }
    }

    /// Stage values for `kind`. Returns `true` if a pending staging was replaced.
    pub fn stage(&mut self, kind: MutationKind, staged: Staged) -> bool {
        let slot = &mut self.slots[kind.index()];
        let replaced = matches!(slot, Slot::Staged(_));
        *slot = Slot::Staged(staged);
        replaced
    }

    /// Take the staged values, moving the slot to `Executing`.
    ///
    /// `None` when nothing is staged: an earlier entry of the same kind
    /// already consumed the values.
    pub fn take(&mut self, kind: MutationKind) -> Option<Staged> {
        let slot = &mut self.slots[kind.index()];
        match std::mem::replace(slot, Slot::Idle) {
            Slot::Staged(staged) => {
                *slot = Slot::Executing;
                Some(staged)
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Return an `Executing` slot to `Idle`. A staging that arrived while
    /// the action ran stays staged.
    pub fn finish(&mut self, kind: MutationKind) {
        let slot = &mut self.slots[kind.index()];
        if matches!(slot, Slot::Executing) {
            *slot = Slot::Idle;
        }
    }

    pub fn state(&self, kind: MutationKind) -> SlotState {
        match self.slots[kind.index()] {
            Slot::Idle => SlotState::Idle,
            Slot::Staged(_) => SlotState::Staged,
            Slot::Executing => SlotState::Executing,
        }
    }
}
