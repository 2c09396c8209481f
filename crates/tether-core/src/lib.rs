//! Core types and traits for the Tether host bridge.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: opaque host
//! values, the [`HostModule`] and [`HostLock`] seams, mutation kinds,
//! entity descriptors, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod kind;
pub mod math;
pub mod mutation;
pub mod traits;
pub mod value;

pub use error::{
    BindingError, HostError, HostFault, InvocationError, LockAcquisitionError, QueueError,
};
pub use id::{ActionSeq, EntityId, LoadGeneration, Role};
pub use kind::{EntityDescriptor, EntityKind};
pub use math::{PositionAndOrientation, Vector3};
pub use mutation::{ActionOutcome, ActionReceipt, MutationKind, PendingMutation};
pub use traits::{HostLock, HostModule};
pub use value::{Args, HostRef, HostValue};
