//! Tether: a typed bridge onto a reflected host object graph.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tether sub-crates. Most embeddings only need `tether` as a single
//! dependency.
//!
//! # Quick start
//!
//! ```rust
//! use tether::prelude::*;
//! use tether_test_utils::sample_world;
//!
//! let world = sample_world();
//! let (ctx, mut executor) =
//!     HostContext::initialize(world.host.clone(), BridgeConfig::default()).unwrap();
//!
//! // Enumerate under the host's shared lock.
//! let mut meteors: Vec<Meteor> = ctx.entity_lists().meteors().unwrap();
//! assert_eq!(meteors.len(), 1);
//!
//! // Mutations are deferred until the host thread drains.
//! meteors[0].set_velocity(Vector3::new(0.0, -10.0, 0.0)).unwrap();
//! let report = executor.drain_and_execute().unwrap();
//! assert_eq!(report.applied(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tether-core` | Ids, host values, errors, host traits, mutation kinds |
//! | [`binding`] | `tether-binding` | Identifier table, binding resolver, typed accessors |
//! | [`engine`] | `tether-engine` | Context, lock adapter, enumerator, mutation queue, host loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`tether-core`).
///
/// Implement [`types::HostModule`] and [`types::HostLock`] to attach a
/// real host.
pub use tether_core as types;

/// Identifier table and binding resolver (`tether-binding`).
pub use tether_binding as binding;

/// Bridge runtime (`tether-engine`).
///
/// [`engine::HostContext`] is the entry point; [`engine::HostLoop`] drives
/// the host tick when the bridge owns it.
pub use tether_engine as engine;

/// Common imports for typical Tether usage.
///
/// ```rust
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tether_core::{
        ActionOutcome, ActionReceipt, ActionSeq, EntityDescriptor, EntityId, EntityKind, HostRef,
        MutationKind, Vector3,
    };

    // Host seams
    pub use tether_core::{HostLock, HostModule};

    // Errors
    pub use tether_core::{BindingError, HostError, LockAcquisitionError, QueueError};

    // Binding
    pub use tether_binding::{roles, BindingResolver, IdentifierTable};

    // Engine
    pub use tether_engine::{
        BaseEntity, BridgeConfig, Character, ConfigError, CubeGrid, DrainReport, EntityClass,
        FloatingObject, HostContext, HostLoop, Meteor, MutationExecutor, MutationQueue,
        SettleDelays, StagingMode, VoxelMap,
    };
}
