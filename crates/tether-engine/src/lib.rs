//! Host-thread execution engine for the Tether host bridge.
//!
//! Provides the [`HostContext`] that ties the binding resolver to the
//! rest of the bridge: the [`ResourceLockAdapter`] for scoped shared
//! access to the host's lock, the [`ObjectGraphEnumerator`] for entity
//! snapshots, and the deferred mutation queue ([`MutationQueue`] on any
//! thread, [`MutationExecutor`] on the host thread). [`HostLoop`] can
//! own the executor and drive it at a fixed tick rate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod actions;
pub mod config;
pub mod context;
pub mod entity;
pub mod enumerate;
pub mod host_loop;
pub mod lists;
pub mod lock;
pub mod metrics;
pub mod queue;
pub mod staging;

pub use config::{BridgeConfig, ConfigError, SettleDelays, StagingMode};
pub use context::HostContext;
pub use entity::{
    BaseEntity, Character, CubeGrid, EntityClass, FloatingObject, Meteor, VoxelMap,
};
pub use enumerate::{EntitySnapshotSet, ObjectGraphEnumerator};
pub use host_loop::HostLoop;
pub use lists::EntityLists;
pub use lock::ResourceLockAdapter;
pub use metrics::QueueMetrics;
pub use queue::{mutation_queue, ActionBody, DrainReport, MutationExecutor, MutationQueue};
pub use staging::{SlotState, Staged};
