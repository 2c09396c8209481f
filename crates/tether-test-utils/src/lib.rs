//! Test utilities and mock host for Tether development.
//!
//! Provides [`MockHost`], an in-memory [`HostModule`](tether_core::HostModule)
//! that answers the standard identifier table, its [`MockLock`], and a
//! [`sample_world`] fixture for constructing test scenarios.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod host;
pub mod lock;

pub use fixtures::{sample_world, SampleWorld};
pub use host::{CallRecord, EntityCell, EntityState, MockHost};
pub use lock::MockLock;
