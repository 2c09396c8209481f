//! Identifier table and host binding resolver.
//!
//! Every cross-boundary access goes role → handle → resolved member →
//! dynamic invoke. [`IdentifierTable`] owns the role → handle mapping,
//! [`BindingResolver`] resolves and caches handles against the loaded
//! [`HostModule`](tether_core::HostModule), and the accessor methods in
//! [`accessors`] give the rest of the workspace a narrow, typed view of
//! the host calls it needs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accessors;
pub mod resolver;
pub mod table;

pub use resolver::{BindingResolver, MemberHandle, TypeHandle};
pub use table::{roles, IdentifierEntry, IdentifierTable};
