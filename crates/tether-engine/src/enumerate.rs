//! Object graph enumeration.
//!
//! [`ObjectGraphEnumerator::snapshot_entities`] copies the host's live
//! entity set under the resource lock into an [`EntitySnapshotSet`] the
//! caller owns. [`classify`](ObjectGraphEnumerator::classify) then reads
//! each entity's descriptor outside the lock and wraps the ones of the
//! requested kind. A descriptor failure skips that entity only.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, warn};

use tether_binding::{roles, BindingResolver};
use tether_core::{HostError, HostRef};

use crate::entity::{BaseEntity, EntityClass};
use crate::lock::ResourceLockAdapter;
use crate::queue::MutationQueue;

/// Immutable point-in-time set of entity references.
///
/// Iterates in the order the host returned the entities. Equality is set
/// equality over reference identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitySnapshotSet {
    entities: IndexSet<HostRef>,
}

impl EntitySnapshotSet {
    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `entity` was live when the snapshot was taken.
    pub fn contains(&self, entity: &HostRef) -> bool {
        self.entities.contains(entity)
    }

    /// Entities in host order.
    pub fn iter(&self) -> impl Iterator<Item = &HostRef> {
        self.entities.iter()
    }
}

impl FromIterator<HostRef> for EntitySnapshotSet {
    fn from_iter<I: IntoIterator<Item = HostRef>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EntitySnapshotSet {
    type Item = &'a HostRef;
    type IntoIter = indexmap::set::Iter<'a, HostRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// Reads the host's entity collection.
#[derive(Clone)]
pub struct ObjectGraphEnumerator {
    resolver: Arc<BindingResolver>,
    lock: Arc<ResourceLockAdapter>,
    queue: MutationQueue,
}

impl ObjectGraphEnumerator {
    /// Enumerator reading through `resolver` under `lock`. Typed wrappers
    /// it produces schedule their mutations on `queue`.
    pub fn new(
        resolver: Arc<BindingResolver>,
        lock: Arc<ResourceLockAdapter>,
        queue: MutationQueue,
    ) -> Self {
        Self {
            resolver,
            lock,
            queue,
        }
    }

    /// Copy the live entity set under the host's read lock.
    ///
    /// All or nothing: a lock or host failure yields no snapshot.
    pub fn snapshot_entities(&self) -> Result<EntitySnapshotSet, HostError> {
        let live = self.lock.with_read_lock(|| self.resolver.live_entities())??;
        let snapshot: EntitySnapshotSet = live.into_iter().collect();
        debug!(entities = snapshot.len(), "entity snapshot taken");
        Ok(snapshot)
    }

    /// Wrap every snapshot entity with its descriptor, whatever its kind.
    pub fn describe(&self, snapshot: &EntitySnapshotSet) -> Vec<BaseEntity> {
        snapshot
            .iter()
            .filter_map(|entity| self.base_entity(entity))
            .collect()
    }

    /// Wrap the snapshot entities of kind `K::KIND`.
    pub fn classify<K: EntityClass>(&self, snapshot: &EntitySnapshotSet) -> Vec<K> {
        snapshot
            .iter()
            .filter_map(|entity| self.base_entity(entity))
            .filter_map(K::try_from_base)
            .collect()
    }

    fn base_entity(&self, entity: &HostRef) -> Option<BaseEntity> {
        match self.resolver.descriptor(entity) {
            Ok(descriptor) => Some(BaseEntity::new(
                entity.clone(),
                descriptor,
                self.queue.clone(),
                Arc::clone(&self.resolver),
            )),
            Err(error) => {
                warn!(
                    role = roles::ENTITY_GET_DESCRIPTOR.as_str(),
                    entity = ?entity,
                    %error,
                    "skipping entity whose descriptor could not be read"
                );
                None
            }
        }
    }
}
