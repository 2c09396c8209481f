//! The host binding context.
//!
//! [`HostContext`] is built once per attached host module and passed by
//! reference. It owns the resolver, lock adapter, enumerator, and the
//! producer side of the mutation queue. The executor is handed back
//! separately because it belongs to the host thread.

use std::sync::Arc;

use tracing::{debug, info};

use tether_binding::{BindingResolver, IdentifierTable};
use tether_core::{EntityId, HostError, HostModule, HostRef};

use crate::config::{BridgeConfig, ConfigError};
use crate::entity::{BaseEntity, EntityClass};
use crate::enumerate::{EntitySnapshotSet, ObjectGraphEnumerator};
use crate::lists::EntityLists;
use crate::lock::ResourceLockAdapter;
use crate::queue::{mutation_queue, MutationExecutor, MutationQueue};

/// Shared bridge state for one attached host module.
#[derive(Clone)]
pub struct HostContext {
    resolver: Arc<BindingResolver>,
    lock: Arc<ResourceLockAdapter>,
    enumerator: ObjectGraphEnumerator,
    queue: MutationQueue,
    config: BridgeConfig,
}

// Compile-time assertion: HostContext must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<HostContext>();
};

impl HostContext {
    /// Validate `config`, attach to `module` with the standard identifier
    /// table, and build the context plus its host-thread executor.
    ///
    /// Configuration problems are reported before the module is touched.
    /// A fatal [`BindingError`](tether_core::BindingError) from attach or
    /// required type resolution comes back wrapped as
    /// [`ConfigError::Binding`]; [`ConfigError::binding`] unwraps it.
    pub fn initialize(
        module: Arc<dyn HostModule>,
        config: BridgeConfig,
    ) -> Result<(Self, MutationExecutor), ConfigError> {
        Self::with_table(module, IdentifierTable::standard(), config)
    }

    /// As [`initialize`](Self::initialize), with an explicit identifier table.
    pub fn with_table(
        module: Arc<dyn HostModule>,
        table: IdentifierTable,
        config: BridgeConfig,
    ) -> Result<(Self, MutationExecutor), ConfigError> {
        config.validate()?;
        let resolver = Arc::new(BindingResolver::initialize(module, Arc::new(table))?);
        let lock = Arc::new(ResourceLockAdapter::new(Arc::clone(&resolver)));
        let (queue, executor) = mutation_queue(Arc::clone(&resolver), &config);
        let enumerator =
            ObjectGraphEnumerator::new(Arc::clone(&resolver), Arc::clone(&lock), queue.clone());

        info!(
            staging = ?config.staging,
            tick_rate_hz = config.tick_rate_hz,
            "host context ready"
        );
        let context = Self {
            resolver,
            lock,
            enumerator,
            queue,
            config,
        };
        Ok((context, executor))
    }

    /// The binding resolver.
    pub fn resolver(&self) -> &Arc<BindingResolver> {
        &self.resolver
    }

    /// The resource lock adapter.
    pub fn lock(&self) -> &ResourceLockAdapter {
        &self.lock
    }

    /// A producer handle onto the mutation queue.
    pub fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    /// The enumerator.
    pub fn enumerator(&self) -> &ObjectGraphEnumerator {
        &self.enumerator
    }

    /// Configuration the context was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Copy the live entity set. See [`ObjectGraphEnumerator::snapshot_entities`].
    pub fn snapshot_entities(&self) -> Result<EntitySnapshotSet, HostError> {
        self.enumerator.snapshot_entities()
    }

    /// Typed entities of one kind from `snapshot`.
    pub fn classify<K: EntityClass>(&self, snapshot: &EntitySnapshotSet) -> Vec<K> {
        self.enumerator.classify(snapshot)
    }

    /// Per-kind list builders.
    pub fn entity_lists(&self) -> EntityLists<'_> {
        EntityLists::new(&self.enumerator)
    }

    /// Wrap an entity that may not be in the scene yet, reading its descriptor now.
    pub fn base_entity(&self, entity: HostRef) -> Result<BaseEntity, HostError> {
        let descriptor = self.resolver.descriptor(&entity)?;
        Ok(BaseEntity::new(
            entity,
            descriptor,
            self.queue.clone(),
            Arc::clone(&self.resolver),
        ))
    }

    /// A fresh id from the host's generator.
    pub fn generate_entity_id(&self) -> Result<EntityId, HostError> {
        self.resolver.generate_entity_id()
    }

    /// Live id of `entity`.
    pub fn entity_id(&self, entity: &HostRef) -> Result<EntityId, HostError> {
        self.resolver.entity_id(entity)
    }

    /// Overwrite the id of `entity`. Call before scheduling an add.
    pub fn set_entity_id(&self, entity: &HostRef, id: EntityId) -> Result<(), HostError> {
        self.resolver.set_entity_id(entity, id)
    }

    /// Give `entity` a generated id if it has none yet, and return its id.
    ///
    /// An already-assigned id is left as is.
    pub fn ensure_entity_id(&self, entity: &HostRef) -> Result<EntityId, HostError> {
        let current = self.resolver.entity_id(entity)?;
        if current.is_assigned() {
            return Ok(current);
        }
        let id = self.resolver.generate_entity_id()?;
        self.resolver.set_entity_id(entity, id)?;
        debug!(entity_id = id.0, "generated id for unregistered entity");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{BindingError, EntityKind};
    use tether_test_utils::MockHost;

    #[test]
    fn invalid_config_fails_before_attach() {
        let host = Arc::new(MockHost::new());
        host.fail_attach();
        let config = BridgeConfig {
            tick_rate_hz: -1.0,
            ..BridgeConfig::default()
        };
        let err = HostContext::initialize(host, config).err().unwrap();
        assert_eq!(err, ConfigError::InvalidTickRate { value: -1.0 });
    }

    #[test]
    fn binding_failure_surfaces_as_config_error() {
        let host = Arc::new(MockHost::without(&[tether_binding::roles::OBJECT_MANAGER]));
        let err = HostContext::initialize(host, BridgeConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err.binding(),
            Some(BindingError::TypeResolution { .. })
        ));
    }

    #[test]
    fn ensure_entity_id_only_fills_unset_ids() {
        let host = Arc::new(MockHost::new());
        let (ctx, _executor) = HostContext::initialize(host.clone(), BridgeConfig::default()).unwrap();
        let fresh = host.create_detached(EntityKind::Meteor, EntityId::NONE);
        let id = ctx.ensure_entity_id(&fresh).unwrap();
        assert!(id.is_assigned());
        assert_eq!(ctx.entity_id(&fresh), Ok(id));
        assert_eq!(ctx.ensure_entity_id(&fresh), Ok(id));

        let named = host.create_detached(EntityKind::Meteor, EntityId(77));
        let generated = host.calls_to(tether_binding::roles::UTILITY_GENERATE_ENTITY_ID).len();
        assert_eq!(ctx.ensure_entity_id(&named), Ok(EntityId(77)));
        assert_eq!(
            host.calls_to(tether_binding::roles::UTILITY_GENERATE_ENTITY_ID).len(),
            generated
        );
    }

    #[test]
    fn id_utilities_round_trip() {
        let host = Arc::new(MockHost::new());
        let (ctx, _executor) = HostContext::initialize(host.clone(), BridgeConfig::default()).unwrap();
        let e = host.create_detached(EntityKind::Character, EntityId::NONE);
        let id = ctx.generate_entity_id().unwrap();
        assert!(id.is_assigned());
        ctx.set_entity_id(&e, id).unwrap();
        assert_eq!(ctx.entity_id(&e), Ok(id));
        assert_eq!(ctx.base_entity(e).unwrap().id(), Ok(id));
    }
}
