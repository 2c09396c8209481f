//! In-memory host module.
//!
//! [`MockHost`] implements [`HostModule`] over a small entity world. It
//! answers the standard identifier-table handles, so the real resolver
//! code path runs against it. Every member invocation is recorded in a
//! call log with a timestamp, and faults can be injected per role and
//! optionally per target.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use indexmap::IndexMap;

use tether_binding::table::{roles, IdentifierTable};
use tether_core::{
    Args, EntityDescriptor, EntityId, EntityKind, HostFault, HostLock, HostModule, HostRef,
    HostValue, LoadGeneration, PositionAndOrientation, Role, Vector3,
};

use crate::lock::MockLock;

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Observable state of a mock entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityState {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub position: Vector3,
    pub forward: Vector3,
    pub up: Vector3,
    pub velocity: Vector3,
    pub angular_velocity: Vector3,
    pub closed: bool,
}

impl EntityState {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            id,
            kind,
            name: String::new(),
            position: Vector3::ZERO,
            forward: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            closed: false,
        }
    }

    fn descriptor(&self) -> EntityDescriptor {
        EntityDescriptor::new(self.kind, self.id)
            .with_name(self.name.clone())
            .with_placement(PositionAndOrientation::new(
                self.position,
                self.forward,
                self.up,
            ))
    }
}

/// Host-side entity object. `HostRef`s to entities wrap this.
pub struct EntityCell {
    state: Mutex<EntityState>,
}

struct PhysicsComponent(HostRef);
struct RigidBody(HostRef);
struct MockType(Role);
struct MockMember(Role);

/// One recorded member invocation.
#[derive(Clone, Debug)]
pub struct CallRecord {
    pub role: Role,
    pub target: Option<HostRef>,
    pub args: Args,
    pub at: Instant,
}

struct FaultRule {
    role: Role,
    target: Option<HostRef>,
    message: String,
}

/// In-memory host implementing [`HostModule`].
pub struct MockHost {
    handles: IndexMap<&'static str, Role>,
    generation: AtomicU64,
    attach_fails: AtomicBool,
    next_entity_id: AtomicI64,
    lock: Arc<MockLock>,
    scene: Mutex<Vec<HostRef>>,
    sent: Mutex<Vec<EntityDescriptor>>,
    calls: Mutex<Vec<CallRecord>>,
    faults: Mutex<Vec<FaultRule>>,
    unlocked_scene_reads: AtomicU64,
}

impl MockHost {
    /// Host answering every handle in the standard identifier table.
    pub fn new() -> Self {
        Self::with_table(&IdentifierTable::standard())
    }

    /// Host answering every handle in `table`.
    pub fn with_table(table: &IdentifierTable) -> Self {
        Self {
            handles: table.entries().map(|e| (e.handle, e.role)).collect(),
            generation: AtomicU64::new(1),
            attach_fails: AtomicBool::new(false),
            next_entity_id: AtomicI64::new(1000),
            lock: Arc::new(MockLock::new()),
            scene: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
            unlocked_scene_reads: AtomicU64::new(0),
        }
    }

    /// Host built from the standard table minus `missing` roles, as a
    /// different host build would look.
    pub fn without(missing: &[Role]) -> Self {
        let mut host = Self::new();
        host.handles.retain(|_, role| !missing.contains(role));
        host
    }

    // ── world setup ──────────────────────────────────────────────

    /// Create an entity object that is not yet in the scene.
    pub fn create_detached(&self, kind: EntityKind, id: EntityId) -> HostRef {
        self.create_with(EntityState::new(kind, id))
    }

    /// Create an entity object from explicit state, not in the scene.
    pub fn create_with(&self, state: EntityState) -> HostRef {
        HostRef::new(EntityCell {
            state: Mutex::new(state),
        })
    }

    /// Create an entity and place it in the scene.
    pub fn spawn(&self, kind: EntityKind, id: EntityId, position: Vector3) -> HostRef {
        let mut state = EntityState::new(kind, id);
        state.position = position;
        let entity = self.create_with(state);
        self.insert_into_scene(entity.clone());
        entity
    }

    fn insert_into_scene(&self, entity: HostRef) {
        self.lock.with_exclusive(|| {
            let mut scene = relock(&self.scene);
            if !scene.contains(&entity) {
                scene.push(entity);
            }
        });
    }

    fn remove_from_scene(&self, entity: &HostRef) {
        self.lock.with_exclusive(|| {
            relock(&self.scene).retain(|e| e != entity);
        });
    }

    /// Advance the simulated world by `dt` seconds under the exclusive lock.
    pub fn step(&self, dt: f32) {
        self.lock.with_exclusive(|| {
            for entity in relock(&self.scene).iter() {
                if let Some(cell) = entity.downcast_ref::<EntityCell>() {
                    let mut s = relock(&cell.state);
                    s.position = s.position + s.velocity * dt;
                }
            }
        });
    }

    // ── inspection ───────────────────────────────────────────────

    /// Copy of an entity's state.
    pub fn state_of(&self, entity: &HostRef) -> Option<EntityState> {
        entity
            .downcast_ref::<EntityCell>()
            .map(|cell| relock(&cell.state).clone())
    }

    /// Mutate an entity's state directly, bypassing the call log.
    pub fn edit(&self, entity: &HostRef, f: impl FnOnce(&mut EntityState)) {
        if let Some(cell) = entity.downcast_ref::<EntityCell>() {
            f(&mut relock(&cell.state));
        }
    }

    /// Whether `entity` is currently in the scene.
    pub fn in_scene(&self, entity: &HostRef) -> bool {
        relock(&self.scene).contains(entity)
    }

    /// Number of entities in the scene.
    pub fn scene_len(&self) -> usize {
        relock(&self.scene).len()
    }

    /// The host's resource lock.
    pub fn lock(&self) -> &Arc<MockLock> {
        &self.lock
    }

    /// Descriptors broadcast through the network serializer.
    pub fn sent_entities(&self) -> Vec<EntityDescriptor> {
        relock(&self.sent).clone()
    }

    /// Every recorded invocation, in call order.
    pub fn calls(&self) -> Vec<CallRecord> {
        relock(&self.calls).clone()
    }

    /// Recorded invocations of `role`.
    pub fn calls_to(&self, role: Role) -> Vec<CallRecord> {
        relock(&self.calls)
            .iter()
            .filter(|c| c.role == role)
            .cloned()
            .collect()
    }

    /// Forget recorded invocations.
    pub fn clear_calls(&self) {
        relock(&self.calls).clear();
    }

    /// Times the live entity set was read without the resource lock held.
    pub fn unlocked_scene_reads(&self) -> u64 {
        self.unlocked_scene_reads.load(Ordering::Relaxed)
    }

    // ── fault injection ──────────────────────────────────────────

    /// Make every call to `role` fault.
    pub fn fail_role(&self, role: Role, message: impl Into<String>) {
        relock(&self.faults).push(FaultRule {
            role,
            target: None,
            message: message.into(),
        });
    }

    /// Make calls to `role` against `target` fault.
    pub fn fail_role_for(&self, role: Role, target: &HostRef, message: impl Into<String>) {
        relock(&self.faults).push(FaultRule {
            role,
            target: Some(target.clone()),
            message: message.into(),
        });
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        relock(&self.faults).clear();
    }

    /// Make the next attach fail.
    pub fn fail_attach(&self) {
        self.attach_fails.store(true, Ordering::Release);
    }

    /// Simulate the host unloading and reloading its module.
    pub fn reload(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn injected_fault(&self, role: Role, target: Option<&HostRef>) -> Option<HostFault> {
        relock(&self.faults)
            .iter()
            .find(|rule| {
                rule.role == role
                    && match (&rule.target, target) {
                        (None, _) => true,
                        (Some(want), Some(got)) => want == got,
                        (Some(_), None) => false,
                    }
            })
            .map(|rule| HostFault::new(rule.message.clone()))
    }

    // ── dispatch ─────────────────────────────────────────────────

    fn dispatch(
        &self,
        role: Role,
        target: Option<&HostRef>,
        args: &[HostValue],
    ) -> Result<HostValue, HostFault> {
        match role {
            r if r == roles::OBJECT_MANAGER_RESOURCE_LOCK => {
                let lock: Arc<dyn HostLock> = self.lock.clone();
                Ok(HostValue::Lock(lock))
            }
            r if r == roles::OBJECT_MANAGER_ENTITY_SET => {
                if self.lock.readers() == 0 {
                    self.unlocked_scene_reads.fetch_add(1, Ordering::Relaxed);
                }
                Ok(HostValue::Objects(relock(&self.scene).clone()))
            }
            r if r == roles::OBJECT_MANAGER_ADD_ENTITY => {
                let entity = object_arg(args, 0)?;
                entity_cell(Some(&entity))?;
                self.insert_into_scene(entity);
                Ok(HostValue::Unit)
            }
            r if r == roles::NETWORK_SERIALIZER_SEND_ENTITY => match args.first() {
                Some(HostValue::Descriptor(d)) => {
                    relock(&self.sent).push(d.clone());
                    Ok(HostValue::Unit)
                }
                _ => Err(HostFault::new("SendEntity expects a descriptor")),
            },
            r if r == roles::UTILITY_GENERATE_ENTITY_ID => Ok(HostValue::Int(
                self.next_entity_id.fetch_add(1, Ordering::Relaxed),
            )),
            r if r == roles::ENTITY_PHYSICS_OBJECT => {
                entity_cell(target)?;
                let entity = target.cloned().ok_or_else(|| HostFault::new("no target"))?;
                Ok(HostValue::Object(HostRef::new(PhysicsComponent(entity))))
            }
            r if r == roles::ENTITY_ID_FIELD => match args.first() {
                Some(HostValue::Int(id)) => {
                    relock(&entity_cell(target)?.state).id = EntityId(*id);
                    Ok(HostValue::Unit)
                }
                _ => Err(HostFault::new("entity id field expects an int")),
            },
            r if r == roles::ENTITY_GET_ID => {
                Ok(HostValue::Int(relock(&entity_cell(target)?.state).id.0))
            }
            r if r == roles::ENTITY_GET_DESCRIPTOR => Ok(HostValue::Descriptor(
                relock(&entity_cell(target)?.state).descriptor(),
            )),
            r if r == roles::ENTITY_CLOSE => {
                let cell = entity_cell(target)?;
                relock(&cell.state).closed = true;
                if let Some(entity) = target {
                    self.remove_from_scene(entity);
                }
                Ok(HostValue::Unit)
            }
            r if r == roles::ENTITY_GET_ORIENTATION => {
                let s = relock(&entity_cell(target)?.state);
                Ok(HostValue::Orientation {
                    forward: s.forward,
                    up: s.up,
                })
            }
            r if r == roles::ENTITY_SET_ORIENTATION => match args.first() {
                Some(HostValue::Orientation { forward, up }) => {
                    let mut s = relock(&entity_cell(target)?.state);
                    s.forward = *forward;
                    s.up = *up;
                    Ok(HostValue::Unit)
                }
                _ => Err(HostFault::new("orientation setter expects an orientation")),
            },
            r if r == roles::PHYSICS_OBJECT_RIGID_BODY => {
                let physics = target
                    .and_then(|t| t.downcast_ref::<PhysicsComponent>())
                    .ok_or_else(|| HostFault::new("target is not a physics component"))?;
                Ok(HostValue::Object(HostRef::new(RigidBody(physics.0.clone()))))
            }
            r if r == roles::RIGID_BODY_GET_POSITION => {
                Ok(HostValue::Vector(relock(&body_cell(target)?.state).position))
            }
            r if r == roles::RIGID_BODY_SET_POSITION => {
                let v = vector_arg(args)?;
                relock(&body_cell(target)?.state).position = v;
                Ok(HostValue::Unit)
            }
            r if r == roles::RIGID_BODY_SET_LINEAR_VELOCITY => {
                let v = vector_arg(args)?;
                relock(&body_cell(target)?.state).velocity = v;
                Ok(HostValue::Unit)
            }
            r if r == roles::RIGID_BODY_SET_ANGULAR_VELOCITY => {
                let v = vector_arg(args)?;
                relock(&body_cell(target)?.state).angular_velocity = v;
                Ok(HostValue::Unit)
            }
            other => Err(HostFault::new(format!("mock host has no body for {other}"))),
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

fn entity_cell(target: Option<&HostRef>) -> Result<&EntityCell, HostFault> {
    target
        .and_then(|t| t.downcast_ref::<EntityCell>())
        .ok_or_else(|| HostFault::new("target is not an entity"))
}

fn body_cell(target: Option<&HostRef>) -> Result<&EntityCell, HostFault> {
    target
        .and_then(|t| t.downcast_ref::<RigidBody>())
        .and_then(|b| b.0.downcast_ref::<EntityCell>())
        .ok_or_else(|| HostFault::new("target is not a rigid body"))
}

fn object_arg(args: &[HostValue], index: usize) -> Result<HostRef, HostFault> {
    match args.get(index) {
        Some(HostValue::Object(r)) => Ok(r.clone()),
        _ => Err(HostFault::new(format!("argument {index} must be an object"))),
    }
}

fn vector_arg(args: &[HostValue]) -> Result<Vector3, HostFault> {
    match args.first() {
        Some(HostValue::Vector(v)) => Ok(*v),
        _ => Err(HostFault::new("argument 0 must be a vector")),
    }
}

impl HostModule for MockHost {
    fn name(&self) -> &str {
        "mock-host"
    }

    fn attach(&self) -> Result<LoadGeneration, HostFault> {
        if self.attach_fails.swap(false, Ordering::AcqRel) {
            return Err(HostFault::new("module image not found"));
        }
        Ok(self.load_generation())
    }

    fn load_generation(&self) -> LoadGeneration {
        LoadGeneration(self.generation.load(Ordering::Acquire))
    }

    fn resolve_type(&self, handle: &str) -> Option<HostRef> {
        let role = *self.handles.get(handle)?;
        if role.is_member() {
            return None;
        }
        Some(HostRef::new(MockType(role)))
    }

    fn resolve_member(&self, owner: &HostRef, handle: &str) -> Option<HostRef> {
        let owner = owner.downcast_ref::<MockType>()?;
        let role = *self.handles.get(handle)?;
        if role.owner() != Some(owner.0.as_str()) {
            return None;
        }
        Some(HostRef::new(MockMember(role)))
    }

    fn invoke(
        &self,
        member: &HostRef,
        target: Option<&HostRef>,
        args: &[HostValue],
    ) -> Result<HostValue, HostFault> {
        let role = member
            .downcast_ref::<MockMember>()
            .map(|m| m.0)
            .ok_or_else(|| HostFault::new("not a member handle"))?;
        relock(&self.calls).push(CallRecord {
            role,
            target: target.cloned(),
            args: args.iter().cloned().collect(),
            at: Instant::now(),
        });
        if let Some(fault) = self.injected_fault(role, target) {
            return Err(fault);
        }
        self.dispatch(role, target, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(host: &MockHost, role: Role) -> HostRef {
        let table = IdentifierTable::standard();
        let owner = table.entry(role.owner().unwrap()).unwrap().handle;
        let owner = host.resolve_type(owner).unwrap();
        host.resolve_member(&owner, table.lookup(role.as_str()).unwrap())
            .unwrap()
    }

    #[test]
    fn member_handles_resolve_only_on_their_owner() {
        let host = MockHost::new();
        let table = IdentifierTable::standard();
        let utility = host
            .resolve_type(table.lookup("Utility").unwrap())
            .unwrap();
        assert!(host.resolve_member(&utility, "Close").is_none());
        assert!(host.resolve_type("Close").is_none());
    }

    #[test]
    fn removed_roles_do_not_resolve() {
        let host = MockHost::without(&[roles::ENTITY_CLOSE]);
        let table = IdentifierTable::standard();
        let entity = host.resolve_type(table.lookup("Entity").unwrap()).unwrap();
        assert!(host.resolve_member(&entity, "Close").is_none());
    }

    #[test]
    fn velocity_integrates_on_step() {
        let host = MockHost::new();
        let e = host.spawn(EntityKind::Meteor, EntityId(1), Vector3::ZERO);
        host.edit(&e, |s| s.velocity = Vector3::new(2.0, 0.0, 0.0));
        host.step(0.5);
        assert_eq!(host.state_of(&e).unwrap().position, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn close_removes_from_scene_and_logs() {
        let host = MockHost::new();
        let e = host.spawn(EntityKind::Meteor, EntityId(1), Vector3::ZERO);
        let close = member(&host, roles::ENTITY_CLOSE);
        host.invoke(&close, Some(&e), &[]).unwrap();
        assert!(!host.in_scene(&e));
        assert!(host.state_of(&e).unwrap().closed);
        assert_eq!(host.calls_to(roles::ENTITY_CLOSE).len(), 1);
    }

    #[test]
    fn targeted_fault_only_hits_its_target() {
        let host = MockHost::new();
        let a = host.spawn(EntityKind::Meteor, EntityId(1), Vector3::ZERO);
        let b = host.spawn(EntityKind::Meteor, EntityId(2), Vector3::ZERO);
        host.fail_role_for(roles::ENTITY_GET_ID, &a, "stale object");
        let get_id = member(&host, roles::ENTITY_GET_ID);
        assert!(host.invoke(&get_id, Some(&a), &[]).is_err());
        assert!(matches!(
            host.invoke(&get_id, Some(&b), &[]),
            Ok(HostValue::Int(2))
        ));
    }

    #[test]
    fn unlocked_scene_reads_are_counted() {
        let host = MockHost::new();
        let set = member(&host, roles::OBJECT_MANAGER_ENTITY_SET);
        host.invoke(&set, None, &[]).unwrap();
        assert_eq!(host.unlocked_scene_reads(), 1);
        host.lock().acquire_shared().unwrap();
        host.invoke(&set, None, &[]).unwrap();
        host.lock().release_shared();
        assert_eq!(host.unlocked_scene_reads(), 1);
    }
}
