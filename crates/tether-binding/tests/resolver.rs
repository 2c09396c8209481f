//! Resolver and accessor behaviour against the in-memory host.

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use tether_binding::{roles, BindingResolver, IdentifierTable};
use tether_core::{
    BindingError, EntityId, EntityKind, HostError, HostModule, InvocationError, Vector3,
};
use tether_test_utils::{sample_world, MockHost};

fn resolver_for(host: &Arc<MockHost>) -> BindingResolver {
    BindingResolver::initialize(host.clone(), Arc::new(IdentifierTable::standard())).unwrap()
}

// ── initialization ──────────────────────────────────────────

#[test]
fn initialize_against_standard_host() {
    let host = Arc::new(MockHost::new());
    let resolver = resolver_for(&host);
    assert_eq!(resolver.resolved_count(), 2);
    assert_eq!(resolver.attached_generation(), host.load_generation());
}

#[test]
fn attach_failure_reports_module() {
    let host = Arc::new(MockHost::new());
    host.fail_attach();
    let err = BindingResolver::initialize(host, Arc::new(IdentifierTable::standard()))
        .err()
        .unwrap();
    match err {
        BindingError::ModuleLoad { module, .. } => assert_eq!(module, "mock-host"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn host_without_entity_type_is_fatal() {
    let host = Arc::new(MockHost::without(&[roles::ENTITY]));
    let err = BindingResolver::initialize(host, Arc::new(IdentifierTable::standard()))
        .err()
        .unwrap();
    assert_eq!(
        err,
        BindingError::TypeResolution {
            role: "Entity".into()
        }
    );
}

// ── lazy members ────────────────────────────────────────────

#[test]
fn missing_member_fails_only_where_used() {
    let host = Arc::new(MockHost::without(&[roles::NETWORK_SERIALIZER_SEND_ENTITY]));
    let resolver = resolver_for(&host);
    let world_entity = host.spawn(EntityKind::Meteor, EntityId(3), Vector3::ZERO);
    assert_eq!(resolver.entity_id(&world_entity).unwrap(), EntityId(3));
    let err = resolver
        .send_entity(&resolver.descriptor(&world_entity).unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        HostError::Binding(BindingError::MemberResolution {
            role: "NetworkSerializer.SendEntity".into()
        })
    );
}

#[test]
fn reload_invalidates_resolved_bindings() {
    let host = Arc::new(MockHost::new());
    let resolver = resolver_for(&host);
    resolver.generate_entity_id().unwrap();
    host.reload();
    assert!(matches!(
        resolver.generate_entity_id(),
        Err(HostError::Binding(BindingError::ModuleReloaded { .. }))
    ));
}

#[test]
fn handle_resolved_before_reload_is_refused() {
    let host = Arc::new(MockHost::new());
    let resolver = resolver_for(&host);
    let member = resolver
        .resolve_member(roles::UTILITY_GENERATE_ENTITY_ID)
        .unwrap();
    assert!(resolver.invoke(&member, None, &[]).is_ok());
    let calls_before = host.calls_to(roles::UTILITY_GENERATE_ENTITY_ID).len();

    host.reload();
    let err = resolver.invoke(&member, None, &[]).unwrap_err();
    match err {
        InvocationError::StaleBinding {
            role,
            attached,
            current,
        } => {
            assert_eq!(role, "Utility.GenerateEntityId");
            assert_eq!(attached, resolver.attached_generation());
            assert_eq!(current, host.load_generation());
            assert_ne!(attached, current);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        host.calls_to(roles::UTILITY_GENERATE_ENTITY_ID).len(),
        calls_before
    );
}

#[test]
fn concurrent_first_resolution_agrees() {
    let host = Arc::new(MockHost::new());
    let resolver = Arc::new(resolver_for(&host));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let r = resolver.clone();
            thread::spawn(move || r.resolve_member(roles::RIGID_BODY_SET_POSITION).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

// ── accessors ───────────────────────────────────────────────

#[test]
fn body_accessors_reach_entity_state() {
    let world = sample_world();
    let resolver = resolver_for(&world.host);
    let target = Vector3::new(4.0, 5.0, 6.0);
    resolver.set_body_position(&world.meteor, target).unwrap();
    resolver
        .set_body_velocity(&world.meteor, Vector3::new(0.0, -1.0, 0.0))
        .unwrap();
    assert_eq!(resolver.body_position(&world.meteor).unwrap(), target);
    let state = world.host.state_of(&world.meteor).unwrap();
    assert_eq!(state.velocity, Vector3::new(0.0, -1.0, 0.0));
}

#[test]
fn orientation_round_trips_through_host() {
    let world = sample_world();
    let resolver = resolver_for(&world.host);
    let forward = Vector3::new(1.0, 0.0, 0.0);
    let up = Vector3::new(0.0, 0.0, 1.0);
    resolver.set_orientation(&world.grid, forward, up).unwrap();
    assert_eq!(resolver.orientation(&world.grid).unwrap(), (forward, up));
}

#[test]
fn descriptor_reports_kind_and_name() {
    let world = sample_world();
    let resolver = resolver_for(&world.host);
    let d = resolver.descriptor(&world.grid).unwrap();
    assert_eq!(d.kind, EntityKind::CubeGrid);
    assert_eq!(d.entity_id, EntityId(1));
    assert_eq!(d.name, "Red Ship");
}

#[test]
fn host_fault_names_failing_role() {
    let world = sample_world();
    world
        .host
        .fail_role(roles::ENTITY_GET_ORIENTATION, "object disposed");
    let resolver = resolver_for(&world.host);
    match resolver.orientation(&world.voxel).unwrap_err() {
        HostError::Invocation(InvocationError::Faulted { role, fault }) => {
            assert_eq!(role, "Entity.GetOrientation");
            assert_eq!(fault.message, "object disposed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn add_and_id_generation() {
    let host = Arc::new(MockHost::new());
    let resolver = resolver_for(&host);
    let entity = host.create_detached(EntityKind::FloatingObject, EntityId::NONE);
    let id = resolver.generate_entity_id().unwrap();
    resolver.set_entity_id(&entity, id).unwrap();
    resolver.add_entity(&entity).unwrap();
    assert!(host.in_scene(&entity));
    assert_eq!(resolver.entity_id(&entity).unwrap(), id);
}

// ── properties ──────────────────────────────────────────────

proptest! {
    /// Resolving any standard member role twice yields the same handle,
    /// whatever order the roles are first touched in.
    #[test]
    fn resolution_is_idempotent(order in proptest::sample::subsequence(
        (0..IdentifierTable::standard().len()).collect::<Vec<_>>(),
        0..=IdentifierTable::standard().len(),
    ).prop_shuffle()) {
        let host = Arc::new(MockHost::new());
        let resolver = resolver_for(&host);
        let table = IdentifierTable::standard();
        let entries: Vec<_> = table.entries().copied().collect();
        for i in order {
            let role = entries[i].role;
            if role.is_member() {
                let a = resolver.resolve_member(role).unwrap();
                let b = resolver.resolve_member(role).unwrap();
                prop_assert_eq!(a, b);
            } else {
                let a = resolver.resolve_type(role).unwrap();
                let b = resolver.resolve_type(role).unwrap();
                prop_assert_eq!(a, b);
            }
        }
    }
}
