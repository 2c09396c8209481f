//! Mutation bodies. Everything here runs on the host thread.

use std::thread;

use tracing::debug;

use tether_binding::BindingResolver;
use tether_core::{ActionOutcome, HostError, HostRef, MutationKind, Vector3};

use crate::config::SettleDelays;

pub(crate) const SKIP_UNREGISTERED: &str = "entity has no id";
pub(crate) const SKIP_NO_PAYLOAD: &str = "missing payload";

/// Run one typed mutation against `target`.
///
/// Targets reporting entity id 0 are skipped: the host has not
/// registered them and would reject or misroute the change.
pub(crate) fn apply(
    resolver: &BindingResolver,
    settle: SettleDelays,
    kind: MutationKind,
    target: &HostRef,
    payload: Option<Vector3>,
) -> Result<ActionOutcome, HostError> {
    let entity_id = resolver.entity_id(target)?;
    if !entity_id.is_assigned() {
        return Ok(ActionOutcome::Skipped {
            reason: SKIP_UNREGISTERED,
        });
    }

    let vector = match (kind.takes_payload(), payload) {
        (true, Some(v)) => v,
        (true, None) => {
            return Ok(ActionOutcome::Skipped {
                reason: SKIP_NO_PAYLOAD,
            })
        }
        (false, _) => Vector3::ZERO,
    };

    match kind {
        MutationKind::SetPosition => resolver.set_body_position(target, vector)?,
        MutationKind::SetVelocity => resolver.set_body_velocity(target, vector)?,
        MutationKind::SetAngularVelocity => resolver.set_body_angular_velocity(target, vector)?,
        MutationKind::SetUp => {
            let (forward, _) = resolver.orientation(target)?;
            resolver.set_orientation(target, forward, vector)?;
        }
        MutationKind::SetForward => {
            let (_, up) = resolver.orientation(target)?;
            resolver.set_orientation(target, vector, up)?;
        }
        MutationKind::Add => add(resolver, target)?,
        MutationKind::Remove => remove(resolver, settle, target)?,
    }

    debug!(
        action = kind.name(),
        entity_id = entity_id.0,
        payload = %vector,
        "mutation applied"
    );
    Ok(ActionOutcome::Applied)
}

/// Insert into the scene, then broadcast the descriptor so network
/// observers learn about the entity.
fn add(resolver: &BindingResolver, target: &HostRef) -> Result<(), HostError> {
    resolver.add_entity(target)?;
    let descriptor = resolver.descriptor(target)?;
    resolver.send_entity(&descriptor)
}

/// Restage the current physical position, settle, close, settle.
fn remove(
    resolver: &BindingResolver,
    settle: SettleDelays,
    target: &HostRef,
) -> Result<(), HostError> {
    let position = resolver.body_position(target)?;
    resolver.set_body_position(target, position)?;
    thread::sleep(settle.before_close);
    resolver.close_entity(target)?;
    thread::sleep(settle.after_close);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tether_binding::{roles, IdentifierTable};
    use tether_core::{EntityId, EntityKind};
    use tether_test_utils::MockHost;

    fn resolver(host: &Arc<MockHost>) -> BindingResolver {
        BindingResolver::initialize(host.clone(), Arc::new(IdentifierTable::standard())).unwrap()
    }

    #[test]
    fn set_up_keeps_forward() {
        let host = Arc::new(MockHost::new());
        let e = host.spawn(EntityKind::CubeGrid, EntityId(1), Vector3::ZERO);
        let forward_before = host.state_of(&e).unwrap().forward;
        let up = Vector3::new(1.0, 0.0, 0.0);
        let out = apply(&resolver(&host), SettleDelays::NONE, MutationKind::SetUp, &e, Some(up));
        assert_eq!(out, Ok(ActionOutcome::Applied));
        let state = host.state_of(&e).unwrap();
        assert_eq!(state.up, up);
        assert_eq!(state.forward, forward_before);
    }

    #[test]
    fn set_forward_keeps_up() {
        let host = Arc::new(MockHost::new());
        let e = host.spawn(EntityKind::CubeGrid, EntityId(1), Vector3::ZERO);
        let up_before = host.state_of(&e).unwrap().up;
        let forward = Vector3::new(0.0, 0.0, 1.0);
        apply(
            &resolver(&host),
            SettleDelays::NONE,
            MutationKind::SetForward,
            &e,
            Some(forward),
        )
        .unwrap();
        let state = host.state_of(&e).unwrap();
        assert_eq!(state.forward, forward);
        assert_eq!(state.up, up_before);
    }

    #[test]
    fn unregistered_target_is_skipped_without_mutation() {
        let host = Arc::new(MockHost::new());
        let e = host.spawn(EntityKind::Meteor, EntityId::NONE, Vector3::ZERO);
        let out = apply(
            &resolver(&host),
            SettleDelays::NONE,
            MutationKind::SetVelocity,
            &e,
            Some(Vector3::new(1.0, 1.0, 1.0)),
        );
        assert_eq!(
            out,
            Ok(ActionOutcome::Skipped {
                reason: SKIP_UNREGISTERED
            })
        );
        assert!(host.calls_to(roles::RIGID_BODY_SET_LINEAR_VELOCITY).is_empty());
    }

    #[test]
    fn payload_kind_without_payload_is_skipped() {
        let host = Arc::new(MockHost::new());
        let e = host.spawn(EntityKind::Meteor, EntityId(8), Vector3::ZERO);
        let out = apply(
            &resolver(&host),
            SettleDelays::NONE,
            MutationKind::SetPosition,
            &e,
            None,
        );
        assert_eq!(
            out,
            Ok(ActionOutcome::Skipped {
                reason: SKIP_NO_PAYLOAD
            })
        );
    }

    #[test]
    fn add_broadcasts_descriptor() {
        let host = Arc::new(MockHost::new());
        let e = host.create_detached(EntityKind::FloatingObject, EntityId(31));
        apply(&resolver(&host), SettleDelays::NONE, MutationKind::Add, &e, None).unwrap();
        assert!(host.in_scene(&e));
        let sent = host.sent_entities();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].entity_id, EntityId(31));
    }

    #[test]
    fn remove_restages_position_then_closes() {
        let host = Arc::new(MockHost::new());
        let e = host.spawn(EntityKind::CubeGrid, EntityId(5), Vector3::new(3.0, 2.0, 1.0));
        apply(&resolver(&host), SettleDelays::NONE, MutationKind::Remove, &e, None).unwrap();
        let order: Vec<_> = host
            .calls()
            .into_iter()
            .map(|c| c.role)
            .filter(|r| *r == roles::RIGID_BODY_SET_POSITION || *r == roles::ENTITY_CLOSE)
            .collect();
        assert_eq!(order, vec![roles::RIGID_BODY_SET_POSITION, roles::ENTITY_CLOSE]);
        assert!(!host.in_scene(&e));
        assert_eq!(host.state_of(&e).unwrap().position, Vector3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn host_fault_fails_action() {
        let host = Arc::new(MockHost::new());
        let e = host.spawn(EntityKind::CubeGrid, EntityId(5), Vector3::ZERO);
        host.fail_role(roles::RIGID_BODY_SET_ANGULAR_VELOCITY, "body asleep");
        let out = apply(
            &resolver(&host),
            SettleDelays::NONE,
            MutationKind::SetAngularVelocity,
            &e,
            Some(Vector3::new(0.0, 1.0, 0.0)),
        );
        assert!(matches!(out, Err(HostError::Invocation(_))));
    }
}
