//! Benchmark profiles for the Tether host bridge.
//!
//! - [`populated_host`]: an in-memory host with `n` entities spread across
//!   the typed kinds
//! - [`bench_context`]: a [`HostContext`] over such a host with settle
//!   delays disabled

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use tether_core::{EntityId, EntityKind, HostRef, Vector3};
use tether_engine::{BridgeConfig, HostContext, MutationExecutor, SettleDelays, StagingMode};
use tether_test_utils::MockHost;

const KINDS: [EntityKind; 5] = [
    EntityKind::CubeGrid,
    EntityKind::Character,
    EntityKind::VoxelMap,
    EntityKind::FloatingObject,
    EntityKind::Meteor,
];

/// A host with `n` live entities, ids `1..=n`, cycling through the typed kinds.
pub fn populated_host(n: usize) -> (Arc<MockHost>, Vec<HostRef>) {
    let host = Arc::new(MockHost::new());
    let entities = (0..n)
        .map(|i| {
            let kind = KINDS[i % KINDS.len()];
            let position = Vector3::new(i as f32, 0.0, 0.0);
            host.spawn(kind, EntityId(i as i64 + 1), position)
        })
        .collect();
    (host, entities)
}

/// Bridge configuration for benchmarks: no settle sleeps.
pub fn bench_config(staging: StagingMode) -> BridgeConfig {
    BridgeConfig {
        settle: SettleDelays::NONE,
        staging,
        ..BridgeConfig::default()
    }
}

/// Attach a context to `host` with [`bench_config`].
pub fn bench_context(host: Arc<MockHost>, staging: StagingMode) -> (HostContext, MutationExecutor) {
    HostContext::initialize(host, bench_config(staging)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populated_host_cycles_kinds() {
        let (host, entities) = populated_host(10);
        assert_eq!(host.scene_len(), 10);
        assert_eq!(
            host.state_of(&entities[6]).unwrap().kind,
            EntityKind::Character
        );
    }

    #[test]
    fn bench_context_snapshots_everything() {
        let (host, _) = populated_host(25);
        let (ctx, _executor) = bench_context(host, StagingMode::Inline);
        assert_eq!(ctx.snapshot_entities().unwrap().len(), 25);
        assert_eq!(ctx.entity_lists().meteors().unwrap().len(), 5);
    }
}
