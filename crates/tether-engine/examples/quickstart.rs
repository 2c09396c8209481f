//! Tether Quickstart: attach to a host, enumerate, and mutate.
//!
//! Demonstrates:
//!   1. Attaching a `HostContext` to a host module
//!   2. Snapshotting and classifying live entities
//!   3. Scheduling typed mutations from a worker thread
//!   4. Letting a `HostLoop` step the host and drain the queue
//!   5. Spawning a new entity and removing an old one
//!
//! The host here is the in-memory mock from `tether-test-utils`.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tether_core::{EntityId, EntityKind, Vector3};
use tether_engine::{BridgeConfig, HostContext, HostLoop, SettleDelays};
use tether_test_utils::sample_world;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_thread_names(true)
        .init();

    // ─── Attach ─────────────────────────────────────────────────

    let world = sample_world();
    let config = BridgeConfig {
        settle: SettleDelays {
            before_close: Duration::from_millis(100),
            after_close: Duration::from_millis(100),
        },
        tick_rate_hz: 30.0,
        ..BridgeConfig::default()
    };
    let (ctx, executor) = HostContext::initialize(world.host.clone(), config.clone())?;

    // ─── Enumerate ──────────────────────────────────────────────

    let lists = ctx.entity_lists();
    for grid in lists.cube_grids()? {
        println!("grid {} ({}) at {}", grid.id()?, grid.display_name(), grid.position());
    }
    println!(
        "{} characters, {} voxel maps, {} floating objects, {} meteors",
        lists.characters()?.len(),
        lists.voxel_maps()?.len(),
        lists.floating_objects()?.len(),
        lists.meteors()?.len(),
    );

    // ─── Drive the host ─────────────────────────────────────────

    let host = Arc::clone(&world.host);
    let dt = 1.0 / config.tick_rate_hz as f32;
    let host_loop = HostLoop::spawn(executor, &config, move || host.step(dt))?;

    // ─── Mutate from another thread ─────────────────────────────

    let worker_ctx = ctx.clone();
    thread::spawn(move || -> Result<(), tether_core::QueueError> {
        if let Ok(mut meteors) = worker_ctx.entity_lists().meteors() {
            for meteor in &mut meteors {
                meteor.set_velocity(Vector3::new(0.0, -20.0, 0.0))?;
            }
        }
        Ok(())
    })
    .join()
    .map_err(|_| "worker panicked")??;

    // ─── Spawn and remove ───────────────────────────────────────

    let cargo = world
        .host
        .create_detached(EntityKind::FloatingObject, EntityId::NONE);
    ctx.ensure_entity_id(&cargo)?;
    ctx.base_entity(cargo)?.add_to_world()?;

    if let Some(grid) = ctx.entity_lists().cube_grids()?.into_iter().next() {
        grid.remove_from_world()?;
    }

    thread::sleep(Duration::from_millis(600));
    let executor = host_loop.shutdown()?;

    let metrics = executor.metrics();
    println!(
        "scheduled {} / applied {} / skipped {} / failed {}",
        metrics.scheduled, metrics.applied, metrics.skipped, metrics.failed
    );
    println!("{} entities live", ctx.snapshot_entities()?.len());
    println!("broadcast {} new entities", world.host.sent_entities().len());
    Ok(())
}
