//! Dedicated host-tick thread.
//!
//! For embeddings where the bridge itself drives the host's update hook,
//! [`HostLoop`] owns the [`MutationExecutor`] on a named thread. Each
//! tick it runs the host step callback, then drains the queue, then parks
//! for the rest of the tick budget. `park_timeout` is used instead of
//! `sleep` so shutdown wakes the thread immediately. A panicking step is
//! logged and the tick's drain still runs.
//!
//! [`shutdown`](HostLoop::shutdown) joins the thread and hands the
//! executor back.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use tether_core::QueueError;

use crate::config::{BridgeConfig, ConfigError};
use crate::queue::{panic_message, MutationExecutor};

struct LoopState<F> {
    executor: MutationExecutor,
    step: F,
    shutdown: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    budget: Duration,
}

impl<F: FnMut()> LoopState<F> {
    /// Runs until shutdown or until every producer is gone.
    fn run(mut self) -> MutationExecutor {
        self.executor.bind_current_thread();
        while !self.shutdown.load(Ordering::Acquire) {
            let tick_start = Instant::now();

            if let Err(payload) = catch_unwind(AssertUnwindSafe(&mut self.step)) {
                warn!(
                    tick = self.ticks.load(Ordering::Acquire),
                    panic = %panic_message(payload.as_ref()),
                    "host step panicked"
                );
            }

            match self.executor.drain_and_execute() {
                Ok(report) if !report.is_empty() => debug!(
                    executed = report.receipts.len(),
                    failed = report.failed(),
                    remaining = report.remaining,
                    "host tick drained"
                ),
                Ok(_) => {}
                Err(QueueError::Disconnected) => {
                    info!("all producers gone, host loop stopping");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "host loop drain failed");
                    break;
                }
            }
            self.ticks.fetch_add(1, Ordering::Release);

            let elapsed = tick_start.elapsed();
            if elapsed < self.budget {
                thread::park_timeout(self.budget - elapsed);
            }
        }
        self.executor
    }
}

/// Background thread that steps the host and drains the mutation queue.
pub struct HostLoop {
    shutdown: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<MutationExecutor>>,
}

impl HostLoop {
    /// Spawn the loop at `config.tick_rate_hz`, taking ownership of `executor`.
    ///
    /// `step` runs on the loop thread before every drain; pass `|| {}` when
    /// the host advances on its own.
    pub fn spawn<F>(
        executor: MutationExecutor,
        config: &BridgeConfig,
        step: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut() + Send + 'static,
    {
        config.validate()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let state = LoopState {
            executor,
            step,
            shutdown: Arc::clone(&shutdown),
            ticks: Arc::clone(&ticks),
            budget: config.tick_budget(),
        };
        let handle = thread::Builder::new()
            .name("tether-host".into())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;
        info!(tick_rate_hz = config.tick_rate_hz, "host loop started");
        Ok(Self {
            shutdown,
            ticks,
            handle: Some(handle),
        })
    }

    /// Completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Whether the loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the loop and recover the executor.
    ///
    /// Entries still queued stay queued; drain them from the new host
    /// thread if needed.
    pub fn shutdown(mut self) -> Result<MutationExecutor, ConfigError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<MutationExecutor, ConfigError> {
        self.shutdown.store(true, Ordering::Release);
        let handle = self.handle.take().ok_or(ConfigError::ExecutorRecoveryFailed)?;
        handle.thread().unpark();
        let executor = handle
            .join()
            .map_err(|_| ConfigError::ExecutorRecoveryFailed)?;
        info!(ticks = self.ticks(), "host loop stopped");
        Ok(executor)
    }
}

impl Drop for HostLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop() {
                warn!(error = %e, "host loop dropped without recovering executor");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::mutation_queue;
    use std::sync::atomic::AtomicUsize;
    use tether_binding::{BindingResolver, IdentifierTable};
    use tether_test_utils::MockHost;

    fn fast_config() -> BridgeConfig {
        BridgeConfig {
            tick_rate_hz: 500.0,
            ..BridgeConfig::default()
        }
    }

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        done()
    }

    #[test]
    fn loop_steps_and_drains() {
        let host = Arc::new(MockHost::new());
        let resolver = Arc::new(
            BindingResolver::initialize(host, Arc::new(IdentifierTable::standard())).unwrap(),
        );
        let (queue, executor) = mutation_queue(resolver, &fast_config());
        let steps = Arc::new(AtomicUsize::new(0));
        let step_counter = Arc::clone(&steps);
        let host_loop = HostLoop::spawn(executor, &fast_config(), move || {
            step_counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        let ran_on = Arc::new(std::sync::Mutex::new(None));
        let slot = Arc::clone(&ran_on);
        queue
            .schedule_action("where", move |_| {
                *slot.lock().unwrap() = thread::current().name().map(str::to_string);
                Ok(())
            })
            .unwrap();

        assert!(wait_until(Duration::from_secs(2), || queue.metrics().applied == 1));
        assert!(steps.load(Ordering::Relaxed) > 0);
        assert_eq!(ran_on.lock().unwrap().as_deref(), Some("tether-host"));

        let executor = host_loop.shutdown().unwrap();
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    fn slow_tick_rate_still_shuts_down_fast() {
        let host = Arc::new(MockHost::new());
        let resolver = Arc::new(
            BindingResolver::initialize(host, Arc::new(IdentifierTable::standard())).unwrap(),
        );
        let config = BridgeConfig {
            tick_rate_hz: 0.2,
            ..BridgeConfig::default()
        };
        let (_queue, executor) = mutation_queue(resolver, &config);
        let host_loop = HostLoop::spawn(executor, &config, || {}).unwrap();
        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        host_loop.shutdown().unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn loop_exits_when_producers_drop() {
        let host = Arc::new(MockHost::new());
        let resolver = Arc::new(
            BindingResolver::initialize(host, Arc::new(IdentifierTable::standard())).unwrap(),
        );
        let (queue, executor) = mutation_queue(resolver, &fast_config());
        let host_loop = HostLoop::spawn(executor, &fast_config(), || {}).unwrap();
        drop(queue);
        assert!(wait_until(Duration::from_secs(2), || host_loop.is_finished()));
        assert!(host_loop.shutdown().is_ok());
    }

    #[test]
    fn panicking_step_does_not_stop_draining() {
        let host = Arc::new(MockHost::new());
        let resolver = Arc::new(
            BindingResolver::initialize(host, Arc::new(IdentifierTable::standard())).unwrap(),
        );
        let (queue, executor) = mutation_queue(resolver, &fast_config());
        let steps = Arc::new(AtomicUsize::new(0));
        let step_counter = Arc::clone(&steps);
        let host_loop = HostLoop::spawn(executor, &fast_config(), move || {
            if step_counter.fetch_add(1, Ordering::Relaxed) % 2 == 0 {
                panic!("host step blew up");
            }
        })
        .unwrap();

        for i in 0..3 {
            queue
                .schedule_action(format!("after-panic-{i}"), |_| Ok(()))
                .unwrap();
        }
        assert!(wait_until(Duration::from_secs(2), || queue.metrics().applied == 3));
        assert!(steps.load(Ordering::Relaxed) >= 1);
        assert!(!host_loop.is_finished());

        let executor = host_loop.shutdown().unwrap();
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    fn invalid_rate_refuses_to_spawn() {
        let host = Arc::new(MockHost::new());
        let resolver = Arc::new(
            BindingResolver::initialize(host, Arc::new(IdentifierTable::standard())).unwrap(),
        );
        let config = BridgeConfig {
            tick_rate_hz: 0.0,
            ..BridgeConfig::default()
        };
        let (_queue, executor) = mutation_queue(resolver, &BridgeConfig::default());
        assert!(matches!(
            HostLoop::spawn(executor, &config, || {}),
            Err(ConfigError::InvalidTickRate { .. })
        ));
    }
}
