//! Reader/writer lock standing in for the host's resource lock.

use std::sync::{Condvar, Mutex, MutexGuard};

use tether_core::{HostFault, HostLock};

#[derive(Default)]
struct LockState {
    readers: usize,
    writer: bool,
    fail_next: Option<String>,
    total_shared: u64,
}

/// Blocking reader/writer lock with explicit acquire/release calls.
///
/// The bridge takes it shared through [`HostLock`]; the mock host takes
/// it exclusive around its own scene mutations, the way the real host
/// does during a simulation step.
#[derive(Default)]
pub struct MockLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

impl MockLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        // A panicking test thread must not wedge the lock for the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of shared holders right now.
    pub fn readers(&self) -> usize {
        self.state().readers
    }

    /// Whether an exclusive holder is active.
    pub fn is_write_locked(&self) -> bool {
        self.state().writer
    }

    /// Shared acquisitions since creation.
    pub fn total_shared_acquisitions(&self) -> u64 {
        self.state().total_shared
    }

    /// Make the next shared acquisition fail with `message`.
    pub fn fail_next_acquire(&self, message: impl Into<String>) {
        self.state().fail_next = Some(message.into());
    }

    /// Block until exclusive access is granted.
    pub fn acquire_exclusive(&self) {
        let mut state = self.state();
        while state.writer || state.readers > 0 {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
        state.writer = true;
    }

    /// Take exclusive access only if nobody holds the lock.
    pub fn try_acquire_exclusive(&self) -> bool {
        let mut state = self.state();
        if state.writer || state.readers > 0 {
            return false;
        }
        state.writer = true;
        true
    }

    /// Release exclusive access.
    pub fn release_exclusive(&self) {
        let mut state = self.state();
        state.writer = false;
        drop(state);
        self.changed.notify_all();
    }

    /// Run `f` with exclusive access.
    pub fn with_exclusive<T>(&self, f: impl FnOnce() -> T) -> T {
        self.acquire_exclusive();
        let out = f();
        self.release_exclusive();
        out
    }
}

impl HostLock for MockLock {
    fn acquire_shared(&self) -> Result<(), HostFault> {
        let mut state = self.state();
        if let Some(message) = state.fail_next.take() {
            return Err(HostFault::new(message));
        }
        while state.writer {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
        state.readers += 1;
        state.total_shared += 1;
        Ok(())
    }

    fn release_shared(&self) {
        let mut state = self.state();
        state.readers = state.readers.saturating_sub(1);
        drop(state);
        self.changed.notify_all();
    }
}
