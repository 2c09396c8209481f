//! Scoped shared access to the host's resource lock.
//!
//! The host guards its entity collections with its own reader/writer
//! lock. [`ResourceLockAdapter`] fetches that lock through the resolver
//! once, then wraps each read in acquire/release. Release runs from a
//! drop guard, so it happens on every exit path including unwinding.

use std::sync::{Arc, OnceLock};

use tracing::warn;

use tether_binding::BindingResolver;
use tether_core::{HostLock, LockAcquisitionError};

/// Releases one shared acquisition when dropped.
struct SharedGuard<'a> {
    lock: &'a dyn HostLock,
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_shared();
    }
}

/// Scoped, unwind-safe wrapper over the host's resource lock.
pub struct ResourceLockAdapter {
    resolver: Arc<BindingResolver>,
    lock: OnceLock<Arc<dyn HostLock>>,
}

impl ResourceLockAdapter {
    /// Adapter that fetches the lock through `resolver` on first use.
    pub fn new(resolver: Arc<BindingResolver>) -> Self {
        Self {
            resolver,
            lock: OnceLock::new(),
        }
    }

    /// The host lock, fetched and cached on first success.
    ///
    /// A failed fetch is not cached; the next call asks the host again.
    pub fn host_lock(&self) -> Result<Arc<dyn HostLock>, LockAcquisitionError> {
        if let Some(lock) = self.lock.get() {
            return Ok(Arc::clone(lock));
        }
        let fetched = self.resolver.resource_lock().map_err(|e| {
            warn!(error = %e, "host resource lock unavailable");
            LockAcquisitionError {
                reason: e.to_string(),
            }
        })?;
        Ok(Arc::clone(self.lock.get_or_init(|| fetched)))
    }

    /// Run `body` while holding shared access to the host lock.
    ///
    /// The lock is released after `body` returns or unwinds. Failure to
    /// acquire is returned to the caller; `body` does not run.
    pub fn with_read_lock<T>(&self, body: impl FnOnce() -> T) -> Result<T, LockAcquisitionError> {
        let lock = self.host_lock()?;
        lock.acquire_shared().map_err(|fault| {
            warn!(error = %fault, "host resource lock acquisition failed");
            LockAcquisitionError {
                reason: fault.message,
            }
        })?;
        let _guard = SharedGuard { lock: lock.as_ref() };
        Ok(body())
    }
}

// Compile-time assertion: ResourceLockAdapter must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ResourceLockAdapter>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use tether_binding::{roles, IdentifierTable};
    use tether_test_utils::MockHost;

    fn adapter(host: &Arc<MockHost>) -> ResourceLockAdapter {
        let resolver =
            BindingResolver::initialize(host.clone(), Arc::new(IdentifierTable::standard()))
                .unwrap();
        ResourceLockAdapter::new(Arc::new(resolver))
    }

    #[test]
    fn body_runs_under_shared_lock() {
        let host = Arc::new(MockHost::new());
        let adapter = adapter(&host);
        let held = adapter.with_read_lock(|| host.lock().readers()).unwrap();
        assert_eq!(held, 1);
        assert_eq!(host.lock().readers(), 0);
    }

    #[test]
    fn lock_is_fetched_once() {
        let host = Arc::new(MockHost::new());
        let adapter = adapter(&host);
        adapter.with_read_lock(|| ()).unwrap();
        adapter.with_read_lock(|| ()).unwrap();
        assert_eq!(host.calls_to(roles::OBJECT_MANAGER_RESOURCE_LOCK).len(), 1);
        assert_eq!(host.lock().total_shared_acquisitions(), 2);
    }

    #[test]
    fn released_after_panic() {
        let host = Arc::new(MockHost::new());
        let adapter = adapter(&host);
        let result = catch_unwind(AssertUnwindSafe(|| {
            adapter.with_read_lock(|| panic!("body failed")).unwrap();
        }));
        assert!(result.is_err());
        assert_eq!(host.lock().readers(), 0);
        assert!(host.lock().try_acquire_exclusive());
        host.lock().release_exclusive();
    }

    #[test]
    fn acquisition_failure_propagates_without_running_body() {
        let host = Arc::new(MockHost::new());
        let adapter = adapter(&host);
        host.lock().fail_next_acquire("lock torn down");
        let mut ran = false;
        let err = adapter.with_read_lock(|| ran = true).unwrap_err();
        assert_eq!(err.reason, "lock torn down");
        assert!(!ran);
        assert_eq!(host.lock().readers(), 0);
    }

    #[test]
    fn missing_lock_member_is_acquisition_error() {
        let host = Arc::new(MockHost::without(&[roles::OBJECT_MANAGER_RESOURCE_LOCK]));
        let adapter = adapter(&host);
        let err = adapter.with_read_lock(|| ()).unwrap_err();
        assert!(err.reason.contains("ObjectManager.ResourceLock"));
    }
}
