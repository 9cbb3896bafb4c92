use std::{
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
    time::Duration,
};

pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Cooperative, non-reentrant mutual exclusion for short critical sections.
///
/// Waiters poll the flag and yield to the scheduler between attempts instead of blocking
/// a worker thread. The lock must never be held across a backing fetch: contenders would
/// spin for the whole duration of the remote call.
#[derive(Debug)]
pub struct ExclusionLock {
    held:          AtomicBool,
    poll_interval: Duration,
}

/// Held lock. Dropping it (or calling [`ExclusionGuard::release`]) frees the lock.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ExclusionGuard<'a> {
    lock: &'a ExclusionLock,
}

impl ExclusionLock {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            held: AtomicBool::new(false),
            poll_interval,
        }
    }

    pub fn try_acquire(&self) -> Option<ExclusionGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| ExclusionGuard { lock: self })
    }

    /// Suspends until the lock is free, then takes it. Retries indefinitely; wrap the call in
    /// `tokio::time::timeout` for a hard bound.
    pub async fn acquire(&self) -> ExclusionGuard<'_> {
        loop {
            if let Some(guard) = self.try_acquire() {
                return guard;
            }
            if self.poll_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Default for ExclusionLock {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_POLL_INTERVAL)
    }
}

impl ExclusionGuard<'_> {
    pub fn release(self) {}
}

impl Drop for ExclusionGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}
