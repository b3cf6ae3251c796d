//! Non-blocking per-job overlap guard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Capacity-one token: at most one [`RunPermit`] exists at a time.
///
/// Acquisition never waits. A caller that loses the race gets `None` and is
/// expected to skip its run.
#[derive(Debug, Default)]
pub struct RunGuard {
    busy: AtomicBool,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the token if it is free.
    pub fn try_acquire(&self) -> Option<RunPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| RunPermit { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the token. Dropping it (including during unwinding)
/// hands the token back.
#[derive(Debug)]
pub struct RunPermit<'a> {
    guard: &'a RunGuard,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let guard = RunGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn permit_is_released_on_panic() {
        let guard = RunGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = guard.try_acquire().unwrap();
            panic!("job blew up");
        }));
        assert!(result.is_err());
        assert!(!guard.is_busy());
    }
}
