//! One-time lease configuration per address.
//!
//! `LeaseGuard` remembers every address whose connection lease has been
//! configured. The membership check and the insert happen under one lock, so
//! concurrent first requests to the same address configure it exactly once.
//! The set only grows.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct LeaseGuard {
    seen: Mutex<HashSet<String>>,
}

impl LeaseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `configure` for `address` unless it already ran for it.
    ///
    /// Returns `true` if `configure` was called. The lock is held while
    /// `configure` runs, so it must not block on I/O.
    pub fn ensure<F>(&self, address: &str, configure: F) -> bool
    where
        F: FnOnce(),
    {
        // The address is inserted last, so a poisoned set is still accurate.
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.contains(address) {
            return false;
        }
        configure();
        seen.insert(address.to_string());
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(address)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn configures_each_address_once() {
        let guard = LeaseGuard::new();
        assert!(guard.is_empty());
        let calls = AtomicUsize::new(0);
        let bump = || {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        assert!(guard.ensure("http://a/", bump));
        assert!(!guard.ensure("http://a/", bump));
        assert!(guard.ensure("http://b/", bump));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(guard.len(), 2);
        assert!(!guard.is_empty());
        assert!(guard.contains("http://a/"));
    }

    #[test]
    fn concurrent_first_calls_configure_once() {
        let guard = Arc::new(LeaseGuard::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    guard.ensure("http://shared/", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        let configured = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ran| *ran)
            .count();
        assert_eq!(configured, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_configure_does_not_record_address() {
        let guard = Arc::new(LeaseGuard::new());
        let clone = Arc::clone(&guard);
        let result = std::thread::spawn(move || {
            clone.ensure("http://boom/", || panic!("configure failed"));
        })
        .join();
        assert!(result.is_err());
        assert!(!guard.contains("http://boom/"));
        assert!(guard.ensure("http://boom/", || {}));
    }
}
