//! Shared test utilities for all Patchwright test suites
//!
//! Provides a process-wide environment-variable guard and an atomic counter
//! shared across ALL tests in ALL crates, preventing race conditions between
//! tests that mutate process state.
//!
//! ## Usage
//!
//! In your test crate's `Cargo.toml`:
//! ```toml
//! [dev-dependencies]
//! patchwright-test-utils = { path = "../patchwright-test-utils" }
//! ```
//!
//! In your tests:
//! ```no_run
//! #[test]
//! fn my_env_test() {
//!     let _guard = patchwright_test_utils::env_guard();
//!     // ... mutate and read process env safely ...
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Global mutex serialising tests that touch process environment variables
///
/// `std::env::set_var` is process-global; concurrent test threads mutating it
/// race with every `from_env` reader. All tests that set or remove env vars
/// MUST hold this guard for their full duration.
static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Global atomic counter for unique resource names across ALL test crates
///
/// Prevents name collisions (queues, collections, temp namespaces) when tests
/// run in parallel across multiple crates.
static RESOURCE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Acquire the process-wide environment guard
///
/// Poisoned locks are recovered: a panicking env test must not wedge the rest
/// of the suite.
pub fn env_guard() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Get next unique resource counter value
///
/// Returns a monotonically increasing counter value that's unique across
/// ALL test crates. Combine with the test name to generate unique resource
/// names:
///
/// ```
/// use patchwright_test_utils::next_resource_counter;
///
/// let queue_name = format!("test_queue_{}", next_resource_counter());
/// ```
pub fn next_resource_counter() -> usize {
    RESOURCE_COUNTER.fetch_add(1, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments() {
        let start = next_resource_counter();
        let next = next_resource_counter();

        assert_eq!(next, start + 1);
    }

    #[test]
    fn guard_is_reentrant_across_sequential_acquisitions() {
        {
            let _guard = env_guard();
        }
        let _guard = env_guard();
    }
}
