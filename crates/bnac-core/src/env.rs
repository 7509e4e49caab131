//! Environment abstraction.
//!
//! Time and randomness come from the caller so the same code runs against the
//! system clock in production and against virtual time in tests and
//! simulation.

use std::{
    future::Future,
    time::{Duration, Instant},
};

/// Source of time and randomness.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Wait for `duration` to elapse.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}
