//! Round-robin rotation cursor.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared rotation cursor.
/// A single atomic word; every advance consumes a distinct value.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cursor at an arbitrary value.
    pub fn starting_at(value: u64) -> Self {
        Self {
            counter: AtomicU64::new(value),
        }
    }

    /// Atomically increment the cursor and return the post-increment value.
    /// Wraps at `u64::MAX`.
    pub fn advance(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    /// Advance and map the result onto `0..len`.
    pub fn next_index(&self, len: usize) -> usize {
        (self.advance() % len as u64) as usize
    }

    /// Force the cursor to a known position.
    pub fn store(&self, index: usize) {
        self.counter.store(index as u64, Ordering::SeqCst);
    }

    /// Current cursor value.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}
