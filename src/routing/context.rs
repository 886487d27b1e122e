//! Per-request attempt counters.

/// Counters carried by a single inbound request while it is retried and
/// rerouted. Never shared between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptContext {
    /// Failovers to a different backend so far.
    attempts: u32,
    /// Retries against the current backend so far.
    retries: u32,
}

impl AttemptContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that has already failed over `attempts` times.
    pub fn with_attempts(attempts: u32) -> Self {
        Self { attempts, retries: 0 }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Same backend, one more retry.
    pub fn next_retry(self) -> Self {
        Self {
            retries: self.retries + 1,
            ..self
        }
    }

    /// Moving to another backend: retries reset, attempts never do.
    pub fn next_attempt(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            retries: 0,
        }
    }
}
