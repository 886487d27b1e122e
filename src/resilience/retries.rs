//! Retry and failover policy.
//!
//! # Responsibilities
//! - Decide, after a forwarding failure, between retrying the same backend
//!   and failing over to another one
//! - Enforce the global attempt ceiling for one inbound request
//!
//! # Design Decisions
//! - Fixed short delay between same-backend retries, not exponential
//! - Counters live in the request's `AttemptContext`, never in shared state

use std::time::Duration;

use crate::config::RetryConfig;
use crate::routing::AttemptContext;

/// What to do after a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Sleep for `delay`, then dispatch to the same backend again with `next`.
    RetrySame { delay: Duration, next: AttemptContext },
    /// Mark the backend dead and route again with `next`.
    Failover { next: AttemptContext },
}

/// Bounded retry/failover policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_delay: Duration,
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_attempts: config.max_attempts,
        }
    }

    /// True once a request has failed over more times than allowed.
    pub fn attempts_exhausted(&self, ctx: AttemptContext) -> bool {
        ctx.attempts() > self.max_attempts
    }

    /// Transition taken after a forwarding failure.
    pub fn on_failure(&self, ctx: AttemptContext) -> FailureAction {
        if ctx.retries() < self.max_retries {
            FailureAction::RetrySame {
                delay: self.retry_delay,
                next: ctx.next_retry(),
            }
        } else {
            FailureAction::Failover {
                next: ctx.next_attempt(),
            }
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
