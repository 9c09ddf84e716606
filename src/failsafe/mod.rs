//! Failsafe mechanisms: circuit breaker, sliding failure window, retry

mod circuit_breaker;
mod retry;
mod window;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use retry::{RetryPolicy, with_retry};
pub use window::FailureWindow;

use std::sync::Arc;

use crate::config::FailsafeConfig;

/// Combined failsafe wrapper for the upstream
#[derive(Clone)]
pub struct Failsafe {
    /// Circuit breaker
    pub circuit_breaker: Arc<CircuitBreaker>,
    /// Retry policy
    pub retry_policy: RetryPolicy,
}

impl Failsafe {
    /// Create a new failsafe from configuration
    #[must_use]
    pub fn new(name: &str, config: &FailsafeConfig) -> Self {
        Self {
            circuit_breaker: Arc::new(CircuitBreaker::new(name, &config.circuit_breaker)),
            retry_policy: RetryPolicy::new(&config.retry),
        }
    }
}
