//! Circuit breaker implementation

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::window::FailureWindow;
use crate::config::CircuitBreakerConfig;
use crate::{Error, Result};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed (allowing requests)
    Closed,
    /// Circuit is open (blocking requests)
    Open,
    /// Circuit is half-open (allowing a single probe request)
    HalfOpen,
}

/// Mutable breaker state, guarded as one unit so that
/// `permit`/`on_success`/`on_failure` are linearizable. Two concurrent
/// requests must never both be admitted as "the probe".
struct Inner {
    state: CircuitState,
    /// Earliest instant at which an Open circuit admits a probe
    next_probe_at: Option<Instant>,
    /// Set while the single half-open probe call is in flight
    probe_in_flight: bool,
}

/// Circuit breaker for upstream protection
///
/// Failures are counted over a sliding time window; once the windowed count
/// reaches the threshold the circuit opens and rejects calls without touching
/// the upstream. After the cooldown a single probe call is admitted; its
/// outcome decides between closing the circuit and another cooldown round.
pub struct CircuitBreaker {
    /// Breaker name (for logs)
    name: String,
    enabled: bool,
    failure_threshold: u32,
    open_duration: Duration,
    /// Sliding failure window; only mutated while `inner` is locked
    window: FailureWindow,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(name: &str, config: &CircuitBreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            enabled: config.enabled,
            failure_threshold: config.failure_threshold,
            open_duration: config.open_duration(),
            window: FailureWindow::new(config.window()),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                next_probe_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Decide whether a protected call may proceed at `now`.
    ///
    /// Every `Ok(())` must be balanced by exactly one later call to
    /// [`on_success`](Self::on_success) or [`on_failure`](Self::on_failure);
    /// an unreported permitted call desynchronizes the breaker.
    ///
    /// # Errors
    ///
    /// [`Error::CircuitOpen`] while the cooldown is running, or
    /// [`Error::ProbeInFlight`] when the half-open probe slot is taken.
    pub fn permit(&self, now: Instant) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let next_probe_at = inner
                    .next_probe_at
                    .unwrap_or_else(|| now + self.open_duration);
                if now >= next_probe_at {
                    // Cooldown elapsed: this call becomes the probe
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    debug!(breaker = %self.name, "Circuit breaker half-open, admitting probe");
                    Ok(())
                } else {
                    let retry_in_ms =
                        u64::try_from(next_probe_at.saturating_duration_since(now).as_millis())
                            .unwrap_or(u64::MAX);
                    warn!(
                        breaker = %self.name,
                        retry_in_ms,
                        "Circuit open, rejecting request"
                    );
                    Err(Error::CircuitOpen { retry_in_ms })
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    debug!(breaker = %self.name, "Probe in flight, rejecting request");
                    Err(Error::ProbeInFlight)
                } else {
                    inner.probe_in_flight = true;
                    debug!(breaker = %self.name, "Circuit half-open, admitting probe");
                    Ok(())
                }
            }
        }
    }

    /// Record a successful protected call
    pub fn on_success(&self) {
        if !self.enabled {
            return;
        }

        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                // Reset-on-success: successes clear the whole window so only
                // densely clustered failures can trip the breaker
                self.window.reset();
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.probe_in_flight = false;
                inner.next_probe_at = None;
                self.window.reset();
                info!(breaker = %self.name, "Probe succeeded, circuit breaker closed");
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed protected call at `now`
    pub fn on_failure(&self, now: Instant) {
        if !self.enabled {
            return;
        }

        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                self.window.record(now);
                let failures = self.window.count(now);
                if failures >= self.failure_threshold as usize {
                    inner.state = CircuitState::Open;
                    inner.next_probe_at = Some(now + self.open_duration);
                    warn!(
                        breaker = %self.name,
                        failures,
                        threshold = self.failure_threshold,
                        "Circuit breaker opened"
                    );
                } else {
                    debug!(
                        breaker = %self.name,
                        failures,
                        threshold = self.failure_threshold,
                        "Failure in closed state"
                    );
                }
            }
            CircuitState::HalfOpen => {
                // Failed probe: back to cooldown, dated from the failure
                self.window.record(now);
                inner.state = CircuitState::Open;
                inner.next_probe_at = Some(now + self.open_duration);
                inner.probe_in_flight = false;
                warn!(breaker = %self.name, "Probe failed, circuit breaker reopened");
            }
            CircuitState::Open => {}
        }
    }

    /// Get current state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }
}
