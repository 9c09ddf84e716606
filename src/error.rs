//! Error types for the event gateway

use std::io;

use thiserror::Error;

/// Result type alias for the event gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Event gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure reaching the upstream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream responded with a non-success status
    #[error("Upstream returned {status} for {path}")]
    UpstreamStatus {
        /// HTTP status code
        status: u16,
        /// Request path
        path: String,
    },

    /// Retry budget exhausted; wraps the last transport/status failure
    #[error("Upstream call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total attempts made (initial call + retries)
        attempts: u32,
        /// Last failure cause
        #[source]
        source: Box<Error>,
    },

    /// Circuit breaker is open; no call was attempted
    #[error("Circuit breaker open, retry in {retry_in_ms}ms")]
    CircuitOpen {
        /// Milliseconds until the next probe is admitted
        retry_in_ms: u64,
    },

    /// Circuit breaker is half-open with a probe already in flight
    #[error("Circuit breaker half-open, probe in flight")]
    ProbeInFlight,

    /// A fan-out child fetch failed; the aggregate is all-or-nothing
    #[error("Fan-out fetch for child {child_id} failed: {source}")]
    AggregateChild {
        /// Id of the child whose fetch failed
        child_id: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when no upstream call was attempted (breaker fast-fail).
    /// Distinguished in logs from an upstream-attempted failure even though
    /// both surface as 503 to the caller.
    #[must_use]
    pub fn is_fast_fail(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. } | Self::ProbeInFlight)
    }
}
