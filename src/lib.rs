//! Event Gateway Library
//!
//! Resilient HTTP gateway fronting a single upstream event service.
//!
//! # Features
//!
//! - **Circuit breaker**: sliding-window failure accounting with a
//!   single-probe half-open recovery path
//! - **Bounded retries**: linear backoff with a predictable worst-case latency
//! - **Parallel fan-out**: concurrent child fetches with deterministic
//!   response ordering and all-or-nothing failure semantics
//! - **Production ready**: health endpoints, structured logging, graceful
//!   shutdown

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod failsafe;
pub mod gateway;
pub mod upstream;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
