//! Protected write path: circuit breaker + retried upstream call

use std::sync::Arc;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::failsafe::{Failsafe, with_retry};
use crate::upstream::UpstreamClient;
use crate::Result;

/// Dispatches write requests through the circuit breaker and retry layer
#[derive(Clone)]
pub struct Dispatcher {
    upstream: Arc<UpstreamClient>,
    failsafe: Failsafe,
}

impl Dispatcher {
    /// Create a new dispatcher
    #[must_use]
    pub fn new(upstream: Arc<UpstreamClient>, failsafe: Failsafe) -> Self {
        Self { upstream, failsafe }
    }

    /// Forward a write to the upstream under breaker protection.
    ///
    /// The breaker brackets the call: one `permit`, then exactly one of
    /// `on_success`/`on_failure` once the retried call resolves. A rejected
    /// permit returns before any upstream traffic.
    pub async fn protected_call(&self, path: &str, body: Value) -> Result<Value> {
        let breaker = &self.failsafe.circuit_breaker;
        breaker.permit(Instant::now())?;

        let body = inject_generation_id(body);

        match with_retry(&self.failsafe.retry_policy, path, || {
            self.upstream.post_json(path, &body)
        })
        .await
        {
            Ok(payload) => {
                breaker.on_success();
                debug!(path, "Protected call succeeded");
                Ok(payload)
            }
            Err(e) => {
                breaker.on_failure(Instant::now());
                warn!(path, error = %e, "Protected call failed after upstream attempts");
                Err(e)
            }
        }
    }
}

/// Stamp the forwarded body with a generation id (epoch millis) unless the
/// client already supplied one.
fn inject_generation_id(mut body: Value) -> Value {
    if let Some(obj) = body.as_object_mut() {
        if !obj.contains_key("id") {
            obj.insert(
                "id".to_string(),
                Value::from(chrono::Utc::now().timestamp_millis()),
            );
        }
    }
    body
}
