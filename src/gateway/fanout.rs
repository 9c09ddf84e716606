//! Parallel fan-out for the "events of a user" read path
//!
//! Fetches the user, then every referenced event concurrently. Results come
//! back in the order of the user's event-id list regardless of completion
//! order, and the aggregate is all-or-nothing: one failed child fetch fails
//! the whole request with no partial data.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::failsafe::{RetryPolicy, with_retry};
use crate::upstream::UpstreamClient;
use crate::{Error, Result};

/// Aggregates a user's events via concurrent upstream fetches
#[derive(Clone)]
pub struct FanoutAggregator {
    upstream: Arc<UpstreamClient>,
    retry_policy: RetryPolicy,
}

impl FanoutAggregator {
    /// Create a new aggregator
    #[must_use]
    pub fn new(upstream: Arc<UpstreamClient>, retry_policy: RetryPolicy) -> Self {
        Self {
            upstream,
            retry_policy,
        }
    }

    /// Fetch all events referenced by the user, in the user's id order.
    ///
    /// The user fetch strictly precedes the fan-out; a user with no events
    /// returns an empty list without issuing any event fetches.
    pub async fn events_for_user(&self, user_id: &str) -> Result<Vec<Value>> {
        let path = format!("/getUserById/{user_id}");
        let user = with_retry(&self.retry_policy, &path, || self.upstream.get_json(&path)).await?;

        let event_ids = extract_event_ids(&user);
        if event_ids.is_empty() {
            debug!(user_id, "User has no events, skipping fan-out");
            return Ok(Vec::new());
        }

        debug!(user_id, events = event_ids.len(), "Fanning out event fetches");

        // try_join_all waits for all fetches, surfaces the first failure, and
        // preserves input order in the output
        try_join_all(event_ids.iter().map(|id| self.fetch_event(id))).await
    }

    async fn fetch_event(&self, event_id: &str) -> Result<Value> {
        let path = format!("/getEventById/{event_id}");
        with_retry(&self.retry_policy, &path, || self.upstream.get_json(&path))
            .await
            .map_err(|e| Error::AggregateChild {
                child_id: event_id.to_string(),
                source: Box::new(e),
            })
    }
}

/// Pull the `events` id list out of the user payload. Ids may be JSON strings
/// or numbers; a missing or non-array field means no events.
fn extract_event_ids(user: &Value) -> Vec<String> {
    user.get("events")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().map(id_to_string).collect())
        .unwrap_or_default()
}

fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
