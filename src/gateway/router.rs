//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::dispatcher::Dispatcher;
use super::fanout::FanoutAggregator;
use crate::upstream::UpstreamClient;
use crate::Error;

/// Shared application state
pub struct AppState {
    /// Protected write dispatcher
    pub dispatcher: Dispatcher,
    /// Fan-out read aggregator
    pub fanout: FanoutAggregator,
    /// Upstream client for plain proxy reads
    pub upstream: Arc<UpstreamClient>,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/getUsers", get(get_users_handler))
        .route("/getEvents", get(get_events_handler))
        .route("/addEvent", post(add_event_handler))
        .route("/getEventsByUserId/{id}", get(events_by_user_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map a gateway error to the wire status and body. The single place where
/// the error taxonomy becomes HTTP.
fn error_response(err: &Error) -> Response {
    let (status, message) = match err {
        Error::CircuitOpen { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "service down, please try later")
        }
        Error::ProbeInFlight => (StatusCode::SERVICE_UNAVAILABLE, "service recovering, try soon"),
        Error::RetriesExhausted { .. } => (StatusCode::SERVICE_UNAVAILABLE, "service is busy"),
        Error::AggregateChild { .. } => (StatusCode::BAD_GATEWAY, "failed to fetch events"),
        Error::Transport(_) | Error::UpstreamStatus { .. } => {
            (StatusCode::BAD_GATEWAY, "upstream request failed")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error occurred"),
    };
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

async fn healthz_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readyz_handler() -> Json<Value> {
    Json(json!({ "ready": true }))
}

/// GET /getUsers - plain proxy
async fn get_users_handler(State(state): State<Arc<AppState>>) -> Response {
    info!("Fetching users");
    match state.upstream.get_json("/getUsers").await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            warn!(error = %e, "getUsers proxy failed");
            error_response(&e)
        }
    }
}

/// GET /getEvents - plain proxy
async fn get_events_handler(State(state): State<Arc<AppState>>) -> Response {
    info!("Fetching events");
    match state.upstream.get_json("/getEvents").await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            warn!(error = %e, "getEvents proxy failed");
            error_response(&e)
        }
    }
}

/// POST /addEvent - protected write through the circuit breaker
async fn add_event_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    info!("addEvent");
    match state.dispatcher.protected_call("/addEvent", body).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            // Fast-fails never touched the upstream; keep them tellable apart
            // from attempted-and-failed calls in the logs
            if e.is_fast_fail() {
                warn!(error = %e, "addEvent rejected by circuit breaker (no upstream call)");
            } else {
                warn!(error = %e, "addEvent failed");
            }
            error_response(&e)
        }
    }
}

/// GET /getEventsByUserId/{id} - parallel fan-out read
async fn events_by_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Response {
    info!(user_id = %user_id, "Fetching events for user");
    match state.fanout.events_for_user(&user_id).await {
        Ok(events) => Json(Value::Array(events)).into_response(),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "getEventsByUserId failed");
            error_response(&e)
        }
    }
}
