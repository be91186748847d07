//! HTTP router and handlers

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::sse::{Event, Sse},
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

use super::auth::{AuthGate, auth_middleware};
use super::event::GateEvent;
use super::registry::{SubscriberRegistry, event_stream};
use super::state::{GateSnapshot, GateState};
use crate::config::Variant;

/// Shared application state
///
/// Explicitly owned and injected into handlers, so tests can instantiate
/// isolated instances per case.
pub struct AppState {
    /// Which endpoint set this process exposes.
    pub variant: Variant,
    /// Gate record read by the polling variant.
    pub gate: GateState,
    /// Subscriber set fed by the broadcast variant.
    pub registry: SubscriberRegistry,
    /// Operator credential check.
    pub auth: Arc<AuthGate>,
    /// Idle keepalive interval for event streams.
    pub keep_alive_interval: Duration,
}

/// Open-gate request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOpenRequest {
    /// Visitor name to open the gate for. May be empty.
    pub name: String,
}

/// Open-gate acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOpenResponse {
    /// Always true on a 200 response.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Echo of the visitor name.
    pub name: String,
}

/// Close-gate acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCloseResponse {
    /// Always true on a 200 response.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// Create the router for the configured variant.
pub fn create_router(state: Arc<AppState>, static_dir: &str) -> Router {
    let auth = Arc::clone(&state.auth);
    let static_dir = Path::new(static_dir);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/gate/open", post(open_handler))
        .route("/api/gate/close", post(close_handler));

    let router = match state.variant {
        Variant::Poll => router.route("/api/gate/status", get(status_handler)),
        Variant::Broadcast => router.route("/api/gate/events", get(events_handler)),
    };

    router
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        // Authentication middleware (applied before other layers)
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /api/gate/open handler. Reached only with a valid operator key.
async fn open_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GateOpenRequest>,
) -> Json<GateOpenResponse> {
    let name = request.name;

    match state.variant {
        Variant::Poll => {
            let snapshot = state.gate.open(&name);
            info!(name = %snapshot.name, timestamp = snapshot.timestamp, "Gate opened");
        }
        Variant::Broadcast => {
            let delivered = state.registry.broadcast(&GateEvent::Opened { name: name.clone() });
            info!(name = %name, subscribers = delivered, "Broadcasting gate open");
        }
    }

    Json(GateOpenResponse {
        success: true,
        message: format!("Gate opened for {name}"),
        name,
    })
}

/// POST /api/gate/close handler. Reached only with a valid operator key.
async fn close_handler(State(state): State<Arc<AppState>>) -> Json<GateCloseResponse> {
    match state.variant {
        Variant::Poll => {
            let snapshot = state.gate.close();
            info!(timestamp = snapshot.timestamp, "Gate closed");
        }
        Variant::Broadcast => {
            let delivered = state.registry.broadcast(&GateEvent::Closed);
            info!(subscribers = delivered, "Broadcasting gate close");
        }
    }

    Json(GateCloseResponse {
        success: true,
        message: "Gate closed".to_string(),
    })
}

/// GET /api/gate/status handler (poll variant). Public.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<GateSnapshot> {
    Json(state.gate.status())
}

/// GET /api/gate/events handler (broadcast variant). Public.
///
/// Registers a subscriber whose queue feeds the SSE stream; dropping the
/// stream (client disconnect) unregisters it.
async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscriber = state.registry.subscribe();
    let stream =
        event_stream(subscriber, state.keep_alive_interval).map(|event| Ok(event.into_sse()));
    Sse::new(stream)
}

/// GET /health handler. Public.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "variant": state.variant.as_str(),
        "subscribers": state.registry.subscriber_count(),
    }))
}
