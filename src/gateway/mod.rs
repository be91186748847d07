//! Gate server implementation

pub mod auth;
pub mod event;
pub mod registry;
mod router;
mod server;
pub mod state;

pub use auth::{AuthGate, auth_middleware};
pub use event::GateEvent;
pub use registry::{Subscriber, SubscriberRegistry, event_stream};
pub use router::{AppState, GateCloseResponse, GateOpenRequest, GateOpenResponse, create_router};
pub use server::Gateway;
pub use state::{GateSnapshot, GateState};
