//! Gate Signal Server
//!
//! Minimal demo backend for remotely signalling gate open/close events to
//! connected display clients.
//!
//! # Variants
//!
//! - **Broadcast**: an operator call fans out to every connected client over
//!   a long-lived SSE stream (`GET /api/gate/events`).
//! - **Poll**: an operator call mutates one shared status record that clients
//!   read repeatedly (`GET /api/gate/status`).
//!
//! A process runs exactly one variant, selected via configuration or the
//! `--variant` flag. Operator endpoints require the shared `X-API-Key`
//! credential; display endpoints are public.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;

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
