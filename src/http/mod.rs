//! HTTP API server for the voice relay
//!
//! This module provides the REST surface clients talk to:
//! - POST /generate - Chat reply plus synthesized speech and word timings
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
