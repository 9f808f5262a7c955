//! API module for HTTP and SSE endpoints
//!
//! Exposes the telemetry pipeline over HTTP: generation progress and working
//! set updates are streamed as Server-Sent Events, everything else is JSON.

pub mod http;
pub mod rest;
pub mod sse;
pub mod state;

pub use http::create_router;
pub use state::AppState;
