//! SSE (Server-Sent Events) endpoints
//!
//! ## Endpoints
//! - `POST /api/generate` - Run a generation request, streaming `progress`
//!   events followed by one `completed` or `failed`
//! - `GET /api/working-set/stream` - Current working-set summary, then one
//!   `working_set` event per publication

pub mod handler;
