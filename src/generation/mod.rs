//! Generation Channel Module
//!
//! Streams synthetic event records from an isolated producer context back to
//! the caller in chunks.
//!
//! # Architecture
//!
//! ```text
//! caller ──start_generation──▶ router task ──Generate/Cancel──▶ producer thread
//!    ▲                             │  ▲                              │
//!    └──────── ChunkStream ◀───────┘  └──── data / done / error ─────┘
//! ```
//!
//! - `protocol`: command and message types exchanged with the producer
//! - `generator`: the [`RecordGenerator`] seam and the synthetic generator
//! - `producer`: the dedicated producer thread
//! - `channel`: the router task and the [`GenerationChannel`] handle
//! - `stream`: [`ChunkStream`], the per-request consumer view

mod channel;
mod generator;
mod producer;
mod protocol;
mod stream;

pub use channel::{ChannelSettings, GenerationChannel, DEFAULT_IDLE_TIMEOUT};
pub use generator::{GenerationJob, RecordGenerator, SyntheticGenerator};
pub use producer::ProducerSettings;
pub use protocol::{ProducerCommand, ProducerEnvelope, ProducerMessage, RequestId};
pub use stream::{ChunkStream, GenerationState};

/// Default number of records per `data` message
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
