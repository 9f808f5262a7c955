//! OCSF Telemetry Pipeline
//!
//! Generates synthetic OCSF security events on an isolated producer context,
//! streams them back in chunks, and turns completed batches into chart-ready
//! aggregates.
//!
//! # Features
//!
//! - **Chunked generation**: cancellable, request-scoped streams from a
//!   dedicated producer thread
//! - **Aggregation**: severity time series, category distribution, 7x24
//!   heatmap and top actors in a single pass, parallel for large batches
//! - **Working set**: last-value broadcast of the latest completed batch
//! - **HTTP/SSE**: progress streaming, charts and export over Axum
//!
//! # Modules
//!
//! - `types`: Event records, class taxonomy, requests and chart types
//! - `generation`: Producer context, routing channel and chunk streams
//! - `aggregation`: Aggregation engine and the offloaded aggregation service
//! - `working_set`: Working-set broadcaster
//! - `pipeline`: Wiring of generation, working set and aggregation
//! - `export`: Export file naming and JSON rendering
//! - `config`: Environment configuration
//! - `api`: HTTP and SSE endpoints
//! - `utils`: Time helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ocsf_telemetry::{Config, GenerationRequest, OcsfClass, SyntheticGenerator, TelemetryPipeline};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let pipeline = TelemetryPipeline::from_config(&config, Arc::new(SyntheticGenerator));
//!     let request = GenerationRequest::single_class(OcsfClass::Authentication, 5000).unwrap();
//!     println!("{}", pipeline.run(request).await.status_line());
//! }
//! ```

pub mod aggregation;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod working_set;

// Re-export commonly used items at crate root
pub use aggregation::{AggregationReport, AggregationService, Aggregator};
pub use config::Config;
pub use error::{ConfigError, GenerationError, GeneratorError, RequestError};
pub use generation::{
    ChannelSettings, ChunkStream, GenerationChannel, GenerationState, RecordGenerator,
    SyntheticGenerator,
};
pub use pipeline::{PipelineEvent, TelemetryPipeline};
pub use types::{
    AggregationReply, ChartData, EventRecord, GenerationChunk, GenerationRequest, OcsfClass,
    ScenarioId, Severity,
};
pub use working_set::{WorkingSet, WorkingSetSnapshot, WorkingSetSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
