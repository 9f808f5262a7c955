//! Data types for the telemetry pipeline
//!
//! This module contains the event record model, the class taxonomy, generation
//! requests and the chart structures produced by aggregation.

mod chart;
mod class_uid;
mod record;
mod request;

pub use chart::{
    AggregationReply, ChartData, HeatmapCell, LabeledCounts, SeverityChart, SeverityDataset,
};
pub use class_uid::{class_groups, ClassCategory, ClassEntry, ClassGroup, OcsfClass};
pub use record::{Actor, EventRecord, Severity, User, UNKNOWN_CATEGORY};
pub use request::{GenerationMode, GenerationRequest, ScenarioId, WireRequest};

/// A non-empty, ordered slice of a streamed generation result
pub type GenerationChunk = Vec<EventRecord>;
