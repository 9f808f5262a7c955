//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::generation::RecordGenerator;
use crate::pipeline::TelemetryPipeline;

/// State shared by every handler
pub struct AppState {
    pub pipeline: TelemetryPipeline,
    /// Largest record count accepted per request
    pub max_records: usize,
}

impl AppState {
    pub fn new(pipeline: TelemetryPipeline, max_records: usize) -> Self {
        Self {
            pipeline,
            max_records,
        }
    }

    /// Build the pipeline from configuration (inside a Tokio runtime)
    pub fn from_config(config: &Config, generator: Arc<dyn RecordGenerator>) -> Self {
        Self::new(
            TelemetryPipeline::from_config(config, generator),
            config.max_records,
        )
    }

    /// Sequence id of the current working set
    pub fn current_sequence_id(&self) -> u64 {
        self.pipeline.working_set().current().sequence_id
    }
}
