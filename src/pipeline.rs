//! Telemetry pipeline
//!
//! Wires the generation channel, the working set and the aggregation service
//! together. A generation request is streamed to completion, accumulated into
//! one batch, published as the new working set and submitted for aggregation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregation::{AggregationService, Aggregator};
use crate::config::Config;
use crate::generation::{ChannelSettings, GenerationChannel, ProducerSettings, RecordGenerator};
use crate::types::{EventRecord, GenerationRequest};
use crate::utils::elapsed_secs;
use crate::working_set::WorkingSet;

/// What a caller sees while a generation request runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Records received so far
    Progress { generated: usize, requested: usize },
    Completed {
        record_count: usize,
        elapsed_secs: f64,
        sequence_id: u64,
        aggregation_ticket: u64,
    },
    Failed { message: String },
}

impl PipelineEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::Progress { .. } => "progress",
            PipelineEvent::Completed { .. } => "completed",
            PipelineEvent::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineEvent::Progress { .. })
    }

    /// Human-readable status line
    pub fn status_line(&self) -> String {
        match self {
            PipelineEvent::Progress {
                generated,
                requested,
            } => format!("{} / {} records generated...", generated, requested),
            PipelineEvent::Completed {
                record_count,
                elapsed_secs,
                ..
            } => format!(
                "{} records successfully generated in {:.2} seconds.",
                record_count, elapsed_secs
            ),
            PipelineEvent::Failed { message } => message.clone(),
        }
    }
}

/// Composition root for the generation and aggregation flow
#[derive(Clone)]
pub struct TelemetryPipeline {
    channel: GenerationChannel,
    working_set: WorkingSet,
    aggregation: Arc<AggregationService>,
}

impl TelemetryPipeline {
    pub fn new(
        channel: GenerationChannel,
        working_set: WorkingSet,
        aggregation: AggregationService,
    ) -> Self {
        Self {
            channel,
            working_set,
            aggregation: Arc::new(aggregation),
        }
    }

    /// Build every component from configuration
    ///
    /// Must be called inside a Tokio runtime.
    pub fn from_config(config: &Config, generator: Arc<dyn RecordGenerator>) -> Self {
        let settings = ChannelSettings {
            producer: ProducerSettings {
                chunk_size: config.chunk_size,
                seed: config.seed,
            },
            idle_timeout: (config.producer_idle_secs > 0)
                .then(|| Duration::from_secs(config.producer_idle_secs)),
        };
        let aggregator = Aggregator::new(config.heatmap_offset)
            .with_parallel_threshold(config.parallel_threshold);

        Self::new(
            GenerationChannel::spawn(generator, settings),
            WorkingSet::new(),
            AggregationService::spawn(aggregator),
        )
    }

    pub fn channel(&self) -> &GenerationChannel {
        &self.channel
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn aggregation(&self) -> &AggregationService {
        &self.aggregation
    }

    /// Run one request to completion
    ///
    /// Emits a `Progress` event after every chunk and ends with exactly one
    /// `Completed` or `Failed`. Dropping the stream early cancels the request;
    /// the working set is only replaced on completion.
    pub fn generate(&self, request: GenerationRequest) -> impl Stream<Item = PipelineEvent> + Send + 'static {
        let mut chunks = self.channel.start_generation(&request);
        let working_set = self.working_set.clone();
        let aggregation = Arc::clone(&self.aggregation);

        async_stream::stream! {
            let started = Instant::now();
            let requested = request.record_count();
            let mut records: Vec<EventRecord> = Vec::new();

            while let Some(item) = chunks.next().await {
                match item {
                    Ok(chunk) => {
                        records.extend(chunk);
                        yield PipelineEvent::Progress {
                            generated: records.len(),
                            requested,
                        };
                    }
                    Err(e) => {
                        warn!(request_id = chunks.request_id(), "Generation failed: {}", e);
                        yield PipelineEvent::Failed {
                            message: format!("An error occurred while generating data: {}", e),
                        };
                        return;
                    }
                }
            }

            let elapsed = elapsed_secs(started.elapsed());
            let records: Arc<[EventRecord]> = records.into();
            let record_count = records.len();
            let sequence_id = working_set.publish(Arc::clone(&records), Some(request));
            let aggregation_ticket = aggregation.submit(records);

            info!(record_count, elapsed_secs = elapsed, "Generation request finished");
            yield PipelineEvent::Completed {
                record_count,
                elapsed_secs: elapsed,
                sequence_id,
                aggregation_ticket,
            };
        }
    }

    /// Drive [`generate`](Self::generate) and return only the terminal event
    pub async fn run(&self, request: GenerationRequest) -> PipelineEvent {
        let events = self.generate(request);
        futures::pin_mut!(events);

        let mut last = PipelineEvent::Failed {
            message: "generation ended without a result".to_string(),
        };
        while let Some(event) = events.next().await {
            last = event;
        }
        last
    }
}
