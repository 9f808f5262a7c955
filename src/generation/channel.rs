//! Generation Channel
//!
//! A router task owns the producer context and the table of active listeners,
//! keyed by request id. Callers only talk to it through commands; the
//! producer only talks to it through envelopes. Nothing is shared.
//!
//! The producer context is started lazily on the first request, reused for
//! later ones, and terminated after a configurable idle period with no
//! request in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::generator::RecordGenerator;
use super::producer::{ProducerContext, ProducerSettings};
use super::protocol::{ProducerCommand, ProducerEnvelope, ProducerEvent, ProducerMessage, RequestId};
use super::stream::{ChannelEvent, ChunkStream};
use crate::error::GenerationError;
use crate::types::{GenerationRequest, WireRequest};

/// Default idle period before the producer context is terminated
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Channel tunables
#[derive(Debug, Clone, Copy)]
pub struct ChannelSettings {
    pub producer: ProducerSettings,
    /// `None` keeps the producer context alive for the channel's lifetime
    pub idle_timeout: Option<Duration>,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            producer: ProducerSettings::default(),
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

#[derive(Debug)]
pub(crate) enum ChannelCommand {
    Start {
        request_id: RequestId,
        payload: WireRequest,
        listener: mpsc::UnboundedSender<ChannelEvent>,
    },
    Cancel {
        request_id: RequestId,
    },
}

/// Handle for issuing generation requests
///
/// Must be created inside a Tokio runtime. Cloning shares the same router and
/// producer context; the router stops when every handle and stream is gone.
#[derive(Clone)]
pub struct GenerationChannel {
    commands: mpsc::UnboundedSender<ChannelCommand>,
    request_counter: Arc<AtomicU64>,
}

impl GenerationChannel {
    pub fn spawn(generator: Arc<dyn RecordGenerator>, settings: ChannelSettings) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let router = Router {
            generator,
            settings,
            producer: None,
            listeners: HashMap::new(),
        };
        tokio::spawn(router.run(command_rx));
        Self {
            commands,
            request_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Post a request to the producer and stream its chunks back
    pub fn start_generation(&self, request: &GenerationRequest) -> ChunkStream {
        let request_id = self.request_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let (listener, events) = mpsc::unbounded_channel();

        let start = ChannelCommand::Start {
            request_id,
            payload: WireRequest::from(request),
            listener,
        };
        if self.commands.send(start).is_err() {
            // The listener was dropped with the command; the stream reports
            // a closed channel on first poll
            warn!(request_id, "Generation router is not running");
        }

        ChunkStream::new(request_id, request.record_count(), events, self.commands.clone())
    }
}

enum Wake {
    Command(ChannelCommand),
    Producer(Option<ProducerEvent>),
    Idle,
}

struct Router {
    generator: Arc<dyn RecordGenerator>,
    settings: ChannelSettings,
    producer: Option<ProducerContext>,
    listeners: HashMap<RequestId, mpsc::UnboundedSender<ChannelEvent>>,
}

impl Router {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ChannelCommand>) {
        loop {
            let idle_timeout = if self.listeners.is_empty() && self.producer.is_some() {
                self.settings.idle_timeout
            } else {
                None
            };

            let wake = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => Wake::Command(command),
                    None => break,
                },
                event = next_event(&mut self.producer) => Wake::Producer(event),
                _ = sleep_for(idle_timeout) => Wake::Idle,
            };

            match wake {
                Wake::Command(ChannelCommand::Start {
                    request_id,
                    payload,
                    listener,
                }) => self.start(request_id, payload, listener),
                Wake::Command(ChannelCommand::Cancel { request_id }) => self.cancel(request_id),
                Wake::Producer(Some(event)) => self.dispatch(event),
                Wake::Producer(None) => self.producer_died(),
                Wake::Idle => {
                    if let Some(producer) = self.producer.take() {
                        debug!("Producer context idle");
                        producer.terminate();
                    }
                }
            }
        }

        if let Some(producer) = self.producer.take() {
            producer.terminate();
        }
        debug!("Generation router stopped");
    }

    fn start(
        &mut self,
        request_id: RequestId,
        payload: WireRequest,
        listener: mpsc::UnboundedSender<ChannelEvent>,
    ) {
        if self.producer.is_none() {
            match ProducerContext::spawn(Arc::clone(&self.generator), self.settings.producer) {
                Ok(producer) => self.producer = Some(producer),
                Err(e) => {
                    error!(request_id, "Failed to start producer context: {}", e);
                    let _ = listener.send(ChannelEvent::Failed(GenerationError::Transport(
                        format!("failed to start producer context: {}", e),
                    )));
                    return;
                }
            }
        }

        info!(request_id, count = payload.count, "Generation started");
        self.listeners.insert(request_id, listener);

        let posted = self
            .producer
            .as_ref()
            .map(|p| p.post(ProducerCommand::Generate { request_id, payload }))
            .unwrap_or(false);
        if !posted {
            self.producer_died();
        }
    }

    fn cancel(&mut self, request_id: RequestId) {
        if self.listeners.remove(&request_id).is_none() {
            return;
        }
        info!(request_id, "Generation cancelled by consumer");
        if let Some(producer) = &self.producer {
            producer.post(ProducerCommand::Cancel { request_id });
        }
    }

    fn dispatch(&mut self, event: ProducerEvent) {
        match event {
            ProducerEvent::Message(ProducerEnvelope {
                request_id,
                message: ProducerMessage::Data(chunk),
            }) => {
                if chunk.is_empty() {
                    debug!(request_id, "Ignoring empty chunk");
                    return;
                }
                let Some(listener) = self.listeners.get(&request_id) else {
                    debug!(request_id, "Dropping chunk for released request");
                    return;
                };
                debug!(request_id, records = chunk.len(), "Chunk received");
                if listener.send(ChannelEvent::Chunk(chunk)).is_err() {
                    self.cancel(request_id);
                }
            }
            ProducerEvent::Message(ProducerEnvelope {
                request_id,
                message: ProducerMessage::Done,
            }) => {
                if let Some(listener) = self.listeners.remove(&request_id) {
                    info!(request_id, "Generation completed");
                    let _ = listener.send(ChannelEvent::Done);
                }
            }
            ProducerEvent::Message(ProducerEnvelope {
                request_id,
                message: ProducerMessage::Error(message),
            }) => {
                warn!(request_id, "Error message from producer: {}", message);
                self.fail(request_id, GenerationError::Producer(message));
            }
            ProducerEvent::Fault { request_id, reason } => {
                error!(request_id, "Critical error from producer context: {}", reason);
                self.fail(request_id, GenerationError::Transport(reason));
            }
        }
    }

    fn fail(&mut self, request_id: RequestId, error: GenerationError) {
        if let Some(listener) = self.listeners.remove(&request_id) {
            let _ = listener.send(ChannelEvent::Failed(error));
        }
    }

    /// The producer thread is gone: every in-flight request fails
    fn producer_died(&mut self) {
        self.producer = None;
        if self.listeners.is_empty() {
            return;
        }
        error!(
            in_flight = self.listeners.len(),
            "Producer context terminated unexpectedly"
        );
        for (_, listener) in self.listeners.drain() {
            let _ = listener.send(ChannelEvent::Failed(GenerationError::Transport(
                "producer context terminated unexpectedly".to_string(),
            )));
        }
    }
}

async fn next_event(producer: &mut Option<ProducerContext>) -> Option<ProducerEvent> {
    match producer {
        Some(producer) => producer.events.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_for(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
