//! Producer execution context
//!
//! A dedicated OS thread that serves generation requests one at a time, in
//! the order they were posted. It shares nothing with the caller: commands
//! arrive on one channel, envelopes leave on another. Between chunks it
//! drains its command queue so a cancel can stop the running request early.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info};

use super::generator::{GenerationJob, RecordGenerator};
use super::protocol::{ProducerCommand, ProducerEnvelope, ProducerEvent, ProducerMessage, RequestId};
use crate::types::{GenerationRequest, WireRequest};

/// Tunables for a producer context
#[derive(Debug, Clone, Copy)]
pub struct ProducerSettings {
    /// Records per `data` message
    pub chunk_size: usize,
    /// Seed for the generator RNG; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            chunk_size: super::DEFAULT_CHUNK_SIZE,
            seed: None,
        }
    }
}

/// Caller-side handle to a running producer thread
pub(crate) struct ProducerContext {
    commands: mpsc::UnboundedSender<ProducerCommand>,
    pub(crate) events: mpsc::UnboundedReceiver<ProducerEvent>,
}

impl ProducerContext {
    pub fn spawn(generator: Arc<dyn RecordGenerator>, settings: ProducerSettings) -> io::Result<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let producer = Producer {
            generator,
            chunk_size: settings.chunk_size.max(1),
            rng: match settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
            commands: command_rx,
            events: event_tx,
            backlog: VecDeque::new(),
            cancelled: HashSet::new(),
        };

        thread::Builder::new()
            .name("ocsf-producer".to_string())
            .spawn(move || producer.run())?;

        info!(chunk_size = settings.chunk_size, "Producer context started");
        Ok(Self {
            commands: command_tx,
            events: event_rx,
        })
    }

    /// Post a command; `false` if the context is gone
    pub fn post(&self, command: ProducerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Let the thread exit once its queue is drained
    pub fn terminate(self) {
        drop(self.commands);
        info!("Producer context terminated");
    }
}

enum Outcome {
    Finished,
    Cancelled,
    /// The caller side is gone; stop the thread
    Disconnected,
}

struct Producer {
    generator: Arc<dyn RecordGenerator>,
    chunk_size: usize,
    rng: StdRng,
    commands: mpsc::UnboundedReceiver<ProducerCommand>,
    events: mpsc::UnboundedSender<ProducerEvent>,
    backlog: VecDeque<(RequestId, WireRequest)>,
    cancelled: HashSet<RequestId>,
}

impl Producer {
    fn run(mut self) {
        while let Some((request_id, payload)) = self.next_request() {
            if self.cancelled.remove(&request_id) {
                debug!(request_id, "Skipping cancelled request");
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.serve(request_id, payload)));
            match outcome {
                Ok(Outcome::Finished) => {}
                Ok(Outcome::Cancelled) => debug!(request_id, "Request cancelled mid-stream"),
                Ok(Outcome::Disconnected) => break,
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    let fault = ProducerEvent::Fault { request_id, reason };
                    if self.events.send(fault).is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Producer thread exiting");
    }

    /// Next queued request, blocking while idle; `None` once the caller hangs up
    fn next_request(&mut self) -> Option<(RequestId, WireRequest)> {
        if let Some(request) = self.backlog.pop_front() {
            return Some(request);
        }
        loop {
            match self.commands.blocking_recv()? {
                ProducerCommand::Generate { request_id, payload } => {
                    return Some((request_id, payload))
                }
                ProducerCommand::Cancel { request_id } => {
                    // Nothing queued for it; the request already finished
                    debug!(request_id, "Cancel for inactive request ignored");
                }
            }
        }
    }

    /// Apply queued commands; `true` if `current` was cancelled
    fn drain_commands(&mut self, current: RequestId) -> bool {
        let mut cancel_current = false;
        loop {
            match self.commands.try_recv() {
                Ok(ProducerCommand::Generate { request_id, payload }) => {
                    self.backlog.push_back((request_id, payload))
                }
                Ok(ProducerCommand::Cancel { request_id }) if request_id == current => {
                    cancel_current = true
                }
                Ok(ProducerCommand::Cancel { request_id }) => {
                    if self.backlog.iter().any(|(id, _)| *id == request_id) {
                        self.cancelled.insert(request_id);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        cancel_current
    }

    fn send(&self, request_id: RequestId, message: ProducerMessage) -> bool {
        self.events
            .send(ProducerEvent::Message(ProducerEnvelope { request_id, message }))
            .is_ok()
    }

    fn serve(&mut self, request_id: RequestId, payload: WireRequest) -> Outcome {
        let request = match GenerationRequest::try_from(payload) {
            Ok(request) => request,
            Err(e) => {
                return if self.send(request_id, ProducerMessage::Error(e.to_string())) {
                    Outcome::Finished
                } else {
                    Outcome::Disconnected
                };
            }
        };

        let anchor = Utc::now();
        let mut chunk = Vec::with_capacity(self.chunk_size.min(request.record_count()));

        for index in 0..request.record_count() {
            let job = GenerationJob {
                request: &request,
                index,
                anchor,
            };
            match self.generator.generate(&job, &mut self.rng) {
                Ok(record) => chunk.push(record),
                Err(e) => {
                    return if self.send(request_id, ProducerMessage::Error(e.to_string())) {
                        Outcome::Finished
                    } else {
                        Outcome::Disconnected
                    };
                }
            }

            if chunk.len() == self.chunk_size {
                let full = std::mem::replace(&mut chunk, Vec::with_capacity(self.chunk_size));
                if !self.send(request_id, ProducerMessage::Data(full)) {
                    return Outcome::Disconnected;
                }
                if self.drain_commands(request_id) {
                    return Outcome::Cancelled;
                }
            }
        }

        if !chunk.is_empty() && !self.send(request_id, ProducerMessage::Data(chunk)) {
            return Outcome::Disconnected;
        }
        if !self.send(request_id, ProducerMessage::Done) {
            return Outcome::Disconnected;
        }
        Outcome::Finished
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "producer panicked".to_string()
    }
}
