//! Consumer side of a generation request

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use tokio::sync::mpsc;

use super::channel::ChannelCommand;
use super::protocol::RequestId;
use crate::error::GenerationError;
use crate::types::{EventRecord, GenerationChunk};

/// What the router forwards to one consumer
#[derive(Debug)]
pub(crate) enum ChannelEvent {
    Chunk(GenerationChunk),
    Done,
    Failed(GenerationError),
}

/// Lifecycle of one request after it was posted
///
/// A request that has not been posted yet has no stream at all, so the
/// idle state is not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Streaming,
    Completed,
    Failed,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationState::Streaming)
    }
}

/// Chunks of one generation request, in production order
///
/// Yields `Ok(chunk)` zero or more times, then either ends (success) or
/// yields a single `Err` and ends. Dropping the stream early releases the
/// listener and asks the producer to stop.
pub struct ChunkStream {
    request_id: RequestId,
    requested: usize,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    commands: mpsc::UnboundedSender<ChannelCommand>,
    state: GenerationState,
}

impl ChunkStream {
    pub(crate) fn new(
        request_id: RequestId,
        requested: usize,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
        commands: mpsc::UnboundedSender<ChannelCommand>,
    ) -> Self {
        Self {
            request_id,
            requested,
            events,
            commands,
            state: GenerationState::Streaming,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The request's record count
    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Collect every chunk, reporting the running total after each one
    pub async fn accumulate<F>(mut self, mut on_progress: F) -> Result<Vec<EventRecord>, GenerationError>
    where
        F: FnMut(usize),
    {
        let mut records = Vec::new();
        while let Some(chunk) = self.next().await {
            records.extend(chunk?);
            on_progress(records.len());
        }
        Ok(records)
    }
}

impl Stream for ChunkStream {
    type Item = Result<GenerationChunk, GenerationError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        match ready!(this.events.poll_recv(cx)) {
            Some(ChannelEvent::Chunk(chunk)) => Poll::Ready(Some(Ok(chunk))),
            Some(ChannelEvent::Done) => {
                this.state = GenerationState::Completed;
                Poll::Ready(None)
            }
            Some(ChannelEvent::Failed(e)) => {
                this.state = GenerationState::Failed;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.state = GenerationState::Failed;
                Poll::Ready(Some(Err(GenerationError::Transport(
                    "generation channel closed".to_string(),
                ))))
            }
        }
    }
}

impl FusedStream for ChunkStream {
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}

impl Drop for ChunkStream {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            let _ = self.commands.send(ChannelCommand::Cancel {
                request_id: self.request_id,
            });
        }
    }
}
