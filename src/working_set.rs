//! Working-set broadcaster
//!
//! Holds the most recently completed batch and hands it to any number of
//! observers. New subscribers see the current value immediately; each
//! publication replaces the previous batch entirely.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::types::{EventRecord, GenerationRequest};

/// One published batch
#[derive(Debug, Clone)]
pub struct WorkingSetSnapshot {
    /// 0 for the initial empty set, then 1, 2, ... per publication
    pub sequence_id: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub records: Arc<[EventRecord]>,
    /// The request that produced the batch, if any
    pub origin: Option<GenerationRequest>,
}

impl WorkingSetSnapshot {
    fn empty() -> Self {
        Self {
            sequence_id: 0,
            published_at: None,
            records: Arc::from(Vec::new()),
            origin: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> WorkingSetSummary {
        WorkingSetSummary {
            sequence_id: self.sequence_id,
            record_count: self.records.len(),
            published_at: self.published_at,
        }
    }
}

/// What observers of the working set usually need to know
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingSetSummary {
    pub sequence_id: u64,
    pub record_count: usize,
    pub published_at: Option<DateTime<Utc>>,
}

/// Last-value broadcaster for the working set
///
/// Cheap to clone; all clones publish to the same observers.
#[derive(Clone)]
pub struct WorkingSet {
    tx: Arc<watch::Sender<Arc<WorkingSetSnapshot>>>,
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingSet {
    /// Start with an empty working set
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(WorkingSetSnapshot::empty()));
        Self { tx: Arc::new(tx) }
    }

    /// Replace the working set, returning the new sequence id
    pub fn publish(&self, records: Arc<[EventRecord]>, origin: Option<GenerationRequest>) -> u64 {
        let record_count = records.len();
        let mut sequence_id = 0;
        self.tx.send_modify(|current| {
            sequence_id = current.sequence_id + 1;
            *current = Arc::new(WorkingSetSnapshot {
                sequence_id,
                published_at: Some(Utc::now()),
                records,
                origin,
            });
        });
        info!(sequence_id, record_count, "Working set published");
        sequence_id
    }

    /// The batch observers currently see
    pub fn current(&self) -> Arc<WorkingSetSnapshot> {
        Arc::clone(&self.tx.borrow())
    }

    /// Observe publications; the receiver already holds the current value
    pub fn subscribe(&self) -> watch::Receiver<Arc<WorkingSetSnapshot>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
