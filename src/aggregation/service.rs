//! Offloaded aggregation with supersede semantics
//!
//! Batches are handed to a worker task through a watch channel, so a newer
//! submission replaces an older one that has not been picked up yet. A result
//! computed for a batch that was superseded while it ran is dropped instead
//! of being published.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use super::Aggregator;
use crate::types::{AggregationReply, EventRecord};

#[derive(Debug, Clone)]
struct AggregationJob {
    ticket: u64,
    records: Arc<[EventRecord]>,
}

/// Published aggregation result
#[derive(Debug, Clone)]
pub struct AggregationReport {
    /// Ticket returned by [`AggregationService::submit`]
    pub ticket: u64,
    pub record_count: usize,
    pub computed_at: DateTime<Utc>,
    pub reply: Arc<AggregationReply>,
}

/// Handle to the aggregation worker
///
/// Must be created inside a Tokio runtime. The worker stops once every
/// handle is dropped.
pub struct AggregationService {
    aggregator: Aggregator,
    jobs: watch::Sender<Option<AggregationJob>>,
    reports: watch::Receiver<Option<AggregationReport>>,
}

impl AggregationService {
    pub fn spawn(aggregator: Aggregator) -> Self {
        let (jobs, job_rx) = watch::channel(None);
        let (report_tx, reports) = watch::channel(None);
        tokio::spawn(run_worker(aggregator, job_rx, report_tx));
        Self {
            aggregator,
            jobs,
            reports,
        }
    }

    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    /// Queue a batch, superseding any batch still pending; returns its ticket
    pub fn submit(&self, records: Arc<[EventRecord]>) -> u64 {
        let mut ticket = 0;
        self.jobs.send_modify(|job| {
            ticket = job.as_ref().map_or(1, |j| j.ticket + 1);
            *job = Some(AggregationJob {
                ticket,
                records,
            });
        });
        debug!(ticket, "Aggregation batch submitted");
        ticket
    }

    /// Latest published report, if any
    pub fn latest(&self) -> Option<AggregationReport> {
        self.reports.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AggregationReport>> {
        self.reports.clone()
    }

    /// Wait for the report of `ticket`
    ///
    /// Returns `None` if a newer batch superseded it or the worker stopped.
    pub async fn wait_for(&self, ticket: u64) -> Option<AggregationReport> {
        let mut reports = self.reports.clone();
        loop {
            if let Some(report) = reports.borrow_and_update().as_ref() {
                if report.ticket == ticket {
                    return Some(report.clone());
                }
                if report.ticket > ticket {
                    return None;
                }
            }
            if reports.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Aggregate one batch off the async runtime without touching the
    /// published state
    pub async fn compute(&self, records: Arc<[EventRecord]>) -> Result<AggregationReply, JoinError> {
        let aggregator = self.aggregator;
        tokio::task::spawn_blocking(move || aggregator.reply(&records)).await
    }
}

async fn run_worker(
    aggregator: Aggregator,
    mut jobs: watch::Receiver<Option<AggregationJob>>,
    reports: watch::Sender<Option<AggregationReport>>,
) {
    while jobs.changed().await.is_ok() {
        let Some(job) = jobs.borrow_and_update().clone() else {
            continue;
        };

        let records = Arc::clone(&job.records);
        let reply = match tokio::task::spawn_blocking(move || aggregator.reply(&records)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(ticket = job.ticket, "Aggregation task failed: {}", e);
                continue;
            }
        };

        if jobs.has_changed().unwrap_or(false) {
            debug!(ticket = job.ticket, "Aggregation result superseded, discarding");
            continue;
        }

        info!(
            ticket = job.ticket,
            records = job.records.len(),
            "Aggregation completed"
        );
        reports.send_replace(Some(AggregationReport {
            ticket: job.ticket,
            record_count: job.records.len(),
            computed_at: Utc::now(),
            reply: Arc::new(reply),
        }));
    }
    debug!("Aggregation worker stopped");
}
