//! Aggregation Engine
//!
//! Turns a batch of event records into the four chart aggregates in one pass:
//! - severity time series, bucketed by UTC hour
//! - category distribution, descending by count
//! - 7x24 day/hour activity heatmap
//! - top 10 actors, ascending so the most active plots last
//!
//! [`Aggregator`] is pure and synchronous. [`AggregationService`] runs it off
//! the async runtime and keeps only the result for the newest batch.

mod service;
mod tally;

use chrono::{FixedOffset, Offset, Utc};
use rayon::prelude::*;

use crate::types::{
    AggregationReply, ChartData, EventRecord, HeatmapCell, LabeledCounts, SeverityChart,
    SeverityDataset, Severity,
};
use crate::utils::time::bucket_label;

use tally::{labeled_counts, Ranking, Tally, DAYS, HOURS};

pub use service::{AggregationReport, AggregationService};

/// Maximum number of actors in the ranking
pub const TOP_ACTORS: usize = 10;

/// Batches at or above this size are tallied in parallel by default
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Pure aggregation over record batches
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    /// Timeline used for heatmap cells and bucket labels
    offset: FixedOffset,
    parallel_threshold: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl Aggregator {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Message-level reply: `Empty` for an empty batch
    pub fn reply(&self, records: &[EventRecord]) -> AggregationReply {
        if records.is_empty() {
            return AggregationReply::Empty;
        }
        AggregationReply::Charts(Box::new(self.aggregate(records)))
    }

    /// Compute all four aggregates; an empty batch yields zeroed structures
    pub fn aggregate(&self, records: &[EventRecord]) -> ChartData {
        let tally = if records.len() >= self.parallel_threshold {
            records
                .par_iter()
                .enumerate()
                .fold(
                    || Tally::new(self.offset),
                    |tally, (index, record)| tally.observe(index, record),
                )
                .reduce(|| Tally::new(self.offset), Tally::merge)
        } else {
            records
                .iter()
                .enumerate()
                .fold(Tally::new(self.offset), |tally, (index, record)| {
                    tally.observe(index, record)
                })
        };

        let severity_chart = self.severity_chart(&tally);
        let heatmap_data = heatmap_cells(&tally);

        ChartData {
            severity_chart,
            category_chart: labeled_counts(tally.categories.ranked()),
            heatmap_data,
            top_users_chart: top_actors(tally.actors),
        }
    }

    fn severity_chart(&self, tally: &Tally) -> SeverityChart {
        let labels = tally
            .severity_buckets
            .keys()
            .map(|bucket| bucket_label(*bucket, self.offset))
            .collect();

        let datasets = Severity::ALL
            .iter()
            .map(|severity| SeverityDataset {
                label: *severity,
                data: tally
                    .severity_buckets
                    .values()
                    .map(|counts| counts[severity.index()])
                    .collect(),
                background_color: severity.color(),
            })
            .collect();

        SeverityChart { labels, datasets }
    }
}

/// Row-major (day outer, hour inner) `[hour, day, count]` cells
fn heatmap_cells(tally: &Tally) -> Vec<HeatmapCell> {
    let mut cells = Vec::with_capacity(DAYS * HOURS);
    for (day, hours) in tally.heatmap.iter().enumerate() {
        for (hour, count) in hours.iter().enumerate() {
            cells.push(HeatmapCell {
                hour: hour as u8,
                day: day as u8,
                count: *count,
            });
        }
    }
    cells
}

fn top_actors(actors: Ranking) -> LabeledCounts {
    let mut top: Vec<(String, usize)> = actors.ranked();
    top.truncate(TOP_ACTORS);
    top.reverse();
    labeled_counts(top)
}
