//! Single-pass accumulation of the four aggregates
//!
//! A `Tally` can be built sequentially or folded per rayon split and merged.
//! Label rankings remember the index of the first record that carried each
//! label, so tie order is the same whichever way the tally was built.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Utc};

use crate::types::{EventRecord, LabeledCounts, Severity};
use crate::utils::time::{heatmap_coordinates, hour_bucket};

pub(crate) const DAYS: usize = 7;
pub(crate) const HOURS: usize = 24;
pub(crate) const SEVERITIES: usize = Severity::ALL.len();

/// Occurrence counts per label with first-seen position
#[derive(Debug, Default, Clone)]
pub(crate) struct Ranking {
    entries: HashMap<String, RankEntry>,
}

#[derive(Debug, Clone, Copy)]
struct RankEntry {
    count: usize,
    first_seen: usize,
}

impl Ranking {
    pub fn observe(&mut self, label: &str, index: usize) {
        match self.entries.get_mut(label) {
            Some(entry) => {
                entry.count += 1;
                entry.first_seen = entry.first_seen.min(index);
            }
            None => {
                self.entries.insert(
                    label.to_string(),
                    RankEntry {
                        count: 1,
                        first_seen: index,
                    },
                );
            }
        }
    }

    pub fn merge(&mut self, other: Ranking) {
        for (label, theirs) in other.entries {
            self.entries
                .entry(label)
                .and_modify(|ours| {
                    ours.count += theirs.count;
                    ours.first_seen = ours.first_seen.min(theirs.first_seen);
                })
                .or_insert(theirs);
        }
    }

    /// Labels by descending count; ties keep first-seen order
    pub fn ranked(self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, RankEntry)> = self.entries.into_iter().collect();
        entries.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        entries
            .into_iter()
            .map(|(label, entry)| (label, entry.count))
            .collect()
    }
}

/// Running state for one batch
#[derive(Debug, Clone)]
pub(crate) struct Tally {
    offset: FixedOffset,
    pub severity_buckets: BTreeMap<DateTime<Utc>, [usize; SEVERITIES]>,
    pub categories: Ranking,
    pub actors: Ranking,
    pub heatmap: [[usize; HOURS]; DAYS],
}

impl Tally {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            severity_buckets: BTreeMap::new(),
            categories: Ranking::default(),
            actors: Ranking::default(),
            heatmap: [[0; HOURS]; DAYS],
        }
    }

    /// Account for the record at position `index` of the batch
    pub fn observe(mut self, index: usize, record: &EventRecord) -> Self {
        let counts = self
            .severity_buckets
            .entry(hour_bucket(record.time))
            .or_insert([0; SEVERITIES]);
        counts[record.severity.index()] += 1;

        self.categories.observe(record.category_label(), index);

        if let Some(user) = record.actor_user_name() {
            self.actors.observe(user, index);
        }

        let (day, hour) = heatmap_coordinates(record.time, self.offset);
        self.heatmap[day][hour] += 1;

        self
    }

    pub fn merge(mut self, other: Tally) -> Self {
        for (bucket, theirs) in other.severity_buckets {
            let ours = self
                .severity_buckets
                .entry(bucket)
                .or_insert([0; SEVERITIES]);
            for (o, t) in ours.iter_mut().zip(theirs) {
                *o += t;
            }
        }
        self.categories.merge(other.categories);
        self.actors.merge(other.actors);
        for (ours, theirs) in self.heatmap.iter_mut().zip(other.heatmap) {
            for (o, t) in ours.iter_mut().zip(theirs) {
                *o += t;
            }
        }
        self
    }
}

/// Split ranked pairs into parallel arrays
pub(crate) fn labeled_counts(ranked: impl IntoIterator<Item = (String, usize)>) -> LabeledCounts {
    let (labels, data) = ranked.into_iter().unzip();
    LabeledCounts { labels, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_ties_keep_first_seen_order() {
        let mut ranking = Ranking::default();
        for (i, label) in ["b", "a", "c", "a", "b", "d"].iter().enumerate() {
            ranking.observe(label, i);
        }
        let ranked = ranking.ranked();
        assert_eq!(
            ranked,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_ranking_merge_matches_sequential() {
        let labels = ["x", "y", "z", "y", "x", "w", "z"];

        let mut sequential = Ranking::default();
        for (i, label) in labels.iter().enumerate() {
            sequential.observe(label, i);
        }

        let mut right = Ranking::default();
        for (i, label) in labels.iter().enumerate().skip(3) {
            right.observe(label, i);
        }
        let mut left = Ranking::default();
        for (i, label) in labels.iter().enumerate().take(3) {
            left.observe(label, i);
        }
        // Merge in the "wrong" order to prove first-seen wins
        right.merge(left);

        assert_eq!(right.ranked(), sequential.ranked());
    }
}
