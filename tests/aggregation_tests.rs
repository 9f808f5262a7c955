//! Aggregation engine integration tests
//!
//! Count conservation, ordering and tie-break properties over randomized
//! batches, plus the offloaded aggregation service.

use std::sync::Arc;

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ocsf_telemetry::types::{AggregationReply, ChartData, EventRecord, Severity};
use ocsf_telemetry::{AggregationService, Aggregator};

const CATEGORIES: [&str; 5] = ["Findings", "Network Activity", "Discovery", "", "System Activity"];
const ACTORS: [&str; 14] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "",
];

fn random_batch(seed: u64, size: usize) -> Vec<EventRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    (0..size)
        .map(|_| {
            let time = start + Duration::minutes(rng.gen_range(0..60 * 24 * 14));
            let severity = Severity::ALL[rng.gen_range(0..Severity::ALL.len())];
            let mut record = EventRecord::new(time, 2004).with_severity(severity);

            let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
            if rng.gen_bool(0.9) {
                record = record.with_category(category);
            }
            if rng.gen_bool(0.7) {
                record = record.with_actor_name(ACTORS[rng.gen_range(0..ACTORS.len())]);
            }
            record
        })
        .collect()
}

fn assert_conserves_counts(charts: &ChartData, size: usize) {
    let severity_total: usize = charts
        .severity_chart
        .datasets
        .iter()
        .flat_map(|d| d.data.iter())
        .sum();
    assert_eq!(severity_total, size, "severity series");
    assert_eq!(charts.category_chart.total(), size, "category distribution");

    let heatmap_total: usize = charts.heatmap_data.iter().map(|c| c.count).sum();
    assert_eq!(heatmap_total, size, "heatmap");
    assert_eq!(charts.heatmap_data.len(), 168);
}

#[test]
fn test_counts_are_conserved() {
    for (seed, size) in [(1, 0), (2, 1), (3, 17), (4, 500), (5, 3000)] {
        let batch = random_batch(seed, size);
        let charts = Aggregator::default().aggregate(&batch);
        assert_conserves_counts(&charts, size);
    }
}

#[test]
fn test_counts_are_conserved_with_offset() {
    let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
    let batch = random_batch(9, 800);
    let charts = Aggregator::new(offset).aggregate(&batch);
    assert_conserves_counts(&charts, 800);
}

#[test]
fn test_top_actors_properties() {
    let batch = random_batch(11, 2000);
    let charts = Aggregator::default().aggregate(&batch);
    let top = &charts.top_users_chart;

    assert!(top.len() <= 10);
    assert!(!top.labels.iter().any(|l| l.is_empty()));
    assert!(top.data.windows(2).all(|w| w[0] <= w[1]));

    let named = batch.iter().filter(|r| r.actor_user_name().is_some()).count();
    assert!(top.total() <= named);
}

#[test]
fn test_category_order_is_descending_with_first_seen_ties() {
    let time = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let batch: Vec<EventRecord> = ["Zeta", "Alpha", "Alpha", "Zeta", "Mid", ""]
        .iter()
        .map(|c| EventRecord::new(time, 1001).with_category(*c))
        .collect();

    let charts = Aggregator::default().aggregate(&batch);
    assert_eq!(
        charts.category_chart.labels,
        vec!["Zeta", "Alpha", "Mid", "Unknown Category"]
    );
    assert_eq!(charts.category_chart.data, vec![2, 2, 1, 1]);

    let randomized = random_batch(21, 1500);
    let data = Aggregator::default().aggregate(&randomized).category_chart.data;
    assert!(data.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_concentrated_batch_has_one_hot_cell() {
    let time = Utc.with_ymd_and_hms(2024, 3, 3, 23, 30, 0).unwrap();
    let batch: Vec<EventRecord> = (0..42).map(|_| EventRecord::new(time, 1001)).collect();

    let charts = Aggregator::default().aggregate(&batch);
    let hot: Vec<_> = charts.heatmap_data.iter().filter(|c| c.count > 0).collect();
    assert_eq!(hot.len(), 1);
    // 2024-03-03 is a Sunday
    assert_eq!((hot[0].hour, hot[0].day, hot[0].count), (23, 6, 42));
}

#[test]
fn test_parallel_matches_sequential() {
    let batch = random_batch(31, 5000);
    let sequential = Aggregator::default()
        .with_parallel_threshold(usize::MAX)
        .aggregate(&batch);
    let parallel = Aggregator::default()
        .with_parallel_threshold(1)
        .aggregate(&batch);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_aggregation_is_deterministic() {
    let batch = random_batch(41, 1200);
    let aggregator = Aggregator::default();
    assert_eq!(aggregator.aggregate(&batch), aggregator.aggregate(&batch));
}

#[test]
fn test_input_is_not_mutated() {
    let batch = random_batch(51, 300);
    let copy = batch.clone();
    Aggregator::default().aggregate(&batch);
    assert_eq!(batch, copy);
}

#[test]
fn test_reply_wire_shape() {
    let batch = random_batch(61, 10);
    let reply = Aggregator::default().reply(&batch);
    let value = serde_json::to_value(&reply).unwrap();

    assert!(value["severityChart"]["labels"].is_array());
    assert_eq!(value["severityChart"]["datasets"].as_array().unwrap().len(), 7);
    assert_eq!(value["heatmapData"][0].as_array().unwrap().len(), 3);
    assert!(value["categoryChart"]["data"].is_array());
    assert!(value["topUsersChart"]["labels"].is_array());

    let empty = serde_json::to_value(Aggregator::default().reply(&[])).unwrap();
    assert_eq!(empty, serde_json::json!({}));
}

#[tokio::test]
async fn test_service_publishes_latest_batch() {
    let service = AggregationService::spawn(Aggregator::default());
    let batch: Arc<[EventRecord]> = random_batch(71, 400).into();

    let ticket = service.submit(Arc::clone(&batch));
    let report = service.wait_for(ticket).await.unwrap();

    assert_eq!(report.record_count, 400);
    match report.reply.as_ref() {
        AggregationReply::Charts(charts) => assert_conserves_counts(charts, 400),
        AggregationReply::Empty => panic!("expected charts"),
    }
    assert_eq!(service.latest().map(|r| r.ticket), Some(ticket));
}

#[tokio::test]
async fn test_service_newest_batch_wins() {
    let service = AggregationService::spawn(Aggregator::default());
    let first = service.submit(random_batch(81, 20_000).into());
    let second = service.submit(random_batch(82, 10).into());
    assert!(second > first);

    let report = service.wait_for(second).await.unwrap();
    assert_eq!(report.record_count, 10);
    assert!(service.wait_for(first).await.is_none());
}

#[test]
fn test_loosely_typed_batch_still_aggregates() {
    let json = r#"[
        {"time": 1709287200000, "severity": 4, "class_uid": 1001, "category_name": "Findings"},
        {"time": 1709287260000, "severity": "High", "category_name": "Findings"},
        {"time": "2024-03-01T10:30:00Z", "severity": null, "category_name": 12}
    ]"#;
    let batch: Vec<EventRecord> = serde_json::from_str(json).unwrap();
    let charts = Aggregator::default().aggregate(&batch);

    assert_conserves_counts(&charts, 3);
    assert_eq!(charts.severity_chart.series(Severity::Unknown), Some(&[2][..]));
    assert_eq!(charts.severity_chart.series(Severity::High), Some(&[1][..]));
    assert_eq!(charts.category_chart.labels, vec!["Findings", "Unknown Category"]);
}
