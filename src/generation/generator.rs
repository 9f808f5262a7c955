//! Record generators
//!
//! The producer context asks a [`RecordGenerator`] for one record at a time
//! and takes care of chunking, cancellation and fault reporting itself.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

use crate::error::GeneratorError;
use crate::types::{
    EventRecord, GenerationMode, GenerationRequest, OcsfClass, ScenarioId, Severity,
};

/// Position of the record being generated within its request
#[derive(Debug, Clone, Copy)]
pub struct GenerationJob<'a> {
    pub request: &'a GenerationRequest,
    pub index: usize,
    /// Wall-clock instant the request started producing
    pub anchor: DateTime<Utc>,
}

/// Source of event records for the producer context
pub trait RecordGenerator: Send + Sync + 'static {
    fn generate(&self, job: &GenerationJob<'_>, rng: &mut StdRng) -> Result<EventRecord, GeneratorError>;
}

const ACTORS: [&str; 12] = [
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
    "mallory", "oscar",
];

const ACTIVITIES: [&str; 5] = ["Create", "Read", "Update", "Delete", "Other"];

/// Relative weights for single-class severities, in `Severity::ALL` order
const SEVERITY_WEIGHTS: [u32; 7] = [35, 25, 20, 12, 6, 1, 1];

/// Probability that a record carries an actor
const ACTOR_PROBABILITY: f64 = 0.8;

const SINGLE_CLASS_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;
const SCENARIO_WINDOW_MS: i64 = 6 * 60 * 60 * 1000;

struct Stage {
    class: OcsfClass,
    severity: Severity,
    activity: &'static str,
}

const RANSOMWARE: &[Stage] = &[
    Stage { class: OcsfClass::Authentication, severity: Severity::Medium, activity: "Logon" },
    Stage { class: OcsfClass::ProcessActivity, severity: Severity::High, activity: "Launch" },
    Stage { class: OcsfClass::NetworkActivity, severity: Severity::High, activity: "Open" },
    Stage { class: OcsfClass::FileSystemActivity, severity: Severity::Critical, activity: "Encrypt" },
    Stage { class: OcsfClass::DetectionFinding, severity: Severity::Critical, activity: "Create" },
];

const PHISHING: &[Stage] = &[
    Stage { class: OcsfClass::EmailActivity, severity: Severity::Low, activity: "Receive" },
    Stage { class: OcsfClass::EmailUrlActivity, severity: Severity::Medium, activity: "Scan" },
    Stage { class: OcsfClass::HttpActivity, severity: Severity::Medium, activity: "Get" },
    Stage { class: OcsfClass::Authentication, severity: Severity::High, activity: "Logon" },
    Stage { class: OcsfClass::DetectionFinding, severity: Severity::High, activity: "Create" },
];

const DATA_INFILTRATION: &[Stage] = &[
    Stage { class: OcsfClass::Authentication, severity: Severity::Medium, activity: "Logon" },
    Stage { class: OcsfClass::DatastoreActivity, severity: Severity::Medium, activity: "Query" },
    Stage { class: OcsfClass::NetworkFileActivity, severity: Severity::High, activity: "Download" },
    Stage { class: OcsfClass::DnsActivity, severity: Severity::High, activity: "Query" },
    Stage { class: OcsfClass::DataSecurityFinding, severity: Severity::Critical, activity: "Create" },
];

fn stages(scenario: ScenarioId) -> &'static [Stage] {
    match scenario {
        ScenarioId::Ransomware => RANSOMWARE,
        ScenarioId::Phishing => PHISHING,
        ScenarioId::DataInfiltration => DATA_INFILTRATION,
    }
}

/// Plausible OCSF-shaped records for demos and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticGenerator;

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self
    }

    fn weighted_severity(rng: &mut StdRng) -> Severity {
        let total: u32 = SEVERITY_WEIGHTS.iter().sum();
        let mut roll = rng.gen_range(0..total);
        for (severity, weight) in Severity::ALL.iter().zip(SEVERITY_WEIGHTS) {
            if roll < weight {
                return *severity;
            }
            roll -= weight;
        }
        Severity::Unknown
    }

    fn build(
        class: OcsfClass,
        severity: Severity,
        activity: &str,
        time: DateTime<Utc>,
        rng: &mut StdRng,
    ) -> EventRecord {
        let category = class.category();
        let mut record = EventRecord::new(time, class.uid())
            .with_severity(severity)
            .with_category(category.name())
            .with_message(format!("{} {}", class.name(), activity.to_lowercase()));
        record.category_uid = category.uid();
        record.class_name = Some(class.name().to_string());
        record.activity_name = Some(activity.to_string());

        if rng.gen_bool(ACTOR_PROBABILITY) {
            let actor = ACTORS[rng.gen_range(0..ACTORS.len())];
            record = record.with_actor_name(actor);
        }

        record.extra.insert(
            "metadata".to_string(),
            json!({
                "version": "1.1.0",
                "product": {"name": "ocsf-telemetry", "vendor_name": "Synthetic"}
            }),
        );
        record
    }
}

impl RecordGenerator for SyntheticGenerator {
    fn generate(&self, job: &GenerationJob<'_>, rng: &mut StdRng) -> Result<EventRecord, GeneratorError> {
        match job.request.mode() {
            GenerationMode::SingleClass(class) => {
                let time = job.anchor - Duration::milliseconds(rng.gen_range(0..SINGLE_CLASS_WINDOW_MS));
                let activity = ACTIVITIES[rng.gen_range(0..ACTIVITIES.len())];
                Ok(Self::build(class, Self::weighted_severity(rng), activity, time, rng))
            }
            GenerationMode::Scenario(scenario) => {
                let count = job.request.record_count();
                let stages = stages(scenario);
                let stage = &stages[stage_index(job.index, count, stages.len())];

                // Scenario events move forward in time, ending at the anchor
                let time = job.anchor - Duration::milliseconds(SCENARIO_WINDOW_MS)
                    + Duration::milliseconds(window_offset_ms(job.index, count));
                Ok(Self::build(stage.class, stage.severity, stage.activity, time, rng))
            }
        }
    }
}

/// Stage of the `index`-th record when `count` records span `stages` stages
fn stage_index(index: usize, count: usize, stages: usize) -> usize {
    let scaled = index as u128 * stages as u128 / count.max(1) as u128;
    usize::try_from(scaled)
        .unwrap_or(usize::MAX)
        .min(stages.saturating_sub(1))
}

/// Offset of the `index`-th record into the scenario window
fn window_offset_ms(index: usize, count: usize) -> i64 {
    let offset = index as u128 * SCENARIO_WINDOW_MS as u128 / count.max(1) as u128;
    i64::try_from(offset).unwrap_or(SCENARIO_WINDOW_MS).min(SCENARIO_WINDOW_MS)
}
