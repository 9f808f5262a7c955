//! Working-set export
//!
//! File naming and JSON rendering only; delivering the file is up to the
//! caller.

use crate::types::{EventRecord, GenerationMode, GenerationRequest};

/// Deterministic download name for a batch produced by `request`
pub fn export_file_name(request: &GenerationRequest) -> String {
    match request.mode() {
        GenerationMode::SingleClass(class) => format!(
            "ocsf_class_{}_{}_records.json",
            class.uid(),
            request.record_count()
        ),
        GenerationMode::Scenario(scenario) => format!(
            "ocsf_scenario_{}_{}_events.json",
            scenario.id(),
            request.record_count()
        ),
    }
}

/// Name used when the batch has no known origin
pub const FALLBACK_FILE_NAME: &str = "ocsf_events.json";

/// Pretty-printed JSON array of the records
pub fn export_json(records: &[EventRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}
