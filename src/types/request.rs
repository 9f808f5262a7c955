//! Generation requests

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::class_uid::OcsfClass;
use crate::error::RequestError;

/// Known attack scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    Ransomware,
    Phishing,
    DataInfiltration,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 3] = [
        ScenarioId::Ransomware,
        ScenarioId::Phishing,
        ScenarioId::DataInfiltration,
    ];

    /// Wire identifier
    pub fn id(&self) -> &'static str {
        match self {
            ScenarioId::Ransomware => "ransomware",
            ScenarioId::Phishing => "phishing",
            ScenarioId::DataInfiltration => "data_infiltration",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Ransomware => "Ransomware Attack",
            ScenarioId::Phishing => "Phishing Attack",
            ScenarioId::DataInfiltration => "Data Infiltration",
        }
    }
}

impl FromStr for ScenarioId {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::ALL
            .into_iter()
            .find(|scenario| scenario.id() == s)
            .ok_or_else(|| RequestError::UnknownScenario(s.to_string()))
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What the producer should generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    SingleClass(OcsfClass),
    Scenario(ScenarioId),
}

/// A validated generation request
///
/// `record_count` is always positive; the constructors are the only way to
/// build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    mode: GenerationMode,
    record_count: usize,
}

impl GenerationRequest {
    pub fn single_class(class: OcsfClass, record_count: usize) -> Result<Self, RequestError> {
        Self::new(GenerationMode::SingleClass(class), record_count)
    }

    pub fn scenario(scenario: ScenarioId, record_count: usize) -> Result<Self, RequestError> {
        Self::new(GenerationMode::Scenario(scenario), record_count)
    }

    pub fn new(mode: GenerationMode, record_count: usize) -> Result<Self, RequestError> {
        if record_count == 0 {
            return Err(RequestError::ZeroCount);
        }
        Ok(Self { mode, record_count })
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Upper bound on produced records
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Reject counts above `max`
    pub fn ensure_within(&self, max: usize) -> Result<(), RequestError> {
        if self.record_count > max {
            return Err(RequestError::TooManyRecords {
                requested: self.record_count,
                max,
            });
        }
        Ok(())
    }
}

/// Request message as posted to the producer: exactly one of `classUid` /
/// `scenarioId` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_uid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    pub count: usize,
}

impl TryFrom<WireRequest> for GenerationRequest {
    type Error = RequestError;

    fn try_from(wire: WireRequest) -> Result<Self, Self::Error> {
        let mode = match (wire.class_uid, wire.scenario_id) {
            (Some(_), Some(_)) => return Err(RequestError::AmbiguousMode),
            (None, None) => return Err(RequestError::MissingMode),
            (Some(uid), None) => GenerationMode::SingleClass(
                OcsfClass::from_uid(uid).ok_or(RequestError::UnknownClass(uid))?,
            ),
            (None, Some(id)) => GenerationMode::Scenario(id.parse()?),
        };
        GenerationRequest::new(mode, wire.count)
    }
}

impl From<&GenerationRequest> for WireRequest {
    fn from(request: &GenerationRequest) -> Self {
        match request.mode {
            GenerationMode::SingleClass(class) => WireRequest {
                class_uid: Some(class.uid()),
                scenario_id: None,
                count: request.record_count,
            },
            GenerationMode::Scenario(scenario) => WireRequest {
                class_uid: None,
                scenario_id: Some(scenario.id().to_string()),
                count: request.record_count,
            },
        }
    }
}
