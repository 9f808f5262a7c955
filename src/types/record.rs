//! Event Record - one security-event observation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::utils::time::epoch_millis;

/// Label used when a record carries no category name
pub const UNKNOWN_CATEGORY: &str = "Unknown Category";

/// Event criticality as reported by the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
    Fatal,
    #[default]
    Unknown,
}

impl Severity {
    /// All severities in chart order
    pub const ALL: [Severity; 7] = [
        Severity::Informational,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
        Severity::Fatal,
        Severity::Unknown,
    ];

    /// Display label, identical to the wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Informational => "Informational",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
            Severity::Fatal => "Fatal",
            Severity::Unknown => "Unknown",
        }
    }

    /// Fixed chart color for this severity
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Informational => "#58a3e6",
            Severity::Low => "#62cb90",
            Severity::Medium => "#ffce56",
            Severity::High => "#ff9f40",
            Severity::Critical => "#ff6384",
            Severity::Fatal => "#9966ff",
            Severity::Unknown => "#c9cbcf",
        }
    }

    /// OCSF `severity_id`
    pub fn id(&self) -> u8 {
        match self {
            Severity::Unknown => 0,
            Severity::Informational => 1,
            Severity::Low => 2,
            Severity::Medium => 3,
            Severity::High => 4,
            Severity::Critical => 5,
            Severity::Fatal => 6,
        }
    }

    /// Position in [`Severity::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Severity::Informational => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
            Severity::Fatal => 5,
            Severity::Unknown => 6,
        }
    }

    /// Parse a wire label; anything unrecognized is `Unknown`
    pub fn from_label(label: &str) -> Self {
        Severity::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(Severity::Unknown)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Numbers, objects and null all normalize to Unknown
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(Severity::from_label).unwrap_or_default())
    }
}

/// User attached to an actor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// The entity that performed the activity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// One security-event observation in OCSF shape
///
/// Only the fields read by the aggregation engine are typed; every other
/// attribute the producer attaches is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event time; epoch milliseconds or RFC 3339 on input
    #[serde(with = "epoch_millis")]
    pub time: DateTime<Utc>,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub severity_id: Option<u8>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_uid: Option<u32>,

    #[serde(default)]
    pub class_uid: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Optional field that drops values of the wrong shape instead of failing
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl EventRecord {
    /// Create a record with only the required fields set
    pub fn new(time: DateTime<Utc>, class_uid: u32) -> Self {
        Self {
            time,
            severity: Severity::Unknown,
            severity_id: None,
            category_name: None,
            category_uid: None,
            class_uid,
            class_name: None,
            activity_name: None,
            message: None,
            actor: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self.severity_id = Some(severity.id());
        self
    }

    pub fn with_category(mut self, category_name: impl Into<String>) -> Self {
        self.category_name = Some(category_name.into());
        self
    }

    pub fn with_actor_name(mut self, name: impl Into<String>) -> Self {
        self.actor = Some(Actor {
            user: Some(User {
                name: Some(name.into()),
                uid: None,
            }),
        });
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Category label used for grouping
    pub fn category_label(&self) -> &str {
        match self.category_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_CATEGORY,
        }
    }

    /// Actor user name, if present and non-empty
    pub fn actor_user_name(&self) -> Option<&str> {
        self.actor
            .as_ref()
            .and_then(|a| a.user.as_ref())
            .and_then(|u| u.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}
