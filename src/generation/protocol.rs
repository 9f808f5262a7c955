//! Messages exchanged with the producer context
//!
//! The producer understands two commands and answers with three message
//! kinds (`data`, `done`, `error`). A fault of the context itself is not a
//! message the producer sends; it is reported as a separate transport event.

use serde::{Deserialize, Serialize};

use crate::types::{GenerationChunk, WireRequest};

/// Identity of one generation request on a shared producer context
pub type RequestId = u64;

/// Caller -> producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProducerCommand {
    /// Start producing records for a request
    Generate {
        request_id: RequestId,
        #[serde(flatten)]
        payload: WireRequest,
    },
    /// Stop producing for a request at the next chunk boundary
    Cancel { request_id: RequestId },
}

/// Producer -> caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProducerMessage {
    /// Partial progress
    Data(GenerationChunk),
    /// Terminal success
    Done,
    /// Terminal failure with a diagnostic
    Error(String),
}

impl ProducerMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProducerMessage::Data(_))
    }
}

/// A producer message tagged with the request it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerEnvelope {
    pub request_id: RequestId,
    #[serde(flatten)]
    pub message: ProducerMessage,
}

/// What the router receives from a producer context
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProducerEvent {
    Message(ProducerEnvelope),
    /// Uncaught failure while serving a request
    Fault { request_id: RequestId, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventRecord;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_message_wire_shape() {
        let done = ProducerEnvelope {
            request_id: 7,
            message: ProducerMessage::Done,
        };
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            json!({"request_id": 7, "type": "done"})
        );

        let error = ProducerEnvelope {
            request_id: 7,
            message: ProducerMessage::Error("boom".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"request_id": 7, "type": "error", "payload": "boom"})
        );
    }

    #[test]
    fn test_data_message_carries_records() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let message = ProducerMessage::Data(vec![EventRecord::new(time, 1001)]);
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "data");
        assert_eq!(value["payload"][0]["class_uid"], 1001);
        assert!(!message.is_terminal());
        assert!(ProducerMessage::Done.is_terminal());
    }

    #[test]
    fn test_generate_command_shape() {
        let command = ProducerCommand::Generate {
            request_id: 1,
            payload: WireRequest {
                class_uid: Some(3002),
                scenario_id: None,
                count: 50,
            },
        };
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({"type": "generate", "request_id": 1, "classUid": 3002, "count": 50})
        );
    }
}
