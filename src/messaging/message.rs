//! # Message Envelope
//!
//! The only unit of cross-context communication. A message names one
//! catalog member, carries a job-specific JSON payload, and records the
//! sending context (`origin`) and the intended recipient (`target`,
//! `None` for a broadcast).

use super::errors::{ProtocolError, ProtocolResult};
use crate::constants::{MessageType, ORCHESTRATOR_ORIGIN};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable message addressed by a catalog member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    #[serde(rename = "type")]
    message_type: MessageType,
    payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

/// A message as it arrives on the wire, before catalog validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl TryFrom<RawMessage> for Message {
    type Error = ProtocolError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let message_type = MessageType::from_wire(&raw.message_type)
            .ok_or_else(|| ProtocolError::unknown_message_type(raw.message_type.clone()))?;

        Ok(Self {
            message_type,
            payload: raw.payload,
            origin: raw.origin,
            target: raw.target,
        })
    }
}

impl Message {
    pub fn new(message_type: MessageType, payload: Value) -> Self {
        Self {
            message_type,
            payload,
            origin: None,
            target: None,
        }
    }

    /// An event emitted by the orchestrator to every interested listener
    pub fn event(message_type: MessageType, payload: Value) -> Self {
        Self::new(message_type, payload).with_origin(ORCHESTRATOR_ORIGIN)
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Parse a wire message, classifying failures as protocol errors
    pub fn from_json(json: &str) -> ProtocolResult<Self> {
        let raw: RawMessage =
            serde_json::from_str(json).map_err(|e| ProtocolError::MalformedMessage {
                reason: e.to_string(),
            })?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.is_none()
    }

    /// Decode the payload into its typed form; a missing payload reads as `{}`
    pub fn parse_payload<T: DeserializeOwned>(&self) -> ProtocolResult<T> {
        let payload = match &self.payload {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(payload)
            .map_err(|e| ProtocolError::malformed_payload(self.message_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{JobType, MessageKind};
    use crate::messaging::StartPayload;
    use serde_json::json;

    #[test]
    fn test_from_json_resolves_catalog_member() {
        let message =
            Message::from_json(r#"{"type":"START_MONITOR","payload":{"resume":true},"origin":"popup"}"#)
                .unwrap();

        assert_eq!(
            message.message_type(),
            MessageType::new(MessageKind::Start, JobType::Monitor)
        );
        assert_eq!(message.origin(), Some("popup"));
        assert!(message.is_broadcast());
    }

    #[test]
    fn test_unknown_type_is_protocol_error() {
        let err = Message::from_json(r#"{"type":"START_EVERYTHING"}"#).unwrap_err();
        assert_eq!(err, ProtocolError::unknown_message_type("START_EVERYTHING"));

        let err = Message::from_json("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedMessage { .. }));
    }

    #[test]
    fn test_missing_payload_parses_as_defaults() {
        let message = Message::from_json(r#"{"type":"START_SKU_BACKFILL"}"#).unwrap();
        let payload: StartPayload = message.parse_payload().unwrap();

        assert!(payload.settings.is_none());
        assert!(!payload.resume);
    }

    #[test]
    fn test_malformed_payload_names_message_type() {
        let message = Message::new(
            MessageType::new(MessageKind::Start, JobType::CsvImport),
            json!({"resume": "yes please"}),
        );
        let err = message.parse_payload::<StartPayload>().unwrap_err();

        assert!(matches!(
            err,
            ProtocolError::MalformedPayload { ref message_type, .. } if message_type == "START_CSV_IMPORT"
        ));
    }

    #[test]
    fn test_event_serializes_with_wire_name() {
        let message = Message::event(
            MessageType::new(MessageKind::Progress, JobType::BoostScheduler),
            json!({"processed": 1}),
        );
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "BOOST_PROGRESS");
        assert_eq!(value["origin"], ORCHESTRATOR_ORIGIN);
        assert!(value.get("target").is_none());
    }
}
