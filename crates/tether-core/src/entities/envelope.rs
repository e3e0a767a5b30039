//! Wire envelope
//!
//! Every frame exchanged over the socket is a JSON object with a mandatory
//! string `type` and arbitrary sibling fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Frame type emitted by the heartbeat timer
pub const HEARTBEAT: &str = "heartbeat";

/// Frame type requesting the server to start a stream
pub const START_STREAM: &str = "start_stream";

/// Frame type requesting the server to stop a stream
pub const STOP_STREAM: &str = "stop_stream";

/// JSON message envelope `{ "type": ..., ...rest }`
///
/// `kind` is an opaque discriminator. The connection layer routes envelopes
/// without ever branching on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type
    #[serde(rename = "type")]
    pub kind: String,

    /// Remaining payload fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// Create an envelope with no payload fields
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Add a payload field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    // === Core Control Frames ===

    /// Create a heartbeat frame with an explicit epoch-millisecond timestamp
    #[must_use]
    pub fn heartbeat(timestamp_ms: i64) -> Self {
        Self::new(HEARTBEAT).with_field("timestamp", timestamp_ms)
    }

    /// Create a heartbeat frame stamped with the current wall-clock time
    #[must_use]
    pub fn heartbeat_now() -> Self {
        Self::heartbeat(chrono::Utc::now().timestamp_millis())
    }

    /// Create a `start_stream` request
    #[must_use]
    pub fn start_stream(stream_type: impl Into<String>, config: Value) -> Self {
        Self::new(START_STREAM)
            .with_field("streamType", stream_type.into())
            .with_field("config", config)
    }

    /// Create a `stop_stream` request
    #[must_use]
    pub fn stop_stream(stream_id: impl Into<String>) -> Self {
        Self::new(STOP_STREAM).with_field("streamId", stream_id.into())
    }

    // === Accessors ===

    /// Get a payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Check the message type
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    ///
    /// Fails for anything that is not a JSON object carrying a string `type`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Envelope(type={}, fields={})", self.kind, self.fields.len())
    }
}
