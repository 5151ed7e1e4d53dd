use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION: &str = "smslog.summary.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SchemaVersion {
    #[serde(rename = "smslog.summary.v1")]
    #[schemars(rename = "smslog.summary.v1")]
    SummaryV1,
}

/// Terminal classification of one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Delivered,
    Failed,
    GaveUp,
    Unknown,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::GaveUp => "gave_up",
            Self::Unknown => "unknown",
        }
    }

    /// Binarized class used by run clustering: a message is `Sent` when the
    /// gateway heard back with a terminal delivery signal, `GaveUp` otherwise.
    #[must_use]
    pub const fn class(self) -> OutcomeClass {
        match self {
            Self::Delivered | Self::Failed => OutcomeClass::Sent,
            Self::GaveUp | Self::Unknown => OutcomeClass::GaveUp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    Sent,
    GaveUp,
}

impl OutcomeClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::GaveUp => "gave_up",
        }
    }
}

/// The reconstructed lifecycle record for one outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MessageSummary {
    pub schema_version: SchemaVersion,
    pub message_id: String,

    /// Wall-clock timestamps rendered in the offset the gateway logged.
    pub first_time: String,
    pub last_time: String,
    pub first_time_unix_ms: u64,
    pub last_time_unix_ms: u64,
    pub utc_offset_seconds: i32,

    /// Non-negative; zero when the group holds a single event.
    pub duration_seconds: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub outcome: Outcome,
    pub has_send_success: bool,
    pub events_count: usize,
    pub source_file: String,
}

#[must_use]
pub fn json_schema() -> Value {
    let schema = schemars::schema_for!(MessageSummary);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated summary schema: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, OutcomeClass, json_schema};

    #[test]
    fn outcome_binarization_splits_terminal_signals_from_the_rest() {
        assert_eq!(Outcome::Delivered.class(), OutcomeClass::Sent);
        assert_eq!(Outcome::Failed.class(), OutcomeClass::Sent);
        assert_eq!(Outcome::GaveUp.class(), OutcomeClass::GaveUp);
        assert_eq!(Outcome::Unknown.class(), OutcomeClass::GaveUp);
    }

    #[test]
    fn schema_document_lists_required_summary_fields() {
        let schema = json_schema();
        let required = schema
            .get("required")
            .and_then(serde_json::Value::as_array)
            .expect("schema should list required fields");
        let names = required
            .iter()
            .filter_map(serde_json::Value::as_str)
            .collect::<Vec<_>>();
        assert!(names.contains(&"message_id"));
        assert!(names.contains(&"outcome"));
        assert!(names.contains(&"duration_seconds"));
    }
}
