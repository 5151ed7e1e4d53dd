use serde::Deserialize;

use crate::models::{EventKind, LogEvent};
use crate::utils::time::parse_gateway_timestamp;

/// The serde image of one raw gateway log line. Decoded exactly once here;
/// downstream code never re-parses JSON.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Timestamp")]
    timestamp: Option<String>,

    #[serde(rename = "EventType")]
    event_type: Option<String>,

    #[serde(rename = "MessageId")]
    message_id: Option<String>,

    #[serde(rename = "Details")]
    details: Option<String>,

    #[serde(rename = "Level")]
    level: Option<String>,

    #[serde(rename = "Provider")]
    provider: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    BlankLine,
    InvalidJson,
    MissingTimestamp,
    UnparsableTimestamp,
}

impl RejectReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlankLine => "blank_line",
            Self::InvalidJson => "invalid_json",
            Self::MissingTimestamp => "missing_timestamp",
            Self::UnparsableTimestamp => "unparsable_timestamp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RejectedLine {
    pub line_number: usize,
    pub reason: RejectReason,
    pub detail: String,
}

/// Result of parsing a single line: never a panic, never a thrown error.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Event(Box<LogEvent>),
    Rejected(RejectedLine),
}

/// Per-file parse bookkeeping. Reject counts are surfaced in every run
/// summary so silent data loss is observable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileParseStats {
    pub file_name: String,
    pub lines_read: usize,
    pub events_parsed: usize,
    pub rejects: Vec<RejectedLine>,
}

impl FileParseStats {
    #[must_use]
    pub fn reject_count(&self, reason: RejectReason) -> usize {
        self.rejects
            .iter()
            .filter(|reject| reject.reason == reason)
            .count()
    }
}

#[must_use]
pub fn parse_line(raw: &str, source_file: &str, line_number: usize) -> Parsed {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Parsed::Rejected(RejectedLine {
            line_number,
            reason: RejectReason::BlankLine,
            detail: "empty or whitespace-only line".to_string(),
        });
    }

    let record = match serde_json::from_str::<RawRecord>(trimmed) {
        Ok(record) => record,
        Err(error) => {
            return Parsed::Rejected(RejectedLine {
                line_number,
                reason: RejectReason::InvalidJson,
                detail: format!("invalid JSON payload: {error}"),
            });
        }
    };

    let Some(timestamp_raw) = record.timestamp.filter(|value| !value.trim().is_empty()) else {
        return Parsed::Rejected(RejectedLine {
            line_number,
            reason: RejectReason::MissingTimestamp,
            detail: "record has no Timestamp field".to_string(),
        });
    };

    let timestamp = match parse_gateway_timestamp(&timestamp_raw) {
        Ok(timestamp) => timestamp,
        Err(error) => {
            return Parsed::Rejected(RejectedLine {
                line_number,
                reason: RejectReason::UnparsableTimestamp,
                detail: format!("{error:#}"),
            });
        }
    };

    let event_type_raw = record.event_type.unwrap_or_default();
    Parsed::Event(Box::new(LogEvent {
        timestamp_raw,
        timestamp_unix_ms: timestamp.unix_ms,
        utc_offset_seconds: timestamp.offset_seconds,
        kind: EventKind::from_raw(&event_type_raw),
        event_type_raw,
        message_id: record
            .message_id
            .filter(|value| !value.trim().is_empty()),
        details: record.details.unwrap_or_default(),
        level: record.level.filter(|value| !value.trim().is_empty()),
        provider: record.provider.filter(|value| !value.trim().is_empty()),
        source_file: source_file.to_string(),
        line_number,
        extracted_phone: None,
        extracted_message: None,
    }))
}

/// Fold a whole file into accepted events plus per-file reject stats.
#[must_use]
pub fn parse_file_contents(input: &str, source_file: &str) -> (Vec<LogEvent>, FileParseStats) {
    let mut events = Vec::new();
    let mut stats = FileParseStats {
        file_name: source_file.to_string(),
        ..FileParseStats::default()
    };

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        stats.lines_read += 1;
        match parse_line(line, source_file, line_number) {
            Parsed::Event(event) => {
                stats.events_parsed += 1;
                events.push(*event);
            }
            Parsed::Rejected(reject) => stats.rejects.push(reject),
        }
    }

    (events, stats)
}
