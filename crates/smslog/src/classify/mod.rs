use std::collections::BTreeMap;

use anyhow::Result;

use crate::extract::{self, DeliveryMarker};
use crate::models::{EventKind, LogEvent, MessageSummary, Outcome, SchemaVersion};
use crate::utils::time::format_wall_clock;

/// Batch-fatal invariant violation: an entity group that cannot yield a
/// coherent lifecycle. Surfaced as a descriptive error rather than a silent
/// skip, since it indicates an upstream data contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleInvariantFailure {
    pub message_id: String,
    pub detail: String,
}

impl std::fmt::Display for LifecycleInvariantFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lifecycle invariant violated for message {}: {}",
            self.message_id, self.detail
        )
    }
}

impl std::error::Error for LifecycleInvariantFailure {}

/// Build lifecycle summaries from correlated per-entity groups.
///
/// Entities whose group carries no outbound evidence (attempt, success, or a
/// generic sent record) are incidental and are not promoted. The returned
/// summaries are sorted by (first_time, message_id) for determinism.
pub fn build_summaries(groups: BTreeMap<String, Vec<LogEvent>>) -> Result<Vec<MessageSummary>> {
    let mut summaries = Vec::new();

    for (message_id, mut events) in groups {
        if events.is_empty() {
            return Err(LifecycleInvariantFailure {
                message_id,
                detail: "no events with a resolvable timestamp".to_string(),
            }
            .into());
        }

        if !events.iter().any(|event| event.kind.is_outbound_evidence()) {
            continue;
        }

        events.sort_by(|left, right| {
            left.timestamp_unix_ms
                .cmp(&right.timestamp_unix_ms)
                .then_with(|| left.source_file.cmp(&right.source_file))
                .then_with(|| left.line_number.cmp(&right.line_number))
        });

        let first = &events[0];
        let last = &events[events.len() - 1];
        let first_time_unix_ms = first.timestamp_unix_ms;
        let last_time_unix_ms = last.timestamp_unix_ms;
        let utc_offset_seconds = first.utc_offset_seconds;
        let duration_seconds = (last_time_unix_ms - first_time_unix_ms) as f64 / 1_000.0;

        let send_success = events
            .iter()
            .find(|event| event.kind == EventKind::SendSuccess);
        let phone_number = send_success.and_then(|event| event.extracted_phone.clone());
        let message = send_success.and_then(|event| event.extracted_message.clone());

        summaries.push(MessageSummary {
            schema_version: SchemaVersion::SummaryV1,
            message_id,
            first_time: format_wall_clock(first_time_unix_ms, utc_offset_seconds),
            last_time: format_wall_clock(last_time_unix_ms, last.utc_offset_seconds),
            first_time_unix_ms,
            last_time_unix_ms,
            utc_offset_seconds,
            duration_seconds,
            phone_number,
            message,
            outcome: classify_outcome(&events),
            has_send_success: send_success.is_some(),
            events_count: events.len(),
            source_file: first.source_file.clone(),
        });
    }

    summaries.sort_by(|left, right| {
        left.first_time_unix_ms
            .cmp(&right.first_time_unix_ms)
            .then_with(|| left.message_id.cmp(&right.message_id))
    });
    Ok(summaries)
}

/// Outcome precedence, first match wins:
/// delivered marker, then failed marker, then plain send evidence, then
/// unknown. Conflicting status events for the same entity resolve by this
/// order, never by arrival order.
#[must_use]
pub fn classify_outcome(events: &[LogEvent]) -> Outcome {
    let marker_of = |wanted: DeliveryMarker| {
        events.iter().any(|event| {
            event.kind == EventKind::DeliveryStatus
                && extract::extract_delivery_marker(&event.details) == Some(wanted)
        })
    };

    if marker_of(DeliveryMarker::Delivered) {
        return Outcome::Delivered;
    }
    if marker_of(DeliveryMarker::Failed) {
        return Outcome::Failed;
    }
    if events
        .iter()
        .any(|event| matches!(event.kind, EventKind::SendSuccess | EventKind::SendAttempt))
    {
        return Outcome::GaveUp;
    }
    Outcome::Unknown
}
