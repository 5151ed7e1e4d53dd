use std::collections::BTreeMap;

use crate::extract;
use crate::models::{EventKind, LogEvent};

/// Owned correlation state for one batch pass.
///
/// The pending-attempt slot is single and global across the whole ordered
/// stream, not scoped per entity: a key-less attempt binds to whichever
/// success comes next, and a second key-less attempt evicts the first
/// unlinked. Both behaviors are load-bearing for compatibility with
/// historical reports and are covered by tests.
#[derive(Debug, Default)]
pub struct CorrelationState {
    pending_attempt: Option<LogEvent>,
    groups: BTreeMap<String, Vec<LogEvent>>,
}

impl CorrelationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending_attempt(&self) -> Option<&LogEvent> {
        self.pending_attempt.as_ref()
    }

    /// Feed one event, in canonical stream order (file name, then line).
    pub fn observe(&mut self, mut event: LogEvent) {
        if event.kind == EventKind::SendAttempt && event.message_id().is_none() {
            // Evicting an occupied slot discards the previous attempt unlinked.
            self.pending_attempt = Some(event);
            return;
        }

        if event.kind == EventKind::SendSuccess && event.message_id().is_some() {
            if let Some(attempt) = self.pending_attempt.take() {
                let fields = extract::extract_fields(&attempt.details);
                event.extracted_phone = fields.phone_number;
                event.extracted_message = fields.message;
            }
        }

        let Some(message_id) = event.message_id().map(ToString::to_string) else {
            return;
        };
        self.groups.entry(message_id).or_default().push(event);
    }

    /// Materialize the per-entity groups, consuming the state. Any pending
    /// attempt still in the slot is dropped, matching the batch semantics.
    #[must_use]
    pub fn into_groups(self) -> BTreeMap<String, Vec<LogEvent>> {
        self.groups
    }
}

/// Run the correlation pass over an already-ordered event stream.
#[must_use]
pub fn correlate_events(
    events: impl IntoIterator<Item = LogEvent>,
) -> BTreeMap<String, Vec<LogEvent>> {
    let mut state = CorrelationState::new();
    for event in events {
        state.observe(event);
    }
    state.into_groups()
}
