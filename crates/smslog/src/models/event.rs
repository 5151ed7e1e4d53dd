/// Recognized gateway event types. Unrecognized values are retained on the
/// event as `event_type_raw` rather than dropped, since timeout- and
/// error-bearing types are matched against the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SendAttempt,
    SendSuccess,
    DeliveryStatus,
    MessageSent,
    Other,
}

impl EventKind {
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "SendAttempt" => Self::SendAttempt,
            "SendSuccess" => Self::SendSuccess,
            "DeliveryStatus" => Self::DeliveryStatus,
            "MessageSent" => Self::MessageSent,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SendAttempt => "send_attempt",
            Self::SendSuccess => "send_success",
            Self::DeliveryStatus => "delivery_status",
            Self::MessageSent => "message_sent",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn is_outbound_evidence(self) -> bool {
        matches!(self, Self::SendAttempt | Self::SendSuccess | Self::MessageSent)
    }
}

/// One accepted log line in structured form.
///
/// `timestamp_unix_ms` is the normalized instant; `utc_offset_seconds` keeps
/// the offset carried by the source string so wall-clock bucketing
/// (hour-of-day, calendar date, reminder window) reproduces the gateway's
/// local clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp_raw: String,
    pub timestamp_unix_ms: u64,
    pub utc_offset_seconds: i32,
    pub kind: EventKind,
    pub event_type_raw: String,
    pub message_id: Option<String>,
    pub details: String,
    pub level: Option<String>,
    pub provider: Option<String>,
    pub source_file: String,
    pub line_number: usize,
    pub extracted_phone: Option<String>,
    pub extracted_message: Option<String>,
}

impl LogEvent {
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref().filter(|id| !id.is_empty())
    }
}
