use std::sync::OnceLock;

use regex::Regex;

/// Terminal delivery signal embedded in a `DeliveryStatus` details payload.
///
/// `Delivered` wins over `Failed` when both substrings occur; the priority is
/// part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMarker {
    Delivered,
    Failed,
}

/// Fields pulled out of one free-text details payload. Absence of a pattern
/// is a `None`, never an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedFields {
    pub phone_number: Option<String>,
    pub message: Option<String>,
    pub delivery_seconds: Option<f64>,
    pub delivery_marker: Option<DeliveryMarker>,
}

#[must_use]
pub fn extract_fields(details: &str) -> ExtractedFields {
    ExtractedFields {
        phone_number: extract_phone_number(details),
        message: extract_message(details),
        delivery_seconds: extract_delivery_seconds(details),
        delivery_marker: extract_delivery_marker(details),
    }
}

/// First-matching pattern in fixed priority order wins: the labelled
/// `PhoneNumber:` field beats the shorter `Number:` field, which would
/// otherwise also match inside `PhoneNumber:`.
#[must_use]
pub fn extract_phone_number(details: &str) -> Option<String> {
    for pattern in [phone_number_regex(), number_regex()] {
        if let Some(captures) = pattern.captures(details) {
            return Some(captures[1].to_string());
        }
    }
    None
}

/// Free-text message body: everything after the first `Message:` marker.
#[must_use]
pub fn extract_message(details: &str) -> Option<String> {
    let (_, tail) = details.split_once("Message:")?;
    let body = tail.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

#[must_use]
pub fn extract_delivery_seconds(details: &str) -> Option<f64> {
    let captures = delivery_time_regex().captures(details)?;
    captures[1].parse::<f64>().ok()
}

#[must_use]
pub fn extract_delivery_marker(details: &str) -> Option<DeliveryMarker> {
    if details.contains("Delivered") {
        Some(DeliveryMarker::Delivered)
    } else if details.contains("Failed") {
        Some(DeliveryMarker::Failed)
    } else {
        None
    }
}

fn phone_number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"PhoneNumber:\s*(\+?\d+)").expect("phone number regex should compile")
    })
}

fn number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(r"Number:\s*(\+?\d+)").expect("number regex should compile"))
}

fn delivery_time_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"Delivery Time:\s*(\d+\.\d+|\d+)")
            .expect("delivery time regex should compile")
    })
}

#[cfg(test)]
mod tests {
    use super::{
        DeliveryMarker, extract_delivery_marker, extract_delivery_seconds, extract_fields,
        extract_message, extract_phone_number,
    };

    #[test]
    fn phone_number_label_beats_bare_number_label() {
        let details = "Number: 111, PhoneNumber: +6421000000";
        assert_eq!(
            extract_phone_number(details).as_deref(),
            Some("+6421000000")
        );
    }

    #[test]
    fn bare_number_label_matches_when_phone_number_is_absent() {
        let details = "Status: Delivered, Number: +6421555000, Delivery Time: 2.5";
        assert_eq!(
            extract_phone_number(details).as_deref(),
            Some("+6421555000")
        );
    }

    #[test]
    fn extracts_message_body_after_marker() {
        let details = "PhoneNumber: +6421000000, Message: TWO WEEKS reminder";
        assert_eq!(
            extract_message(details).as_deref(),
            Some("TWO WEEKS reminder")
        );
        assert_eq!(extract_message("PhoneNumber: +6421000000"), None);
        assert_eq!(extract_message("Message:   "), None);
    }

    #[test]
    fn extracts_delivery_seconds_as_float_or_int() {
        assert_eq!(extract_delivery_seconds("Delivery Time: 2.5"), Some(2.5));
        assert_eq!(extract_delivery_seconds("Delivery Time: 12"), Some(12.0));
        assert_eq!(extract_delivery_seconds("Delivery Time: soon"), None);
    }

    #[test]
    fn delivered_marker_beats_failed_marker() {
        assert_eq!(
            extract_delivery_marker("Status: Delivered after retry Failed"),
            Some(DeliveryMarker::Delivered)
        );
        assert_eq!(
            extract_delivery_marker("Status: Failed"),
            Some(DeliveryMarker::Failed)
        );
        assert_eq!(extract_delivery_marker("Status: Pending"), None);
    }

    #[test]
    fn missing_patterns_yield_not_found_markers() {
        let fields = extract_fields("provider heartbeat ok");
        assert_eq!(fields.phone_number, None);
        assert_eq!(fields.message, None);
        assert_eq!(fields.delivery_seconds, None);
        assert_eq!(fields.delivery_marker, None);
    }

    #[test]
    fn extracts_all_fields_from_a_full_delivery_record() {
        let fields =
            extract_fields("Status: Delivered, Number: +6421000000, Delivery Time: 3.25");
        assert_eq!(fields.phone_number.as_deref(), Some("+6421000000"));
        assert_eq!(fields.delivery_seconds, Some(3.25));
        assert_eq!(fields.delivery_marker, Some(DeliveryMarker::Delivered));
    }
}
