use smslog::classify::{build_summaries, classify_outcome};
use smslog::correlate::correlate_events;
use smslog::models::{LogEvent, Outcome};
use smslog::parser::{Parsed, parse_line};

fn event_from_json(json: &str, line_number: usize) -> LogEvent {
    match parse_line(json, "SMS_Log_20250327.log", line_number) {
        Parsed::Event(event) => *event,
        Parsed::Rejected(reject) => panic!("fixture line should parse: {reject:?}"),
    }
}

fn outcome_for(lines: &[&str]) -> Outcome {
    let events = lines
        .iter()
        .enumerate()
        .map(|(index, line)| event_from_json(line, index + 1))
        .collect::<Vec<_>>();
    let groups = correlate_events(events);
    let summaries = build_summaries(groups).expect("classification should succeed");
    assert_eq!(summaries.len(), 1, "fixtures should yield one lifecycle");
    summaries[0].outcome
}

#[test]
fn delivered_beats_failed_regardless_of_event_order() {
    let failed_then_delivered = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendSuccess","MessageId":"M1"}"#,
        r#"{"Timestamp":"2025-03-27T08:00:01+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Failed"}"#,
        r#"{"Timestamp":"2025-03-27T08:00:02+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Delivered"}"#,
    ]);
    assert_eq!(failed_then_delivered, Outcome::Delivered);

    let delivered_then_failed = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendSuccess","MessageId":"M1"}"#,
        r#"{"Timestamp":"2025-03-27T08:00:01+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Delivered"}"#,
        r#"{"Timestamp":"2025-03-27T08:00:02+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Failed"}"#,
    ]);
    assert_eq!(
        delivered_then_failed,
        Outcome::Delivered,
        "first-in-precedence wins, not last-write"
    );
}

#[test]
fn failed_beats_gave_up() {
    let outcome = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendSuccess","MessageId":"M1"}"#,
        r#"{"Timestamp":"2025-03-27T08:00:01+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Failed"}"#,
    ]);
    assert_eq!(outcome, Outcome::Failed);
}

#[test]
fn send_evidence_without_terminal_status_is_gave_up() {
    let success_only = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendSuccess","MessageId":"M1"}"#,
    ]);
    assert_eq!(success_only, Outcome::GaveUp);

    let attempt_only = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendAttempt","MessageId":"M1"}"#,
    ]);
    assert_eq!(attempt_only, Outcome::GaveUp);
}

#[test]
fn generic_sent_type_with_no_other_evidence_is_unknown() {
    // MessageSent promotes the lifecycle but carries no send-attempt or
    // send-success evidence, and no delivery status ever arrives.
    let outcome = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"MessageSent","MessageId":"M1"}"#,
    ]);
    assert_eq!(outcome, Outcome::Unknown);
}

#[test]
fn pending_delivery_status_does_not_terminate_the_lifecycle() {
    let outcome = outcome_for(&[
        r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendSuccess","MessageId":"M1"}"#,
        r#"{"Timestamp":"2025-03-27T08:00:01+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Pending"}"#,
    ]);
    assert_eq!(outcome, Outcome::GaveUp);
}

#[test]
fn classify_outcome_only_reads_delivery_status_events() {
    let events = vec![
        event_from_json(
            r#"{"Timestamp":"2025-03-27T08:00:00+13:00","EventType":"SendSuccess","MessageId":"M1","Details":"will be Delivered soon"}"#,
            1,
        ),
    ];
    assert_eq!(classify_outcome(&events), Outcome::GaveUp);
}
