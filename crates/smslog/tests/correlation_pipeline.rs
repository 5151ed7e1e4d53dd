use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use smslog::aggregate::reminders::{ReminderKind, ReminderWindow, classify_reminder_message};
use smslog::models::Outcome;
use smslog::summarize::{SummarizePlan, run_pipeline};
use smslog::utils::time::wall_clock_minutes_of_day;

fn temp_log_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("smslog-{label}-{nanos}"));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_log(dir: &PathBuf, name: &str, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(dir.join(name), body).expect("fixture log should be writable");
}

fn plan(dir: PathBuf) -> SummarizePlan {
    SummarizePlan {
        log_dir: dir,
        cutoff_date: None,
        fail_fast: false,
    }
}

#[test]
fn keyless_attempt_binds_to_next_success_and_lifecycle_is_delivered() {
    let dir = temp_log_dir("scenario-delivered");
    write_log(
        &dir,
        "SMS_Log_20250327.log",
        &[
            r#"{"Timestamp":"2025-03-27T08:20:00+13:00","EventType":"SendAttempt","Details":"PhoneNumber: +6421000000, Message: TWO WEEKS reminder"}"#,
            r#"{"Timestamp":"2025-03-27T08:20:01+13:00","EventType":"SendSuccess","MessageId":"M1","Details":"PhoneNumber: +6421000000"}"#,
            r#"{"Timestamp":"2025-03-27T08:20:03+13:00","EventType":"DeliveryStatus","MessageId":"M1","Details":"Status: Delivered, Delivery Time: 2.5"}"#,
        ],
    );

    let outcome = run_pipeline(&plan(dir)).expect("pipeline should succeed");
    assert_eq!(outcome.summaries.len(), 1);

    let summary = &outcome.summaries[0];
    assert_eq!(summary.message_id, "M1");
    assert_eq!(summary.outcome, Outcome::Delivered);
    assert!((summary.duration_seconds - 3.0).abs() < f64::EPSILON);
    assert_eq!(summary.phone_number.as_deref(), Some("+6421000000"));
    let message = summary.message.as_deref().expect("message should be bound");
    assert!(message.contains("TWO WEEKS reminder"));

    // The first event falls inside the default dispatch window, so the bound
    // body classifies as a two-week reminder.
    let minutes = wall_clock_minutes_of_day(summary.first_time_unix_ms, summary.utc_offset_seconds);
    assert!(ReminderWindow::default().contains(minutes));
    assert_eq!(classify_reminder_message(message), ReminderKind::TwoWeek);
}

#[test]
fn consecutive_keyless_attempts_discard_the_first_unbound() {
    let dir = temp_log_dir("scenario-discard");
    write_log(
        &dir,
        "SMS_Log_20250327.log",
        &[
            r#"{"Timestamp":"2025-03-27T09:00:00+13:00","EventType":"SendAttempt","Details":"PhoneNumber: +6411111111, Message: first attempt"}"#,
            r#"{"Timestamp":"2025-03-27T09:00:05+13:00","EventType":"SendAttempt","Details":"PhoneNumber: +6422222222, Message: second attempt"}"#,
            r#"{"Timestamp":"2025-03-27T09:00:06+13:00","EventType":"SendSuccess","MessageId":"M2"}"#,
        ],
    );

    let outcome = run_pipeline(&plan(dir)).expect("pipeline should succeed");
    assert_eq!(outcome.summaries.len(), 1);

    let summary = &outcome.summaries[0];
    assert_eq!(summary.phone_number.as_deref(), Some("+6422222222"));
    assert_eq!(summary.message.as_deref(), Some("second attempt"));
}

#[test]
fn correlation_order_spans_files_lexically_by_name() {
    // The attempt sits at the end of the earlier file, the success at the
    // start of the later file; the slot carries across the boundary.
    let dir = temp_log_dir("scenario-cross-file");
    write_log(
        &dir,
        "SMS_Log_20250327.log",
        &[
            r#"{"Timestamp":"2025-03-27T23:59:59+13:00","EventType":"SendAttempt","Details":"PhoneNumber: +6433333333, Message: carried over"}"#,
        ],
    );
    write_log(
        &dir,
        "SMS_Log_20250328.log",
        &[
            r#"{"Timestamp":"2025-03-28T00:00:01+13:00","EventType":"SendSuccess","MessageId":"M3"}"#,
        ],
    );

    let outcome = run_pipeline(&plan(dir)).expect("pipeline should succeed");
    assert_eq!(outcome.summaries.len(), 1);
    assert_eq!(
        outcome.summaries[0].phone_number.as_deref(),
        Some("+6433333333")
    );
}

#[test]
fn cross_entity_binding_is_preserved_as_the_known_limitation() {
    // Single-slot, no-lookahead correlation: the attempt meant for one
    // message binds to the next keyed success regardless of entity.
    let dir = temp_log_dir("scenario-cross-entity");
    write_log(
        &dir,
        "SMS_Log_20250327.log",
        &[
            r#"{"Timestamp":"2025-03-27T10:00:00+13:00","EventType":"SendAttempt","Details":"PhoneNumber: +6444444444, Message: meant for A"}"#,
            r#"{"Timestamp":"2025-03-27T10:00:01+13:00","EventType":"SendSuccess","MessageId":"B"}"#,
            r#"{"Timestamp":"2025-03-27T10:00:02+13:00","EventType":"SendSuccess","MessageId":"A"}"#,
        ],
    );

    let outcome = run_pipeline(&plan(dir)).expect("pipeline should succeed");
    let by_id = |id: &str| {
        outcome
            .summaries
            .iter()
            .find(|summary| summary.message_id == id)
            .expect("summary should exist")
    };
    assert_eq!(by_id("B").phone_number.as_deref(), Some("+6444444444"));
    assert_eq!(by_id("A").phone_number, None);
}

#[test]
fn incidental_ids_never_seen_as_sent_are_not_promoted() {
    let dir = temp_log_dir("scenario-incidental");
    write_log(
        &dir,
        "SMS_Log_20250327.log",
        &[
            r#"{"Timestamp":"2025-03-27T10:00:00+13:00","EventType":"DeliveryStatus","MessageId":"GHOST","Details":"Status: Delivered, Delivery Time: 1.0"}"#,
            r#"{"Timestamp":"2025-03-27T10:00:01+13:00","EventType":"SendSuccess","MessageId":"REAL"}"#,
        ],
    );

    let outcome = run_pipeline(&plan(dir)).expect("pipeline should succeed");
    let ids = outcome
        .summaries
        .iter()
        .map(|summary| summary.message_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["REAL"]);
}
