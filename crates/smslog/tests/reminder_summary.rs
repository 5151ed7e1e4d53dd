use smslog::aggregate::reminders::{ReminderWindow, daily_reminder_summary};
use smslog::models::{MessageSummary, Outcome, SchemaVersion};
use smslog::utils::time::parse_gateway_timestamp;

fn summary_at(id: &str, timestamp: &str, message: &str) -> MessageSummary {
    let ts = parse_gateway_timestamp(timestamp).expect("fixture timestamp should parse");
    MessageSummary {
        schema_version: SchemaVersion::SummaryV1,
        message_id: id.to_string(),
        first_time: timestamp.to_string(),
        last_time: timestamp.to_string(),
        first_time_unix_ms: ts.unix_ms,
        last_time_unix_ms: ts.unix_ms,
        utc_offset_seconds: ts.offset_seconds,
        duration_seconds: 0.0,
        phone_number: None,
        message: if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        },
        outcome: Outcome::Delivered,
        has_send_success: true,
        events_count: 1,
        source_file: "SMS_Log_20250327.log".to_string(),
    }
}

#[test]
fn calendar_covers_the_full_range_with_zero_filled_rows() {
    let summaries = vec![
        summary_at("M1", "2025-03-25T08:16:00+13:00", "TWO WEEKS until then"),
        summary_at("M2", "2025-03-29T08:17:00+13:00", "see you NEXT WEEK"),
    ];
    let rows = daily_reminder_summary(&summaries, ReminderWindow::default());

    let dates = rows.iter().map(|row| row.date.as_str()).collect::<Vec<_>>();
    assert_eq!(
        dates,
        vec![
            "2025-03-25",
            "2025-03-26",
            "2025-03-27",
            "2025-03-28",
            "2025-03-29"
        ]
    );
    assert_eq!(rows[0].two_week, 1);
    assert_eq!(rows[4].one_week, 1);
    for middle in &rows[1..4] {
        assert_eq!(middle.two_week + middle.one_week + middle.next_day + middle.birthday, 0);
        assert!(middle.problem_day);
    }
}

#[test]
fn problem_day_is_true_iff_all_non_unknown_categories_are_zero() {
    let summaries = vec![
        summary_at("M1", "2025-03-25T08:16:00+13:00", "Happy Birthday!"),
        summary_at("M2", "2025-03-26T08:16:00+13:00", "unrecognized body"),
    ];
    let rows = daily_reminder_summary(&summaries, ReminderWindow::default());

    assert_eq!(rows[0].birthday, 1);
    assert!(!rows[0].problem_day);
    assert_eq!(rows[1].unknown, 1);
    assert!(
        rows[1].problem_day,
        "unknown-only days count as problem days"
    );
}

#[test]
fn window_bounds_are_start_inclusive_end_exclusive() {
    let summaries = vec![
        summary_at("M1", "2025-03-25T08:15:00+13:00", "TWO WEEKS ahead"),
        summary_at("M2", "2025-03-25T08:29:59+13:00", "TWO WEEKS ahead"),
        summary_at("M3", "2025-03-25T08:30:00+13:00", "TWO WEEKS ahead"),
        summary_at("M4", "2025-03-25T08:14:59+13:00", "TWO WEEKS ahead"),
    ];
    let rows = daily_reminder_summary(&summaries, ReminderWindow::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].two_week, 2);
}

#[test]
fn window_matching_uses_the_gateway_wall_clock_not_utc() {
    // 08:20 at +13:00 is 19:20 UTC the previous day; the row must land on
    // the gateway-local date and inside the gateway-local window.
    let summaries = vec![summary_at(
        "M1",
        "2025-03-25T08:20:00+13:00",
        "Your dental appointment is on Wednesday",
    )];
    let rows = daily_reminder_summary(&summaries, ReminderWindow::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2025-03-25");
    assert_eq!(rows[0].next_day, 1);
}

#[test]
fn custom_windows_shift_the_match() {
    let summaries = vec![summary_at("M1", "2025-03-25T09:05:00+13:00", "TWO WEEKS")];
    let default_rows = daily_reminder_summary(&summaries, ReminderWindow::default());
    assert_eq!(default_rows[0].two_week, 0);

    let widened = ReminderWindow::new(9 * 60, 9 * 60 + 10).expect("window should build");
    let widened_rows = daily_reminder_summary(&summaries, widened);
    assert_eq!(widened_rows[0].two_week, 1);
}

#[test]
fn empty_input_yields_an_empty_calendar() {
    let rows = daily_reminder_summary(&[], ReminderWindow::default());
    assert!(rows.is_empty());
}
