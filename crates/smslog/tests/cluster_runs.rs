use smslog::aggregate::clusters::{compute_clusters, gave_up_context, outcome_summary};
use smslog::models::{MessageSummary, Outcome, SchemaVersion};

fn summary(id: &str, outcome: Outcome, first_ms: u64, duration: f64) -> MessageSummary {
    MessageSummary {
        schema_version: SchemaVersion::SummaryV1,
        message_id: id.to_string(),
        first_time: String::new(),
        last_time: String::new(),
        first_time_unix_ms: first_ms,
        last_time_unix_ms: first_ms + (duration * 1_000.0) as u64,
        utc_offset_seconds: 13 * 3600,
        duration_seconds: duration,
        phone_number: None,
        message: None,
        outcome,
        has_send_success: true,
        events_count: 1,
        source_file: "SMS_Log_20250327.log".to_string(),
    }
}

fn alternating_fixture() -> Vec<MessageSummary> {
    let outcomes = [
        Outcome::Delivered,
        Outcome::Delivered,
        Outcome::GaveUp,
        Outcome::GaveUp,
        Outcome::GaveUp,
        Outcome::Failed,
        Outcome::Unknown,
        Outcome::Delivered,
    ];
    outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| {
            summary(
                &format!("M{index}"),
                *outcome,
                1_000 * (index as u64 + 1),
                2.0,
            )
        })
        .collect()
}

#[test]
fn run_sizes_sum_to_the_total_entity_count() {
    let summaries = alternating_fixture();
    let runs = compute_clusters(&summaries);
    let total: usize = runs.iter().map(|run| run.size).sum();
    assert_eq!(total, summaries.len());
}

#[test]
fn adjacent_runs_never_share_a_binarized_class() {
    let summaries = alternating_fixture();
    let runs = compute_clusters(&summaries);
    assert!(runs.len() >= 2, "fixture should produce several runs");
    for pair in runs.windows(2) {
        assert_ne!(pair[0].class, pair[1].class);
    }
}

#[test]
fn unknown_outcomes_extend_gave_up_class_runs() {
    // Failed (Sent) then Unknown (GaveUp-class): the Unknown row must not
    // merge into the Sent run.
    let summaries = alternating_fixture();
    let runs = compute_clusters(&summaries);
    let sizes = runs.iter().map(|run| run.size).collect::<Vec<_>>();
    assert_eq!(sizes, vec![2, 3, 1, 1, 1]);
}

#[test]
fn run_bounds_come_from_first_event_times() {
    let summaries = alternating_fixture();
    let runs = compute_clusters(&summaries);
    assert_eq!(runs[0].start_unix_ms, 1_000);
    assert_eq!(runs[0].end_unix_ms, 2_000);
    assert_eq!(runs[1].start_unix_ms, 3_000);
    assert_eq!(runs[1].end_unix_ms, 5_000);
}

#[test]
fn outcome_summary_counts_align_with_run_partition() {
    let summaries = alternating_fixture();
    let rows = outcome_summary(&summaries);
    let counted: usize = rows.iter().map(|row| row.count).sum();
    assert_eq!(counted, summaries.len());
    let pct: f64 = rows.iter().map(|row| row.percentage).sum();
    assert!((pct - 100.0).abs() < 1e-9);
}

#[test]
fn gave_up_context_counts_only_exact_gave_up_rows() {
    let summaries = alternating_fixture();
    let stats = gave_up_context(&summaries);
    // Three consecutive GaveUp rows: one starts, one inside, one ends.
    assert_eq!(stats.starts_streak, 1);
    assert_eq!(stats.inside_streak, 1);
    assert_eq!(stats.ends_streak, 1);
    assert_eq!(stats.isolated, 0);
}
