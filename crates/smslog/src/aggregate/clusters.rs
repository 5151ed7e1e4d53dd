use serde::Serialize;

use crate::models::{MessageSummary, Outcome, OutcomeClass};
use crate::utils::time::format_wall_clock_seconds;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeSummaryRow {
    pub outcome: Outcome,
    pub count: usize,
    pub percentage: f64,
}

/// Outcome counts and percentages, in fixed outcome order.
#[must_use]
pub fn outcome_summary(summaries: &[MessageSummary]) -> Vec<OutcomeSummaryRow> {
    let total = summaries.len();
    [
        Outcome::Delivered,
        Outcome::Failed,
        Outcome::GaveUp,
        Outcome::Unknown,
    ]
    .into_iter()
    .map(|outcome| {
        let count = summaries
            .iter()
            .filter(|summary| summary.outcome == outcome)
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            100.0 * count as f64 / total as f64
        };
        OutcomeSummaryRow {
            outcome,
            count,
            percentage,
        }
    })
    .collect()
}

/// One maximal run of consecutive lifecycles sharing a binarized class,
/// in first-event-time order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRun {
    pub class: OutcomeClass,
    pub size: usize,
    pub avg_duration_seconds: f64,
    pub start_time: String,
    pub end_time: String,
    pub start_unix_ms: u64,
    pub end_unix_ms: u64,
}

/// Run-length encode the binarized outcome sequence in a single linear scan.
/// Expects summaries already sorted by first time. Run sizes sum to the
/// input length and adjacent runs never share a class.
#[must_use]
pub fn compute_clusters(summaries: &[MessageSummary]) -> Vec<ClusterRun> {
    let mut runs = Vec::new();
    let mut current: Option<(OutcomeClass, Vec<&MessageSummary>)> = None;

    for summary in summaries {
        let class = summary.outcome.class();
        if let Some((current_class, members)) = current.as_mut()
            && *current_class == class
        {
            members.push(summary);
            continue;
        }

        if let Some((finished_class, members)) = current.take() {
            runs.push(finish_run(finished_class, &members));
        }
        current = Some((class, vec![summary]));
    }

    if let Some((class, members)) = current {
        runs.push(finish_run(class, &members));
    }
    runs
}

fn finish_run(class: OutcomeClass, members: &[&MessageSummary]) -> ClusterRun {
    let first = members.first().expect("runs are never empty");
    let last = members.last().expect("runs are never empty");
    let avg_duration_seconds = members
        .iter()
        .map(|summary| summary.duration_seconds)
        .sum::<f64>()
        / members.len() as f64;

    ClusterRun {
        class,
        size: members.len(),
        avg_duration_seconds,
        start_time: format_wall_clock_seconds(first.first_time_unix_ms, first.utc_offset_seconds),
        end_time: format_wall_clock_seconds(last.first_time_unix_ms, last.utc_offset_seconds),
        start_unix_ms: first.first_time_unix_ms,
        end_unix_ms: last.first_time_unix_ms,
    }
}

/// Where each gave-up lifecycle sits relative to its neighbors in the
/// first-time ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GaveUpContextStats {
    pub inside_streak: usize,
    pub starts_streak: usize,
    pub ends_streak: usize,
    pub isolated: usize,
}

#[must_use]
pub fn gave_up_context(summaries: &[MessageSummary]) -> GaveUpContextStats {
    let mut stats = GaveUpContextStats::default();

    for (index, summary) in summaries.iter().enumerate() {
        if summary.outcome != Outcome::GaveUp {
            continue;
        }
        let previous_gave_up = index
            .checked_sub(1)
            .map(|prev| summaries[prev].outcome == Outcome::GaveUp)
            .unwrap_or(false);
        let next_gave_up = summaries
            .get(index + 1)
            .map(|next| next.outcome == Outcome::GaveUp)
            .unwrap_or(false);

        match (previous_gave_up, next_gave_up) {
            (true, true) => stats.inside_streak += 1,
            (false, true) => stats.starts_streak += 1,
            (true, false) => stats.ends_streak += 1,
            (false, false) => stats.isolated += 1,
        }
    }

    stats
}
