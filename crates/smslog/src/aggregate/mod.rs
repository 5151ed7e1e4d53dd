use std::collections::BTreeMap;

use serde::Serialize;

use crate::extract;
use crate::models::{EventKind, LogEvent, MessageSummary, Outcome};
use crate::utils::time::{format_date, format_wall_clock, wall_clock_date, wall_clock_hour};

pub mod clusters;
pub mod reminders;

pub const DEFAULT_TAIL_PERCENTILE: f64 = 95.0;
pub const MISSING_DELIVERY_SAMPLE_LIMIT: usize = 10;
pub const ISSUE_SAMPLE_LIMIT: usize = 5;

/// Fixed delivery-time buckets, upper bound inclusive, in seconds.
const HISTOGRAM_BUCKETS: [(f64, &str); 10] = [
    (1.0, "<1s"),
    (2.0, "1-2s"),
    (3.0, "2-3s"),
    (4.0, "3-4s"),
    (5.0, "4-5s"),
    (10.0, "5-10s"),
    (30.0, "10-30s"),
    (60.0, "30-60s"),
    (120.0, "1-2m"),
    (f64::INFINITY, ">2m"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Summary statistics over a sample set. Standard deviation is the sample
/// flavor (ddof = 1, zero for singleton sets); percentiles interpolate
/// linearly between order statistics.
#[must_use]
pub fn distribution_stats(samples: &[f64]) -> Option<DistributionStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std_dev = if count < 2 {
        0.0
    } else {
        let variance = sorted
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        variance.sqrt()
    };

    Some(DistributionStats {
        count,
        mean,
        median: percentile(&sorted, 50.0),
        min: sorted[0],
        max: sorted[count - 1],
        std_dev,
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
    })
}

/// Linear-interpolation percentile over an ascending-sorted sample set.
#[must_use]
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let clamped = pct.clamp(0.0, 100.0);
    let rank = clamped / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let fraction = rank - lower as f64;
    if lower + 1 >= sorted.len() {
        return sorted[sorted.len() - 1];
    }
    sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower])
}

#[must_use]
pub fn histogram(samples: &[f64]) -> Vec<HistogramBucket> {
    let total = samples.len();
    let mut lower = f64::NEG_INFINITY;
    let mut buckets = Vec::with_capacity(HISTOGRAM_BUCKETS.len());
    for (upper, label) in HISTOGRAM_BUCKETS {
        let count = samples
            .iter()
            .filter(|value| **value > lower && **value <= upper)
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            100.0 * count as f64 / total as f64
        };
        buckets.push(HistogramBucket {
            label: label.to_string(),
            count,
            percentage,
        });
        lower = upper;
    }
    buckets
}

/// One confirmed delivery with timing information, pulled from a
/// `DeliveryStatus` event whose details carry both a delivered marker and a
/// `Delivery Time` figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverySample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub seconds: f64,
    pub timestamp_unix_ms: u64,
    pub utc_offset_seconds: i32,
    pub source_file: String,
    pub line_number: usize,
}

#[must_use]
pub fn collect_delivery_samples(events: &[LogEvent]) -> Vec<DeliverySample> {
    events
        .iter()
        .filter(|event| event.kind == EventKind::DeliveryStatus)
        .filter_map(|event| {
            let fields = extract::extract_fields(&event.details);
            if fields.delivery_marker != Some(extract::DeliveryMarker::Delivered) {
                return None;
            }
            let seconds = fields.delivery_seconds?;
            Some(DeliverySample {
                message_id: event.message_id().map(ToString::to_string),
                phone_number: fields.phone_number,
                seconds,
                timestamp_unix_ms: event.timestamp_unix_ms,
                utc_offset_seconds: event.utc_offset_seconds,
                source_file: event.source_file.clone(),
                line_number: event.line_number,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TailBucket {
    pub tail_count: usize,
    pub total_count: usize,
    /// Share of this bucket's own total, not of the global total.
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatSlowPhone {
    pub phone_number: String,
    pub slow_count: usize,
    pub share_of_tail_pct: f64,
    pub avg_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailReport {
    pub percentile: f64,
    pub threshold_seconds: f64,
    pub tail_count: usize,
    pub total_count: usize,
    pub share_of_total_pct: f64,
    pub by_hour: BTreeMap<u8, TailBucket>,
    pub by_date: BTreeMap<String, TailBucket>,
    pub repeat_phones: Vec<RepeatSlowPhone>,
}

/// Slow-delivery analysis: samples at/above the configured percentile of the
/// delivery-time distribution, bucketed by wall-clock hour and calendar date
/// with per-bucket shares.
#[must_use]
pub fn tail_report(samples: &[DeliverySample], tail_percentile: f64) -> Option<TailReport> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.iter().map(|sample| sample.seconds).collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    let threshold = percentile(&sorted, tail_percentile);

    let tail = samples
        .iter()
        .filter(|sample| sample.seconds >= threshold)
        .collect::<Vec<_>>();

    let mut hour_totals = BTreeMap::<u8, usize>::new();
    let mut date_totals = BTreeMap::<String, usize>::new();
    for sample in samples {
        let hour = wall_clock_hour(sample.timestamp_unix_ms, sample.utc_offset_seconds);
        *hour_totals.entry(hour).or_default() += 1;
        let date = format_date(wall_clock_date(
            sample.timestamp_unix_ms,
            sample.utc_offset_seconds,
        ));
        *date_totals.entry(date).or_default() += 1;
    }

    let mut by_hour = BTreeMap::<u8, TailBucket>::new();
    let mut by_date = BTreeMap::<String, TailBucket>::new();
    let mut phone_counts = BTreeMap::<String, (usize, f64)>::new();
    for sample in &tail {
        let hour = wall_clock_hour(sample.timestamp_unix_ms, sample.utc_offset_seconds);
        let total = hour_totals.get(&hour).copied().unwrap_or_default();
        let bucket = by_hour.entry(hour).or_insert(TailBucket {
            tail_count: 0,
            total_count: total,
            share_pct: 0.0,
        });
        bucket.tail_count += 1;

        let date = format_date(wall_clock_date(
            sample.timestamp_unix_ms,
            sample.utc_offset_seconds,
        ));
        let total = date_totals.get(&date).copied().unwrap_or_default();
        let bucket = by_date.entry(date).or_insert(TailBucket {
            tail_count: 0,
            total_count: total,
            share_pct: 0.0,
        });
        bucket.tail_count += 1;

        let phone = sample
            .phone_number
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let entry = phone_counts.entry(phone).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += sample.seconds;
    }

    for bucket in by_hour.values_mut().chain(by_date.values_mut()) {
        if bucket.total_count > 0 {
            bucket.share_pct = 100.0 * bucket.tail_count as f64 / bucket.total_count as f64;
        }
    }

    let mut repeat_phones = phone_counts
        .into_iter()
        .filter(|(_, (count, _))| *count > 1)
        .map(|(phone_number, (count, sum))| RepeatSlowPhone {
            phone_number,
            slow_count: count,
            share_of_tail_pct: 100.0 * count as f64 / tail.len() as f64,
            avg_seconds: sum / count as f64,
        })
        .collect::<Vec<_>>();
    repeat_phones.sort_by(|left, right| {
        right
            .slow_count
            .cmp(&left.slow_count)
            .then_with(|| left.phone_number.cmp(&right.phone_number))
    });

    Some(TailReport {
        percentile: tail_percentile,
        threshold_seconds: threshold,
        tail_count: tail.len(),
        total_count: samples.len(),
        share_of_total_pct: 100.0 * tail.len() as f64 / samples.len() as f64,
        by_hour,
        by_date,
        repeat_phones,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingDeliverySample {
    pub message_id: String,
    pub first_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub source_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingDeliveryReport {
    pub sent_count: usize,
    pub delivered_count: usize,
    pub missing_count: usize,
    /// Exactly `100 * missing / sent`; zero when nothing was sent.
    pub missing_pct: f64,
    pub sample: Vec<MissingDeliverySample>,
}

/// Messages with send-success evidence whose lifecycle never reached a
/// delivered outcome. Expects summaries in first-time order; the sample keeps
/// the first `MISSING_DELIVERY_SAMPLE_LIMIT` of them.
#[must_use]
pub fn missing_delivery_report(summaries: &[MessageSummary]) -> MissingDeliveryReport {
    let sent = summaries
        .iter()
        .filter(|summary| summary.has_send_success)
        .collect::<Vec<_>>();
    let sent_count = sent.len();
    let delivered_count = sent
        .iter()
        .filter(|summary| summary.outcome == Outcome::Delivered)
        .count();

    let missing = sent
        .iter()
        .filter(|summary| summary.outcome != Outcome::Delivered)
        .collect::<Vec<_>>();
    let missing_pct = if sent_count == 0 {
        0.0
    } else {
        100.0 * missing.len() as f64 / sent_count as f64
    };

    MissingDeliveryReport {
        sent_count,
        delivered_count,
        missing_count: missing.len(),
        missing_pct,
        sample: missing
            .iter()
            .take(MISSING_DELIVERY_SAMPLE_LIMIT)
            .map(|summary| MissingDeliverySample {
                message_id: summary.message_id.clone(),
                first_time: summary.first_time.clone(),
                phone_number: summary.phone_number.clone(),
                source_file: summary.source_file.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueClass {
    Timeout,
    Error,
}

/// Mirror of the gateway triage rules: confirmed-delivery status lines are
/// consumed by the delivery branch and never counted as issues; a line is a
/// timeout or an error, not both.
#[must_use]
pub fn issue_class(event: &LogEvent) -> Option<IssueClass> {
    if event.kind == EventKind::DeliveryStatus && event.details.contains("Status: Delivered") {
        return None;
    }

    let details_lower = event.details.to_lowercase();
    if details_lower.contains("timeout") || event.event_type_raw.contains("Timeout") {
        return Some(IssueClass::Timeout);
    }

    if event.level.as_deref() == Some("ERROR")
        || details_lower.contains("error")
        || details_lower.contains("failed")
        || event.event_type_raw.to_lowercase().contains("fail")
    {
        return Some(IssueClass::Error);
    }

    None
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDigest {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub details: String,
    pub source_file: String,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeoutReport {
    pub total: usize,
    pub by_provider: BTreeMap<String, usize>,
    pub by_hour: BTreeMap<u8, usize>,
    pub by_date: BTreeMap<String, usize>,
    pub sample: Vec<EventDigest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub total: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_provider: BTreeMap<String, usize>,
    pub by_event_type: BTreeMap<String, usize>,
    pub by_hour: BTreeMap<u8, usize>,
    pub sample: Vec<EventDigest>,
}

fn digest(event: &LogEvent) -> EventDigest {
    EventDigest {
        timestamp: format_wall_clock(event.timestamp_unix_ms, event.utc_offset_seconds),
        level: event.level.clone(),
        event_type: event.event_type_raw.clone(),
        provider: event.provider.clone(),
        details: event.details.clone(),
        source_file: event.source_file.clone(),
        line_number: event.line_number,
    }
}

fn provider_key(event: &LogEvent) -> String {
    event
        .provider
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

#[must_use]
pub fn timeout_report(events: &[LogEvent]) -> TimeoutReport {
    let mut report = TimeoutReport {
        total: 0,
        by_provider: BTreeMap::new(),
        by_hour: BTreeMap::new(),
        by_date: BTreeMap::new(),
        sample: Vec::new(),
    };

    for event in events {
        if issue_class(event) != Some(IssueClass::Timeout) {
            continue;
        }
        report.total += 1;
        *report.by_provider.entry(provider_key(event)).or_default() += 1;
        let hour = wall_clock_hour(event.timestamp_unix_ms, event.utc_offset_seconds);
        *report.by_hour.entry(hour).or_default() += 1;
        let date = format_date(wall_clock_date(
            event.timestamp_unix_ms,
            event.utc_offset_seconds,
        ));
        *report.by_date.entry(date).or_default() += 1;
        if report.sample.len() < ISSUE_SAMPLE_LIMIT {
            report.sample.push(digest(event));
        }
    }

    report
}

#[must_use]
pub fn error_report(events: &[LogEvent]) -> ErrorReport {
    let mut report = ErrorReport {
        total: 0,
        by_level: BTreeMap::new(),
        by_provider: BTreeMap::new(),
        by_event_type: BTreeMap::new(),
        by_hour: BTreeMap::new(),
        sample: Vec::new(),
    };

    for event in events {
        if issue_class(event) != Some(IssueClass::Error) {
            continue;
        }
        report.total += 1;
        let level = event
            .level
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *report.by_level.entry(level).or_default() += 1;
        *report.by_provider.entry(provider_key(event)).or_default() += 1;
        *report
            .by_event_type
            .entry(event.event_type_raw.clone())
            .or_default() += 1;
        let hour = wall_clock_hour(event.timestamp_unix_ms, event.utc_offset_seconds);
        *report.by_hour.entry(hour).or_default() += 1;
        if report.sample.len() < ISSUE_SAMPLE_LIMIT {
            report.sample.push(digest(event));
        }
    }

    report
}
