use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use crate::aggregate::{
    DEFAULT_TAIL_PERCENTILE, DistributionStats, ErrorReport, HistogramBucket,
    MissingDeliveryReport, TailReport, TimeoutReport, collect_delivery_samples,
    distribution_stats, error_report, histogram, missing_delivery_report, tail_report,
    timeout_report,
};
use crate::config::{RuntimePaths, resolve_user_path};
use crate::summarize::{
    FileReportRow, SummarizePlan, build_file_report_rows, ensure_parent_dir, run_pipeline,
};
use crate::utils::time::parse_iso_date;

pub const ANALYZE_REPORT_SCHEMA_VERSION: &str = "smslog.analyze-report.v1";

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[arg(long, value_name = "PATH")]
    pub log_dir: Option<PathBuf>,

    /// Only process files whose encoded date is at/after this date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub cutoff_date: Option<String>,

    /// Percentile threshold for the slow-delivery tail.
    #[arg(long, default_value_t = DEFAULT_TAIL_PERCENTILE)]
    pub tail_percentile: f64,
}

/// The analyze report is pure data derived from the input files, so
/// re-running over unchanged input yields a byte-identical artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeReport {
    pub schema_version: String,
    pub tail_percentile: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time_stats: Option<DistributionStats>,
    pub delivery_time_histogram: Vec<HistogramBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_stats: Option<DistributionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<TailReport>,
    pub missing_deliveries: MissingDeliveryReport,
    pub timeouts: TimeoutReport,
    pub errors: ErrorReport,
    pub files: Vec<FileReportRow>,
}

pub fn run(args: &AnalyzeArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    if !(0.0..=100.0).contains(&args.tail_percentile) {
        bail!(
            "--tail-percentile must be between 0 and 100, got {}",
            args.tail_percentile
        );
    }

    let log_dir = match &args.log_dir {
        Some(path) => resolve_user_path(path, &runtime_paths.home_dir, &runtime_paths.cwd)?,
        None => runtime_paths.cwd.clone(),
    };
    let cutoff_date = args
        .cutoff_date
        .as_deref()
        .map(parse_iso_date)
        .transpose()
        .context("invalid --cutoff-date")?;

    println!(
        "analyze: start log_dir={} tail_percentile={} out_dir={}",
        log_dir.display(),
        args.tail_percentile,
        runtime_paths.out_dir.display()
    );

    println!("analyze: stage pipeline");
    let plan = SummarizePlan {
        log_dir,
        cutoff_date,
        fail_fast: false,
    };
    let outcome = run_pipeline(&plan)?;

    println!("analyze: stage aggregate");
    let samples = collect_delivery_samples(&outcome.events);
    let seconds = samples
        .iter()
        .map(|sample| sample.seconds)
        .collect::<Vec<_>>();
    let durations = outcome
        .summaries
        .iter()
        .map(|summary| summary.duration_seconds)
        .collect::<Vec<_>>();

    let report = AnalyzeReport {
        schema_version: ANALYZE_REPORT_SCHEMA_VERSION.to_string(),
        tail_percentile: args.tail_percentile,
        delivery_time_stats: distribution_stats(&seconds),
        delivery_time_histogram: histogram(&seconds),
        duration_stats: distribution_stats(&durations),
        tail: tail_report(&samples, args.tail_percentile),
        missing_deliveries: missing_delivery_report(&outcome.summaries),
        timeouts: timeout_report(&outcome.events),
        errors: error_report(&outcome.events),
        files: build_file_report_rows(&outcome),
    };
    print_report(&report);

    let report_path = runtime_paths.out_dir.join("analyze").join("report.json");
    write_report_artifact(&report_path, &report)?;
    println!("analyze: checkpoint report_written {}", report_path.display());
    println!(
        "analyze: complete deliveries={} missing={} timeouts={} errors={}",
        seconds.len(),
        report.missing_deliveries.missing_count,
        report.timeouts.total,
        report.errors.total
    );

    Ok(())
}

fn print_report(report: &AnalyzeReport) {
    if let Some(stats) = &report.delivery_time_stats {
        println!(
            "analyze: delivery_time count={} mean={:.2} median={:.2} min={:.2} max={:.2} std_dev={:.2} p95={:.2} p99={:.2}",
            stats.count,
            stats.mean,
            stats.median,
            stats.min,
            stats.max,
            stats.std_dev,
            stats.p95,
            stats.p99
        );
        for bucket in &report.delivery_time_histogram {
            println!(
                "analyze: bucket {:>6} count={} share={:.2}%",
                bucket.label, bucket.count, bucket.percentage
            );
        }
    } else {
        println!("analyze: delivery_time no timed delivery records found");
    }

    if let Some(tail) = &report.tail {
        println!(
            "analyze: tail threshold={:.2}s slow={} of {} ({:.2}%)",
            tail.threshold_seconds, tail.tail_count, tail.total_count, tail.share_of_total_pct
        );
        for (hour, bucket) in &tail.by_hour {
            println!(
                "analyze: tail_hour hour={hour:02} slow={} of {} ({:.2}%)",
                bucket.tail_count, bucket.total_count, bucket.share_pct
            );
        }
        for (date, bucket) in &tail.by_date {
            println!(
                "analyze: tail_date date={date} slow={} of {} ({:.2}%)",
                bucket.tail_count, bucket.total_count, bucket.share_pct
            );
        }
        for phone in &tail.repeat_phones {
            println!(
                "analyze: tail_phone phone={} slow={} share={:.2}% avg={:.2}s",
                phone.phone_number, phone.slow_count, phone.share_of_tail_pct, phone.avg_seconds
            );
        }
    }

    let missing = &report.missing_deliveries;
    println!(
        "analyze: missing sent={} delivered={} missing={} ({:.2}% of sent)",
        missing.sent_count, missing.delivered_count, missing.missing_count, missing.missing_pct
    );
    for sample in &missing.sample {
        println!(
            "analyze: missing_sample id={} first_time={} phone={} file={}",
            sample.message_id,
            sample.first_time,
            sample.phone_number.as_deref().unwrap_or("unknown"),
            sample.source_file
        );
    }

    println!("analyze: timeouts total={}", report.timeouts.total);
    for (provider, count) in &report.timeouts.by_provider {
        println!("analyze: timeout_provider provider={provider} count={count}");
    }
    println!("analyze: errors total={}", report.errors.total);
    for (level, count) in &report.errors.by_level {
        println!("analyze: error_level level={level} count={count}");
    }
}

fn write_report_artifact(path: &Path, report: &AnalyzeReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let encoded = serde_json::to_vec_pretty(report).context("failed to encode analyze report")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write analyze report: {}", path.display()))
}
