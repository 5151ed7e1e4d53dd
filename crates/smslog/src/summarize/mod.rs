use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use time::Date;

use crate::classify::build_summaries;
use crate::correlate::correlate_events;
use crate::discovery::{GatewayLogFile, discover_log_files};
use crate::models::{LogEvent, MessageSummary};
use crate::parser::{FileParseStats, parse_file_contents};
use crate::utils::time::format_date;

pub const SUMMARIZE_REPORT_SCHEMA_VERSION: &str = "smslog.summarize-report.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizeRunStatus {
    Success,
    Failed,
}

impl SummarizeRunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizePlan {
    pub log_dir: PathBuf,
    pub cutoff_date: Option<Date>,
    pub fail_fast: bool,
}

/// Everything one batch pass produces. `events` keeps the accepted events in
/// canonical stream order for report stages that read raw events (delivery
/// samples, timeout and error tallies).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub files: Vec<GatewayLogFile>,
    pub events: Vec<LogEvent>,
    pub summaries: Vec<MessageSummary>,
    pub file_stats: Vec<FileParseStats>,
}

/// One full batch pass: discover files, parse each line, run the correlation
/// state machine over the canonical order, classify lifecycles.
///
/// The correlation pass is strictly sequential over one fixed global order
/// (file name, then line number); parse results are folded per file and
/// concatenated in discovery order before correlation runs.
pub fn run_pipeline(plan: &SummarizePlan) -> Result<PipelineOutcome> {
    let files = discover_log_files(&plan.log_dir, plan.cutoff_date)?;
    if files.is_empty() {
        return Err(anyhow!(
            "no gateway log files found in {}",
            plan.log_dir.display()
        ));
    }

    let mut events = Vec::new();
    let mut file_stats = Vec::new();
    for file in &files {
        let input = std::fs::read_to_string(&file.path)
            .with_context(|| format!("failed to read log file: {}", file.path.display()))?;
        let (file_events, stats) = parse_file_contents(&input, &file.file_name);

        if plan.fail_fast
            && let Some(reject) = stats.rejects.first()
        {
            return Err(anyhow!(
                "rejected line {} in {}: {}",
                reject.line_number,
                file.file_name,
                reject.detail
            ));
        }

        events.extend(file_events);
        file_stats.push(stats);
    }

    let groups = correlate_events(events.iter().cloned());
    let summaries = build_summaries(groups)?;

    Ok(PipelineOutcome {
        files,
        events,
        summaries,
        file_stats,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeArtifactLayout {
    pub summaries_jsonl: PathBuf,
    pub schema_json: PathBuf,
    pub report_json: PathBuf,
    pub sqlite_path: PathBuf,
}

#[must_use]
pub fn build_artifact_layout(out_dir: &Path) -> SummarizeArtifactLayout {
    SummarizeArtifactLayout {
        summaries_jsonl: out_dir.join("summaries.jsonl"),
        schema_json: out_dir.join("schema.json"),
        report_json: out_dir.join("summarize").join("report.json"),
        sqlite_path: out_dir.join("mart.sqlite"),
    }
}

pub fn write_summaries_artifact(path: &Path, summaries: &[MessageSummary]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut body = String::new();
    for summary in summaries {
        let line =
            serde_json::to_string(summary).context("failed to encode summary jsonl row")?;
        body.push_str(&line);
        body.push('\n');
    }
    std::fs::write(path, body)
        .with_context(|| format!("failed to write summaries artifact: {}", path.display()))
}

pub fn write_schema_artifact(path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let schema = crate::models::json_schema();
    let encoded =
        serde_json::to_vec_pretty(&schema).context("failed to encode summary schema")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write schema artifact: {}", path.display()))
}

/// Load a summaries artifact back. Strict: this is our own output format, so
/// an invalid row is an error, not a warning.
pub fn load_summaries(path: &Path) -> Result<Vec<MessageSummary>> {
    let input = std::fs::read_to_string(path).with_context(|| {
        format!(
            "failed to read summaries artifact (run `smslog summarize` first): {}",
            path.display()
        )
    })?;

    let mut summaries = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let summary = serde_json::from_str::<MessageSummary>(trimmed).with_context(|| {
            format!("invalid summaries jsonl row at line {line_number}")
        })?;
        summaries.push(summary);
    }
    Ok(summaries)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReportRow {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_date: Option<String>,
    pub lines_read: usize,
    pub events_parsed: usize,
    pub lines_rejected: usize,
    pub reject_reasons: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarizeTotals {
    pub files_processed: usize,
    pub lines_read: usize,
    pub events_parsed: usize,
    pub lines_rejected: usize,
    pub summaries_written: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizeReport {
    pub schema_version: String,
    pub run_id: String,
    pub log_dir: String,
    pub status: SummarizeRunStatus,
    pub started_at_utc: String,
    pub finished_at_utc: String,
    pub duration_ms: u64,
    pub totals: SummarizeTotals,
    pub files: Vec<FileReportRow>,
    pub outcome_counts: BTreeMap<String, usize>,
}

#[must_use]
pub fn build_file_report_rows(outcome: &PipelineOutcome) -> Vec<FileReportRow> {
    outcome
        .files
        .iter()
        .zip(&outcome.file_stats)
        .map(|(file, stats)| {
            let mut reject_reasons = BTreeMap::new();
            for reject in &stats.rejects {
                *reject_reasons
                    .entry(reject.reason.as_str().to_string())
                    .or_default() += 1;
            }
            FileReportRow {
                file_name: file.file_name.clone(),
                log_date: file.log_date.map(format_date),
                lines_read: stats.lines_read,
                events_parsed: stats.events_parsed,
                lines_rejected: stats.rejects.len(),
                reject_reasons,
            }
        })
        .collect()
}

#[must_use]
pub fn build_totals(outcome: &PipelineOutcome) -> SummarizeTotals {
    SummarizeTotals {
        files_processed: outcome.files.len(),
        lines_read: outcome.file_stats.iter().map(|stats| stats.lines_read).sum(),
        events_parsed: outcome
            .file_stats
            .iter()
            .map(|stats| stats.events_parsed)
            .sum(),
        lines_rejected: outcome
            .file_stats
            .iter()
            .map(|stats| stats.rejects.len())
            .sum(),
        summaries_written: outcome.summaries.len(),
    }
}

#[must_use]
pub fn build_outcome_counts(summaries: &[MessageSummary]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for summary in summaries {
        *counts
            .entry(summary.outcome.as_str().to_string())
            .or_default() += 1;
    }
    counts
}

pub fn write_report_artifact(path: &Path, report: &SummarizeReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let encoded =
        serde_json::to_vec_pretty(report).context("failed to encode summarize report")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write summarize report: {}", path.display()))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create artifact directory: {}", parent.display())
        })?;
    }
    Ok(())
}

#[must_use]
pub fn build_run_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos() as u64);
    format!("summarize-{nanos:016x}")
}
