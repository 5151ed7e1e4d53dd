use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use crate::parser::parse_file_contents;

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    #[arg(value_name = "PATH")]
    pub target: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectLineCounts {
    pub total_lines: usize,
    pub events_parsed: usize,
    pub lines_rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub target_path: String,
    pub file_size_bytes: u64,
    pub line_counts: InspectLineCounts,
    pub event_type_counts: BTreeMap<String, usize>,
    pub reject_reasons: BTreeMap<String, usize>,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let report = inspect_target(&args.target)?;
    if args.json {
        let encoded =
            serde_json::to_string_pretty(&report).context("failed to encode inspect report")?;
        println!("{encoded}");
    } else {
        println!("{}", render_text_report(&report));
    }
    Ok(())
}

pub fn inspect_target(path: &Path) -> Result<InspectReport> {
    if !path.exists() {
        bail!("inspect target does not exist: {}", path.display());
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat file: {}", path.display()))?;
    if !metadata.is_file() {
        bail!("inspect target must be a file: {}", path.display());
    }

    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or_default();
    let (events, stats) = parse_file_contents(&input, file_name);

    let mut event_type_counts = BTreeMap::new();
    for event in &events {
        let key = if event.event_type_raw.is_empty() {
            "unknown".to_string()
        } else {
            event.event_type_raw.clone()
        };
        *event_type_counts.entry(key).or_default() += 1;
    }

    let mut reject_reasons = BTreeMap::new();
    for reject in &stats.rejects {
        *reject_reasons
            .entry(reject.reason.as_str().to_string())
            .or_default() += 1;
    }

    Ok(InspectReport {
        target_path: path.to_string_lossy().to_string(),
        file_size_bytes: metadata.len(),
        line_counts: InspectLineCounts {
            total_lines: stats.lines_read,
            events_parsed: stats.events_parsed,
            lines_rejected: stats.rejects.len(),
        },
        event_type_counts,
        reject_reasons,
    })
}

#[must_use]
pub fn render_text_report(report: &InspectReport) -> String {
    let mut lines = vec![
        format!("target_path: {}", report.target_path),
        format!("file_size_bytes: {}", report.file_size_bytes),
        format!("line_counts.total_lines: {}", report.line_counts.total_lines),
        format!(
            "line_counts.events_parsed: {}",
            report.line_counts.events_parsed
        ),
        format!(
            "line_counts.lines_rejected: {}",
            report.line_counts.lines_rejected
        ),
    ];

    for (event_type, count) in &report.event_type_counts {
        lines.push(format!("event_type_counts.{event_type}: {count}"));
    }
    for (reason, count) in &report.reject_reasons {
        lines.push(format!("reject_reasons.{reason}: {count}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{inspect_target, render_text_report};

    fn temp_file(label: &str, body: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("smslog-{label}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let path = dir.join("SMS_Log_20250327.log");
        std::fs::write(&path, body).expect("fixture file should be writable");
        path
    }

    #[test]
    fn inspect_counts_event_types_and_rejects() {
        let body = concat!(
            r#"{"Timestamp":"2025-03-27T08:15:00+13:00","EventType":"SendAttempt"}"#,
            "\n",
            r#"{"Timestamp":"2025-03-27T08:15:01+13:00","EventType":"SendSuccess","MessageId":"M1"}"#,
            "\n",
            "{broken\n",
        );
        let path = temp_file("inspect", body);
        let report = inspect_target(&path).expect("inspect should succeed");

        assert_eq!(report.line_counts.total_lines, 3);
        assert_eq!(report.line_counts.events_parsed, 2);
        assert_eq!(report.line_counts.lines_rejected, 1);
        assert_eq!(report.event_type_counts.get("SendAttempt"), Some(&1));
        assert_eq!(report.event_type_counts.get("SendSuccess"), Some(&1));
        assert_eq!(report.reject_reasons.get("invalid_json"), Some(&1));

        let text = render_text_report(&report);
        assert!(text.contains("line_counts.total_lines: 3"));
        assert!(text.contains("event_type_counts.SendAttempt: 1"));
    }

    #[test]
    fn inspect_rejects_missing_targets() {
        let error = inspect_target(std::path::Path::new("/nonexistent/smslog-inspect"))
            .expect_err("missing target should fail");
        assert!(format!("{error:#}").contains("does not exist"));
    }
}
