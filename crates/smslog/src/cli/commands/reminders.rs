use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::aggregate::reminders::{DailyReminderRow, ReminderWindow, daily_reminder_summary};
use crate::config::RuntimePaths;
use crate::summarize::{build_artifact_layout, ensure_parent_dir, load_summaries};
use crate::utils::time::parse_clock_minutes;

pub const REMINDERS_REPORT_SCHEMA_VERSION: &str = "smslog.reminders-report.v1";

#[derive(Debug, Clone, Args)]
pub struct RemindersArgs {
    /// Daily window start, inclusive.
    #[arg(long, value_name = "HH:MM", default_value = "08:15")]
    pub window_start: String,

    /// Daily window end, exclusive.
    #[arg(long, value_name = "HH:MM", default_value = "08:30")]
    pub window_end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemindersReport {
    pub schema_version: String,
    pub window_start: String,
    pub window_end: String,
    pub days: Vec<DailyReminderRow>,
}

pub fn run(args: &RemindersArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let start_minutes =
        parse_clock_minutes(&args.window_start).context("invalid --window-start")?;
    let end_minutes = parse_clock_minutes(&args.window_end).context("invalid --window-end")?;
    let window = ReminderWindow::new(start_minutes, end_minutes)?;

    let layout = build_artifact_layout(&runtime_paths.out_dir);
    println!(
        "reminders: start window={}..{} summaries={}",
        args.window_start,
        args.window_end,
        layout.summaries_jsonl.display()
    );

    let mut summaries = load_summaries(&layout.summaries_jsonl)?;
    summaries.sort_by(|left, right| {
        left.first_time_unix_ms
            .cmp(&right.first_time_unix_ms)
            .then_with(|| left.message_id.cmp(&right.message_id))
    });

    let report = RemindersReport {
        schema_version: REMINDERS_REPORT_SCHEMA_VERSION.to_string(),
        window_start: args.window_start.clone(),
        window_end: args.window_end.clone(),
        days: daily_reminder_summary(&summaries, window),
    };

    println!("reminders: date       two_week one_week next_day birthday unknown problem");
    for day in &report.days {
        println!(
            "reminders: {} {:>8} {:>8} {:>8} {:>8} {:>7} {}",
            day.date,
            day.two_week,
            day.one_week,
            day.next_day,
            day.birthday,
            day.unknown,
            day.problem_day
        );
    }

    let report_path = runtime_paths.out_dir.join("reminders").join("report.json");
    write_report_artifact(&report_path, &report)?;
    println!(
        "reminders: checkpoint report_written {}",
        report_path.display()
    );
    let problem_days = report.days.iter().filter(|day| day.problem_day).count();
    println!(
        "reminders: complete days={} problem_days={}",
        report.days.len(),
        problem_days
    );

    Ok(())
}

fn write_report_artifact(path: &Path, report: &RemindersReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let encoded =
        serde_json::to_vec_pretty(report).context("failed to encode reminders report")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write reminders report: {}", path.display()))
}
