use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::config::{RuntimePaths, resolve_user_path};
use crate::sqlite::{
    SqliteWriterConfig, ensure_sqlite_schema, finalize_summary_run, insert_summary_run_started,
    open_sqlite_connection, write_summaries_batched,
};
use crate::summarize::{
    SUMMARIZE_REPORT_SCHEMA_VERSION, SummarizePlan, SummarizeReport, SummarizeRunStatus,
    build_artifact_layout, build_file_report_rows, build_outcome_counts, build_run_id,
    build_totals, run_pipeline, write_report_artifact, write_schema_artifact,
    write_summaries_artifact,
};
use crate::utils::time::{now_utc_rfc3339, parse_iso_date};

#[derive(Debug, Clone, Args)]
pub struct SummarizeArgs {
    #[arg(long, value_name = "PATH")]
    pub log_dir: Option<PathBuf>,

    /// Only process files whose encoded date is at/after this date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub cutoff_date: Option<String>,

    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,
}

pub fn run(args: &SummarizeArgs, runtime_paths: &RuntimePaths) -> Result<()> {
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

    let plan = SummarizePlan {
        log_dir: log_dir.clone(),
        cutoff_date,
        fail_fast: args.fail_fast,
    };
    let run_id = build_run_id();
    let started_at_utc = now_utc_rfc3339()?;
    let started_at = std::time::Instant::now();

    println!(
        "summarize: start log_dir={} cutoff_date={} fail_fast={} out_dir={}",
        log_dir.display(),
        args.cutoff_date.as_deref().unwrap_or("none"),
        args.fail_fast,
        runtime_paths.out_dir.display()
    );

    println!("summarize: stage pipeline");
    let outcome = run_pipeline(&plan)?;
    for (file, stats) in outcome.files.iter().zip(&outcome.file_stats) {
        println!(
            "summarize: file name={} lines_read={} events_parsed={} lines_rejected={}",
            file.file_name,
            stats.lines_read,
            stats.events_parsed,
            stats.rejects.len()
        );
    }

    println!("summarize: stage write_artifacts");
    let layout = build_artifact_layout(&runtime_paths.out_dir);
    write_summaries_artifact(&layout.summaries_jsonl, &outcome.summaries)?;
    println!(
        "summarize: checkpoint summaries_written {}",
        layout.summaries_jsonl.display()
    );
    write_schema_artifact(&layout.schema_json)?;
    println!(
        "summarize: checkpoint schema_written {}",
        layout.schema_json.display()
    );

    println!("summarize: stage write_mart");
    let mut connection = open_sqlite_connection(&layout.sqlite_path)?;
    ensure_sqlite_schema(&connection)?;
    insert_summary_run_started(
        &connection,
        &run_id,
        &started_at_utc,
        &log_dir.to_string_lossy(),
    )?;
    let totals = build_totals(&outcome);
    let write_result = write_summaries_batched(
        &mut connection,
        &outcome.summaries,
        SqliteWriterConfig::default(),
    );
    let finished_at_utc = now_utc_rfc3339()?;
    match &write_result {
        Ok(write_stats) => {
            finalize_summary_run(
                &connection,
                &run_id,
                SummarizeRunStatus::Success.as_str(),
                &finished_at_utc,
                totals.files_processed,
                totals.events_parsed,
                totals.lines_rejected,
                write_stats.records_written,
                "{}",
            )?;
        }
        Err(error) => {
            let error_summary = json!({ "message": format!("{error:#}") }).to_string();
            let _ = finalize_summary_run(
                &connection,
                &run_id,
                SummarizeRunStatus::Failed.as_str(),
                &finished_at_utc,
                totals.files_processed,
                totals.events_parsed,
                totals.lines_rejected,
                0,
                &error_summary,
            );
        }
    }
    let write_stats = write_result.context("failed to write summaries to sqlite mart")?;
    println!(
        "summarize: checkpoint mart_written {} rows={} batches={}",
        layout.sqlite_path.display(),
        write_stats.records_written,
        write_stats.batches_committed
    );

    let report = SummarizeReport {
        schema_version: SUMMARIZE_REPORT_SCHEMA_VERSION.to_string(),
        run_id,
        log_dir: log_dir.to_string_lossy().to_string(),
        status: SummarizeRunStatus::Success,
        started_at_utc,
        finished_at_utc,
        duration_ms: started_at.elapsed().as_millis() as u64,
        totals,
        files: build_file_report_rows(&outcome),
        outcome_counts: build_outcome_counts(&outcome.summaries),
    };
    write_report_artifact(&layout.report_json, &report)?;
    println!(
        "summarize: checkpoint report_written {}",
        layout.report_json.display()
    );

    println!(
        "summarize: complete files={} events={} rejected={} summaries={}",
        report.totals.files_processed,
        report.totals.events_parsed,
        report.totals.lines_rejected,
        report.totals.summaries_written
    );
    println!("summarize: next `smslog clusters` or `smslog reminders`");

    Ok(())
}
