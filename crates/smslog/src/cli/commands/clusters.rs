use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::aggregate::clusters::{
    ClusterRun, GaveUpContextStats, OutcomeSummaryRow, compute_clusters, gave_up_context,
    outcome_summary,
};
use crate::config::RuntimePaths;
use crate::summarize::{build_artifact_layout, ensure_parent_dir, load_summaries};

pub const CLUSTERS_REPORT_SCHEMA_VERSION: &str = "smslog.clusters-report.v1";

#[derive(Debug, Clone, Args)]
pub struct ClustersArgs {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClustersReport {
    pub schema_version: String,
    pub total_messages: usize,
    pub outcome_summary: Vec<OutcomeSummaryRow>,
    pub clusters: Vec<ClusterRun>,
    pub gave_up_context: GaveUpContextStats,
}

pub fn run(_args: &ClustersArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let layout = build_artifact_layout(&runtime_paths.out_dir);
    println!(
        "clusters: start summaries={}",
        layout.summaries_jsonl.display()
    );

    let mut summaries = load_summaries(&layout.summaries_jsonl)?;
    summaries.sort_by(|left, right| {
        left.first_time_unix_ms
            .cmp(&right.first_time_unix_ms)
            .then_with(|| left.message_id.cmp(&right.message_id))
    });

    let report = ClustersReport {
        schema_version: CLUSTERS_REPORT_SCHEMA_VERSION.to_string(),
        total_messages: summaries.len(),
        outcome_summary: outcome_summary(&summaries),
        clusters: compute_clusters(&summaries),
        gave_up_context: gave_up_context(&summaries),
    };

    for row in &report.outcome_summary {
        println!(
            "clusters: outcome {}={} ({:.2}%)",
            row.outcome.as_str(),
            row.count,
            row.percentage
        );
    }
    for (index, run) in report.clusters.iter().enumerate() {
        println!(
            "clusters: run index={} class={} size={} avg_duration={:.2}s start={} end={}",
            index,
            run.class.as_str(),
            run.size,
            run.avg_duration_seconds,
            run.start_time,
            run.end_time
        );
    }
    let context = &report.gave_up_context;
    println!(
        "clusters: gave_up_context inside={} starts={} ends={} isolated={}",
        context.inside_streak, context.starts_streak, context.ends_streak, context.isolated
    );

    let report_path = runtime_paths.out_dir.join("clusters").join("report.json");
    write_report_artifact(&report_path, &report)?;
    println!(
        "clusters: checkpoint report_written {}",
        report_path.display()
    );
    println!(
        "clusters: complete messages={} runs={}",
        report.total_messages,
        report.clusters.len()
    );

    Ok(())
}

fn write_report_artifact(path: &Path, report: &ClustersReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let encoded = serde_json::to_vec_pretty(report).context("failed to encode clusters report")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write clusters report: {}", path.display()))
}
