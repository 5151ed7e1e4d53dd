use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};

use crate::models::MessageSummary;

pub const SQLITE_SCHEMA_VERSION: &str = "smslog.summary.v1.sqlite.v1";
pub const SUMMARIES_TABLE: &str = "message_summaries";
pub const SUMMARY_RUNS_TABLE: &str = "summary_runs";
pub const SCHEMA_META_TABLE: &str = "smslog_schema_meta";
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;

const CREATE_SUMMARIES_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS message_summaries (
    schema_version TEXT NOT NULL,
    message_id TEXT NOT NULL PRIMARY KEY,
    first_time TEXT NOT NULL,
    last_time TEXT NOT NULL,
    first_time_unix_ms INTEGER NOT NULL,
    last_time_unix_ms INTEGER NOT NULL,
    utc_offset_seconds INTEGER NOT NULL,
    duration_seconds REAL NOT NULL,
    phone_number TEXT,
    message TEXT,
    outcome TEXT NOT NULL,
    has_send_success INTEGER NOT NULL,
    events_count INTEGER NOT NULL,
    source_file TEXT NOT NULL,
    CHECK (schema_version = 'smslog.summary.v1'),
    CHECK (outcome IN ('delivered', 'failed', 'gave_up', 'unknown')),
    CHECK (has_send_success IN (0, 1)),
    CHECK (duration_seconds >= 0),
    CHECK (last_time_unix_ms >= first_time_unix_ms)
);
"#;

const CREATE_INDEX_FIRST_TIME_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_message_summaries_first_time
ON message_summaries (first_time_unix_ms, message_id);
"#;

const CREATE_INDEX_OUTCOME_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_message_summaries_outcome
ON message_summaries (outcome, first_time_unix_ms);
"#;

const CREATE_SUMMARY_RUNS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS summary_runs (
    run_id TEXT NOT NULL PRIMARY KEY,
    started_at_utc TEXT NOT NULL,
    finished_at_utc TEXT,
    status TEXT NOT NULL,
    log_dir TEXT NOT NULL,
    files_processed INTEGER NOT NULL,
    events_parsed INTEGER NOT NULL,
    lines_rejected INTEGER NOT NULL,
    summaries_written INTEGER NOT NULL,
    error_summary_json TEXT NOT NULL DEFAULT '{}',
    CHECK (status IN ('running', 'success', 'failed'))
);
"#;

const CREATE_SCHEMA_META_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS smslog_schema_meta (
    key TEXT NOT NULL PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteWriterConfig {
    pub batch_size: usize,
}

impl Default for SqliteWriterConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SqliteWriteStats {
    pub records_written: usize,
    pub batches_committed: usize,
}

pub fn open_sqlite_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create sqlite mart directory: {}", parent.display())
        })?;
    }
    Connection::open(path)
        .with_context(|| format!("failed to open sqlite mart: {}", path.display()))
}

pub fn ensure_sqlite_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(CREATE_SUMMARIES_TABLE_SQL)
        .context("failed to create message summaries table")?;
    connection
        .execute_batch(CREATE_INDEX_FIRST_TIME_SQL)
        .context("failed to create first-time index")?;
    connection
        .execute_batch(CREATE_INDEX_OUTCOME_SQL)
        .context("failed to create outcome index")?;
    connection
        .execute_batch(CREATE_SUMMARY_RUNS_TABLE_SQL)
        .context("failed to create summary runs table")?;
    connection
        .execute_batch(CREATE_SCHEMA_META_TABLE_SQL)
        .context("failed to create schema meta table")?;
    connection
        .execute(
            &format!(
                "INSERT INTO {SCHEMA_META_TABLE} (key, value) VALUES ('schema_version', ?1)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value"
            ),
            params![SQLITE_SCHEMA_VERSION],
        )
        .context("failed to record sqlite schema version")?;
    Ok(())
}

/// Upsert summaries in transactional batches. Re-running a batch over the
/// same input replaces rows in place, keyed by message id.
pub fn write_summaries_batched(
    connection: &mut Connection,
    summaries: &[MessageSummary],
    config: SqliteWriterConfig,
) -> Result<SqliteWriteStats> {
    let batch_size = config.batch_size.max(1);
    let insert_sql = format!(
        "INSERT OR REPLACE INTO {SUMMARIES_TABLE}
             (schema_version, message_id, first_time, last_time, first_time_unix_ms,
              last_time_unix_ms, utc_offset_seconds, duration_seconds, phone_number,
              message, outcome, has_send_success, events_count, source_file)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    );

    let mut stats = SqliteWriteStats::default();
    for batch in summaries.chunks(batch_size) {
        let transaction = connection
            .transaction()
            .context("failed to begin sqlite transaction")?;
        {
            let mut statement = transaction
                .prepare_cached(&insert_sql)
                .context("failed to prepare summary insert")?;
            for summary in batch {
                statement
                    .execute(params![
                        crate::models::SCHEMA_VERSION,
                        summary.message_id,
                        summary.first_time,
                        summary.last_time,
                        to_i64(summary.first_time_unix_ms, "first_time_unix_ms")?,
                        to_i64(summary.last_time_unix_ms, "last_time_unix_ms")?,
                        summary.utc_offset_seconds,
                        summary.duration_seconds,
                        summary.phone_number,
                        summary.message,
                        summary.outcome.as_str(),
                        summary.has_send_success,
                        usize_to_i64(summary.events_count, "events_count")?,
                        summary.source_file,
                    ])
                    .with_context(|| {
                        format!("failed to insert summary row: {}", summary.message_id)
                    })?;
                stats.records_written += 1;
            }
        }
        transaction
            .commit()
            .context("failed to commit summary batch")?;
        stats.batches_committed += 1;
    }

    Ok(stats)
}

pub fn insert_summary_run_started(
    connection: &Connection,
    run_id: &str,
    started_at_utc: &str,
    log_dir: &str,
) -> Result<()> {
    connection
        .execute(
            &format!(
                "INSERT INTO {SUMMARY_RUNS_TABLE}
                     (run_id, started_at_utc, status, log_dir, files_processed,
                      events_parsed, lines_rejected, summaries_written)
                 VALUES (?1, ?2, 'running', ?3, 0, 0, 0, 0)"
            ),
            params![run_id, started_at_utc, log_dir],
        )
        .with_context(|| format!("failed to insert summary run start row: {run_id}"))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn finalize_summary_run(
    connection: &Connection,
    run_id: &str,
    status: &str,
    finished_at_utc: &str,
    files_processed: usize,
    events_parsed: usize,
    lines_rejected: usize,
    summaries_written: usize,
    error_summary_json: &str,
) -> Result<()> {
    connection
        .execute(
            &format!(
                "UPDATE {SUMMARY_RUNS_TABLE}
                 SET finished_at_utc = ?2,
                     status = ?3,
                     files_processed = ?4,
                     events_parsed = ?5,
                     lines_rejected = ?6,
                     summaries_written = ?7,
                     error_summary_json = ?8
                 WHERE run_id = ?1"
            ),
            params![
                run_id,
                finished_at_utc,
                status,
                usize_to_i64(files_processed, "files_processed")?,
                usize_to_i64(events_parsed, "events_parsed")?,
                usize_to_i64(lines_rejected, "lines_rejected")?,
                usize_to_i64(summaries_written, "summaries_written")?,
                error_summary_json,
            ],
        )
        .with_context(|| format!("failed to finalize summary run row: {run_id}"))?;
    Ok(())
}

fn to_i64(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("{field} exceeds sqlite INTEGER range"))
}

fn usize_to_i64(value: usize, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("{field} exceeds sqlite INTEGER range"))
}
