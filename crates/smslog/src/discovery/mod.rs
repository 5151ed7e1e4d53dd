use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use time::Date;

use crate::utils::time::parse_iso_date;

/// Gateway log files follow the `SMS_Log_YYYYMMDD.log` naming convention.
/// Matching is case-insensitive on the prefix since historical exports vary.
pub const LOG_FILE_PREFIX: &str = "SMS_Log_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayLogFile {
    pub path: PathBuf,
    pub file_name: String,
    pub log_date: Option<Date>,
}

/// Select gateway log files from a directory, in lexical filename order,
/// the order that encodes date and drives the correlation pass.
///
/// With a cutoff date only files carrying a decodable date at/after the
/// cutoff are kept; undated files are dropped in that mode since they cannot
/// be placed on the calendar.
pub fn discover_log_files(dir: &Path, cutoff: Option<Date>) -> Result<Vec<GatewayLogFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read log directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read log directory entry: {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(std::ffi::OsStr::to_str) else {
            continue;
        };
        if !file_name
            .to_ascii_lowercase()
            .starts_with(&LOG_FILE_PREFIX.to_ascii_lowercase())
        {
            continue;
        }

        let log_date = decode_file_date(file_name);
        match (cutoff, log_date) {
            (Some(cutoff), Some(date)) if date < cutoff => continue,
            (Some(_), None) => continue,
            _ => {}
        }

        files.push(GatewayLogFile {
            file_name: file_name.to_string(),
            path,
            log_date,
        });
    }

    files.sort_by(|left, right| left.file_name.cmp(&right.file_name));
    Ok(files)
}

/// Decode the `YYYYMMDD` block embedded in a log file name.
#[must_use]
pub fn decode_file_date(file_name: &str) -> Option<Date> {
    let captures = file_date_regex().captures(file_name)?;
    let digits = &captures[1];
    let iso = format!("{}-{}-{}", &digits[0..4], &digits[4..6], &digits[6..8]);
    parse_iso_date(&iso).ok()
}

fn file_date_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(\d{8})").expect("file date regex should compile"))
}
