use anyhow::{Context, Result, bail};
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, UtcOffset};

const NANOS_PER_MILLI: i128 = 1_000_000;
const MINUTES_PER_DAY: u16 = 24 * 60;

/// A gateway timestamp normalized to a unix instant plus the offset the
/// source string carried. The offset is preserved so wall-clock bucketing
/// reproduces the gateway's local clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayTimestamp {
    pub unix_ms: u64,
    pub offset_seconds: i32,
}

/// Parse a gateway `Timestamp` string.
///
/// Accepts RFC3339 with an explicit offset. The gateway is known to sometimes
/// double-encode the offset (`...+13:00+13:00`); a trailing duplicate offset
/// suffix is stripped and the inner offset kept. A naive timestamp with no
/// offset at all is read as offset zero. Anything else is an error, never
/// defaulted to "now" or epoch.
pub fn parse_gateway_timestamp(raw: &str) -> Result<GatewayTimestamp> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        bail!("timestamp input is empty");
    }

    if let Ok(parsed) = OffsetDateTime::parse(candidate, &Rfc3339) {
        return to_gateway_timestamp(parsed);
    }

    if let Some(stripped) = strip_duplicate_offset(candidate)
        && let Ok(parsed) = OffsetDateTime::parse(stripped, &Rfc3339)
    {
        return to_gateway_timestamp(parsed);
    }

    if !has_explicit_offset(candidate) {
        let assumed_utc = format!("{candidate}Z");
        if let Ok(parsed) = OffsetDateTime::parse(&assumed_utc, &Rfc3339) {
            return to_gateway_timestamp(parsed);
        }
    }

    bail!("unsupported timestamp format: {candidate}");
}

fn to_gateway_timestamp(parsed: OffsetDateTime) -> Result<GatewayTimestamp> {
    if parsed.unix_timestamp() < 0 {
        bail!("timestamps before 1970-01-01T00:00:00Z are not supported");
    }

    let unix_ms = parsed.unix_timestamp_nanos() / NANOS_PER_MILLI;
    let unix_ms = u64::try_from(unix_ms)
        .map_err(|_| anyhow::anyhow!("timestamp exceeds supported unix millisecond range"))?;

    Ok(GatewayTimestamp {
        unix_ms,
        offset_seconds: parsed.offset().whole_seconds(),
    })
}

fn strip_duplicate_offset(candidate: &str) -> Option<&str> {
    if candidate.len() < 12 || !candidate.is_ascii() {
        return None;
    }
    let tail = &candidate[candidate.len() - 6..];
    let inner = &candidate[candidate.len() - 12..candidate.len() - 6];
    if is_offset_suffix(tail) && is_offset_suffix(inner) {
        Some(&candidate[..candidate.len() - 6])
    } else {
        None
    }
}

fn is_offset_suffix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 6
        && (bytes[0] == b'+' || bytes[0] == b'-')
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
        && bytes[3] == b':'
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
}

fn has_explicit_offset(candidate: &str) -> bool {
    if candidate.ends_with('Z') || candidate.ends_with('z') {
        return true;
    }
    let time_part = match candidate.split_once('T') {
        Some((_, time_part)) => time_part,
        None => candidate,
    };
    time_part.contains('+') || time_part.contains('-')
}

fn to_wall_clock(unix_ms: u64, offset_seconds: i32) -> OffsetDateTime {
    let offset = UtcOffset::from_whole_seconds(offset_seconds)
        .expect("offset seconds must come from a parsed timestamp");
    let nanos = i128::from(unix_ms)
        .checked_mul(NANOS_PER_MILLI)
        .unwrap_or(i128::MAX);
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .expect("valid unix milliseconds must convert to datetime")
        .to_offset(offset)
}

/// Render `unix_ms` as a wall-clock RFC3339-style string in the given offset,
/// millisecond precision. Zero offset renders as `Z`.
#[must_use]
pub fn format_wall_clock(unix_ms: u64, offset_seconds: i32) -> String {
    let dt = to_wall_clock(unix_ms, offset_seconds);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}{}",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.millisecond(),
        format_offset_suffix(offset_seconds)
    )
}

/// Table-friendly wall-clock rendering, second precision, no offset suffix.
#[must_use]
pub fn format_wall_clock_seconds(unix_ms: u64, offset_seconds: i32) -> String {
    let dt = to_wall_clock(unix_ms, offset_seconds);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

fn format_offset_suffix(offset_seconds: i32) -> String {
    if offset_seconds == 0 {
        return "Z".to_string();
    }
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

#[must_use]
pub fn wall_clock_date(unix_ms: u64, offset_seconds: i32) -> Date {
    to_wall_clock(unix_ms, offset_seconds).date()
}

#[must_use]
pub fn wall_clock_hour(unix_ms: u64, offset_seconds: i32) -> u8 {
    to_wall_clock(unix_ms, offset_seconds).hour()
}

#[must_use]
pub fn wall_clock_minutes_of_day(unix_ms: u64, offset_seconds: i32) -> u16 {
    let dt = to_wall_clock(unix_ms, offset_seconds);
    u16::from(dt.hour()) * 60 + u16::from(dt.minute())
}

#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parse `YYYY-MM-DD` (cutoff dates and filename dates decode through here).
pub fn parse_iso_date(raw: &str) -> Result<Date> {
    let mut parts = raw.splitn(3, '-');
    let year = parts
        .next()
        .unwrap_or_default()
        .parse::<i32>()
        .with_context(|| format!("invalid year in date: {raw}"))?;
    let month = parts
        .next()
        .unwrap_or_default()
        .parse::<u8>()
        .with_context(|| format!("invalid month in date: {raw}"))?;
    let day = parts
        .next()
        .unwrap_or_default()
        .parse::<u8>()
        .with_context(|| format!("invalid day in date: {raw}"))?;

    let month =
        Month::try_from(month).with_context(|| format!("month out of range in date: {raw}"))?;
    Date::from_calendar_date(year, month, day)
        .with_context(|| format!("date out of range: {raw}"))
}

/// Parse `HH:MM` into minutes-of-day, for the reminder window bounds.
pub fn parse_clock_minutes(raw: &str) -> Result<u16> {
    let (hour, minute) = raw
        .split_once(':')
        .with_context(|| format!("clock time must be HH:MM: {raw}"))?;
    let hour = hour
        .parse::<u16>()
        .with_context(|| format!("invalid hour in clock time: {raw}"))?;
    let minute = minute
        .parse::<u16>()
        .with_context(|| format!("invalid minute in clock time: {raw}"))?;
    if hour >= 24 || minute >= 60 {
        bail!("clock time out of range: {raw}");
    }
    let minutes = hour * 60 + minute;
    debug_assert!(minutes < MINUTES_PER_DAY);
    Ok(minutes)
}

pub fn now_utc_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format run timestamp as RFC3339")
}
