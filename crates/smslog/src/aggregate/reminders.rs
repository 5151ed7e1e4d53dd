use anyhow::{Result, bail};
use serde::Serialize;

use crate::models::MessageSummary;
use crate::utils::time::{format_date, wall_clock_date, wall_clock_minutes_of_day};

/// Default reminder dispatch window: 08:15 inclusive to 08:30 exclusive.
pub const DEFAULT_WINDOW_START_MINUTES: u16 = 8 * 60 + 15;
pub const DEFAULT_WINDOW_END_MINUTES: u16 = 8 * 60 + 30;

/// Daily wall-clock window, minutes-of-day, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub start_minutes: u16,
    pub end_minutes: u16,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            start_minutes: DEFAULT_WINDOW_START_MINUTES,
            end_minutes: DEFAULT_WINDOW_END_MINUTES,
        }
    }
}

impl ReminderWindow {
    pub fn new(start_minutes: u16, end_minutes: u16) -> Result<Self> {
        if start_minutes >= end_minutes {
            bail!("reminder window start must precede its end");
        }
        Ok(Self {
            start_minutes,
            end_minutes,
        })
    }

    #[must_use]
    pub const fn contains(self, minutes_of_day: u16) -> bool {
        minutes_of_day >= self.start_minutes && minutes_of_day < self.end_minutes
    }
}

/// Reminder taxonomy, keyword-matched against the message body in fixed
/// priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Birthday,
    TwoWeek,
    OneWeek,
    NextDay,
    Unknown,
}

impl ReminderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::TwoWeek => "two_week",
            Self::OneWeek => "one_week",
            Self::NextDay => "next_day",
            Self::Unknown => "unknown",
        }
    }
}

#[must_use]
pub fn classify_reminder_message(message: &str) -> ReminderKind {
    if message.contains("Happy Birthday") {
        ReminderKind::Birthday
    } else if message.contains("TWO WEEKS") {
        ReminderKind::TwoWeek
    } else if message.contains("NEXT WEEK") {
        ReminderKind::OneWeek
    } else if message.contains("Your dental appointment is on") {
        ReminderKind::NextDay
    } else {
        ReminderKind::Unknown
    }
}

/// One calendar day of reminder counts. `problem_day` flags a day where the
/// window produced no recognizable reminder of any category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReminderRow {
    pub date: String,
    pub two_week: usize,
    pub one_week: usize,
    pub next_day: usize,
    pub birthday: usize,
    pub unknown: usize,
    pub problem_day: bool,
}

impl DailyReminderRow {
    fn empty(date: String) -> Self {
        Self {
            date,
            two_week: 0,
            one_week: 0,
            next_day: 0,
            birthday: 0,
            unknown: 0,
            problem_day: true,
        }
    }

    fn record(&mut self, kind: ReminderKind) {
        match kind {
            ReminderKind::TwoWeek => self.two_week += 1,
            ReminderKind::OneWeek => self.one_week += 1,
            ReminderKind::NextDay => self.next_day += 1,
            ReminderKind::Birthday => self.birthday += 1,
            ReminderKind::Unknown => self.unknown += 1,
        }
        self.problem_day =
            self.two_week + self.one_week + self.next_day + self.birthday == 0;
    }
}

/// Group window-matching lifecycles per calendar date over the full
/// [min date, max date] range of the input. Dates with zero matching
/// lifecycles still appear, zero-filled and flagged as problem days.
#[must_use]
pub fn daily_reminder_summary(
    summaries: &[MessageSummary],
    window: ReminderWindow,
) -> Vec<DailyReminderRow> {
    let Some(first) = summaries.first() else {
        return Vec::new();
    };

    let mut min_date = wall_clock_date(first.first_time_unix_ms, first.utc_offset_seconds);
    let mut max_date = min_date;
    for summary in summaries {
        let date = wall_clock_date(summary.first_time_unix_ms, summary.utc_offset_seconds);
        min_date = min_date.min(date);
        max_date = max_date.max(date);
    }

    let mut rows = Vec::new();
    let mut cursor = min_date;
    loop {
        rows.push(DailyReminderRow::empty(format_date(cursor)));
        if cursor >= max_date {
            break;
        }
        cursor = match cursor.next_day() {
            Some(next) => next,
            None => break,
        };
    }

    for summary in summaries {
        let minutes =
            wall_clock_minutes_of_day(summary.first_time_unix_ms, summary.utc_offset_seconds);
        if !window.contains(minutes) {
            continue;
        }
        let date = format_date(wall_clock_date(
            summary.first_time_unix_ms,
            summary.utc_offset_seconds,
        ));
        if let Some(row) = rows.iter_mut().find(|row| row.date == date) {
            let kind = classify_reminder_message(summary.message.as_deref().unwrap_or_default());
            row.record(kind);
        }
    }

    rows
}
