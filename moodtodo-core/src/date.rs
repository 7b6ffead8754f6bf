//! Deadline parsing and formatting
//!
//! Supports various formats:
//! - Instants: "2025-01-01T10:00:00.000Z", "2025-01-01T10:00:00+02:00"
//! - Local date-times: "2025-01-01 10:00", "2025-01-01T10:00"
//! - Dates: "2026-01-25", "Jan 25", "January 25 2026", "01/25/2026"
//! - Relative: "today", "tomorrow", "monday", "next friday"
//! - Offset: "in 3 days", "in 1 week", "in 2 hours"
//!
//! A bare date means the end of that day (23:59 local time). Every parsed
//! instant is truncated to whole milliseconds, the precision of the snapshot
//! format.

use chrono::{
    DateTime, Datelike, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound,
    TimeZone, Utc, Weekday,
};

use crate::error::{CoreError, Result};

/// Current time at snapshot precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a deadline relative to the current local time
pub fn parse_deadline(input: &str) -> Result<DateTime<Utc>> {
    parse_deadline_at(input, Local::now())
}

/// Parse a deadline relative to `now`
pub fn parse_deadline_at(input: &str, now: DateTime<Local>) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(3));
    }

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return local_to_utc(naive);
        }
    }

    let lowered = trimmed.to_lowercase();

    if let Some(hours) = try_parse_hours(&lowered) {
        return now
            .with_timezone(&Utc)
            .checked_add_signed(hours)
            .map(|dt| dt.trunc_subsecs(3))
            .ok_or_else(|| CoreError::parse(format!("Deadline '{}' is out of range", trimmed)));
    }

    let date = parse_date_at(&lowered, now.date_naive())?;
    local_to_utc(date.and_time(end_of_day()))
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
        .ok_or_else(|| CoreError::parse(format!("'{}' does not exist in the local timezone", naive)))
}

/// Parse a (lowercased) date expression relative to `today`
fn parse_date_at(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    if let Some(date) = try_parse_relative(input, today) {
        return Ok(date);
    }

    if let Some(date) = try_parse_weekday(input, today) {
        return Ok(date);
    }

    if let Some(date) = try_parse_offset(input, today) {
        return Ok(date);
    }

    let with_year = [
        "%Y-%m-%d", // 2026-01-25
        "%b %d %Y", // Jan 25 2026
        "%B %d %Y", // January 25 2026
        "%m/%d/%Y", // 01/25/2026
        "%d %b %Y", // 25 Jan 2026
        "%d %B %Y", // 25 January 2026
    ];
    for format in &with_year {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Ok(date);
        }
    }

    // Without a year: the next occurrence on or after today. Feb 29 can be
    // up to eight years away.
    let without_year = [
        ("%b %d %Y", ' '), // Jan 25
        ("%B %d %Y", ' '), // January 25
        ("%d %b %Y", ' '), // 25 Jan
        ("%m/%d/%Y", '/'), // 01/25
    ];
    for (format, separator) in &without_year {
        for year in today.year()..=today.year() + 8 {
            let candidate = format!("{}{}{}", input, separator, year);
            if let Ok(date) = NaiveDate::parse_from_str(&candidate, format)
                && date >= today
            {
                return Ok(date);
            }
        }
    }

    Err(CoreError::parse(format!(
        "Could not parse deadline '{}'. Try formats like: 'tomorrow', 'Jan 25', '2026-01-25 18:00', 'next monday', 'in 3 days'",
        input
    )))
}

fn try_parse_relative(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    match input {
        "today" | "tonight" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        _ => None,
    }
}

fn try_parse_weekday(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    // Handle "next <weekday>"
    let (weekday_str, use_next_week) = match input.strip_prefix("next ") {
        Some(stripped) => (stripped.trim(), true),
        None => (input, false),
    };

    let target_weekday = match weekday_str {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };

    let days = (target_weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64
        + 7)
        % 7;

    // A plain weekday may be today; "next" always moves forward
    let days_until = if days == 0 && use_next_week { 7 } else { days as u64 };

    today.checked_add_days(Days::new(days_until))
}

fn try_parse_offset(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (num, unit) = split_offset(input)?;

    match unit {
        "day" | "days" => today.checked_add_days(Days::new(num)),
        "week" | "weeks" => today.checked_add_days(Days::new(num.checked_mul(7)?)),
        _ => None,
    }
}

fn try_parse_hours(input: &str) -> Option<Duration> {
    let (num, unit) = split_offset(input)?;
    let num = i64::try_from(num).ok()?;

    match unit {
        "hour" | "hours" | "h" => Duration::try_hours(num),
        "minute" | "minutes" | "min" | "mins" => Duration::try_minutes(num),
        _ => None,
    }
}

// "in X <unit>"
fn split_offset(input: &str) -> Option<(u64, &str)> {
    let rest = input.strip_prefix("in ")?.trim();
    let mut parts = rest.split_whitespace();
    let num: u64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((num, unit))
}

/// Format a deadline for human-readable display
///
/// Returns strings like: "Today 18:00", "Tomorrow 23:59", "Mon Jan 27 09:00",
/// "Overdue (3 days ago)"
pub fn format_deadline_human(deadline: DateTime<Utc>, now: DateTime<Local>) -> String {
    let local = deadline.with_timezone(&Local);
    let diff = local
        .date_naive()
        .signed_duration_since(now.date_naive())
        .num_days();

    match diff {
        0 => format!("Today {}", local.format("%H:%M")),
        1 => format!("Tomorrow {}", local.format("%H:%M")),
        -1 => "Overdue (yesterday)".to_string(),
        2..=6 => local.format("%a %b %d %H:%M").to_string(),
        7..=365 => local.format("%b %d").to_string(),
        _ if diff < 0 => format!("Overdue ({} days ago)", -diff),
        _ => local.format("%Y-%m-%d").to_string(),
    }
}

/// Format any timestamp as local "YYYY-MM-DD HH:MM"
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
