//! Venue-local date and time fragments to UTC instants.
//!
//! Venue pages print wall-clock times in the venue's own zone, usually without
//! a year and with irregular AM/PM spacing. Everything here is pure: the
//! caller supplies "today" so year inference is deterministic.

use crate::common::error::{Result, ScraperError};
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(?:([ap])\.?\s?m\b\.?)?").expect("clock regex")
});

/// Age restrictions such as "21+", "18 +" or "All Ages"
static AGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:\d{1,2}\s*\+|all\s+ages)").expect("age regex"));

/// A meridiem, a colon clock, or a doors/show label followed by a number
static TIME_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d\s*[ap]\.?\s?m\b|\d:\d{2}|\b(?:doors|show)\b\D*\d").expect("time hint regex")
});

/// Hour and minute on a 24-hour clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

/// Interprets the fields as a naive wall-clock time in `tz` and converts it to UTC.
///
/// Fails with [`ScraperError::InvalidDate`] when the fields are not a real
/// calendar date and time. A repeated hour (clocks falling back) resolves to
/// the standard-time reading; a skipped hour (clocks springing forward) is
/// read with the pre-transition offset.
pub fn normalize(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    tz: Tz,
) -> Result<DateTime<Utc>> {
    let invalid = || ScraperError::InvalidDate {
        year,
        month,
        day,
        hour,
        minute,
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .ok_or_else(invalid)?;

    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(_, standard) => standard,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .ok_or_else(invalid)?
        }
    };

    Ok(local.with_timezone(&Utc))
}

/// Schedules never list past shows: a month before the current one belongs to next year.
pub fn infer_year(month: u32, today: NaiveDate) -> i32 {
    if month >= today.month() {
        today.year()
    } else {
        today.year() + 1
    }
}

/// Month number for an English month name or abbreviation ("Sep", "sept", "September").
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches(['.', ',']).to_lowercase();
    if lower.len() < 3 {
        return None;
    }

    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    MONTHS
        .iter()
        .position(|full| full.starts_with(lower.as_str()))
        .map(|idx| idx as u32 + 1)
}

/// Parses a printed clock time such as "7:00 PM", "7:30PM", "9pm" or "8 p.m.".
///
/// Ranges ("9PM - 5AM") resolve to their first boundary. A time without a
/// meridiem is taken as PM unless it is already on a 24-hour clock.
pub fn parse_clock(text: &str) -> Result<ClockTime> {
    let start = text.split(['-', '–']).next().unwrap_or(text);
    let unreadable = || ScraperError::MissingField(format!("unreadable time {:?}", text.trim()));

    let caps = CLOCK_RE.captures(start).ok_or_else(unreadable)?;
    let hour: u32 = caps[1].parse().map_err(|_| unreadable())?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| unreadable())?,
        None => 0,
    };
    let meridiem = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());

    let hour = match meridiem.as_deref() {
        Some("a") if (1..=12).contains(&hour) => hour % 12,
        Some(_) if (1..=12).contains(&hour) => hour % 12 + 12,
        Some(_) => return Err(unreadable()),
        None if (1..=11).contains(&hour) => hour + 12,
        None if hour <= 23 => hour,
        None => return Err(unreadable()),
    };
    if minute > 59 {
        return Err(unreadable());
    }

    Ok(ClockTime { hour, minute })
}

/// Picks the show time out of a "Doors 7PM / Show 8PM" style listing.
///
/// The later-listed span is the show time; a listing with a single span is
/// returned as is.
/// Age restrictions are never read as a time.
pub fn select_show_time(times: &str) -> &str {
    times
        .rsplit('/')
        .map(str::trim)
        .find(|segment| !is_age_label(segment) && CLOCK_RE.is_match(segment))
        .unwrap_or_else(|| times.trim())
}

/// True for age restrictions such as "21+" or "All Ages"
pub fn is_age_label(segment: &str) -> bool {
    AGE_RE.is_match(segment)
}

/// True when a segment is unmistakably a time: it carries a meridiem, a
/// colon, or a "Doors"/"Show" label. A bare number is not enough.
pub fn is_labelled_time(segment: &str) -> bool {
    !is_age_label(segment) && TIME_HINT_RE.is_match(segment)
}

/// Reads a machine-readable timestamp. Offsets are honoured; a timestamp
/// without one is taken as wall-clock time in `tz`.
pub fn parse_iso_instant(text: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ScraperError::MissingField(format!("unreadable timestamp {:?}", text)))?;

    normalize(
        naive.year(),
        naive.month(),
        naive.day(),
        naive.hour(),
        naive.minute(),
        tz,
    )
}
