//! Lightweight parsing of interval/when strings for the reference backend.
//!
//! The reconciliation core routes these strings without interpreting them;
//! resolving them into concrete fire times is engine business. The grammar
//! here covers human intervals ("10 seconds", "5m"), daily calendar
//! phrases ("every day at 3am"), RFC 3339 timestamps, and 5/6-field cron
//! expressions. Anything else is unparseable and the entry never fires.

use chrono::{DateTime, Duration, Timelike, Utc};
use cron::Schedule;
use std::str::FromStr;

/// A resolved interval/when string.
#[derive(Debug, Clone)]
pub enum TimeSpec {
    /// Fixed repeat interval.
    Interval(Duration),
    /// Every day at a fixed hour/minute (UTC).
    Daily { hour: u32, minute: u32 },
    /// A single absolute instant.
    At(DateTime<Utc>),
    /// Cron expression.
    Cron(Box<Schedule>),
}

impl TimeSpec {
    /// Parse a spec string; `None` when the grammar does not match.
    pub fn parse(spec: &str) -> Option<TimeSpec> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        if let Some(duration) = parse_interval(spec) {
            return Some(TimeSpec::Interval(duration));
        }
        if let Some((hour, minute)) = parse_daily(spec) {
            return Some(TimeSpec::Daily { hour, minute });
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(spec) {
            return Some(TimeSpec::At(at.with_timezone(&Utc)));
        }
        if let Some(schedule) = parse_cron(spec) {
            return Some(TimeSpec::Cron(Box::new(schedule)));
        }
        None
    }

    /// Next fire time strictly derived from `now`.
    ///
    /// `At` returns its instant even when it is already past, so an
    /// overdue one-time entry fires on the next tick. An interval that
    /// would push past the representable time range yields `None`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeSpec::Interval(d) => now.checked_add_signed(*d),
            TimeSpec::Daily { hour, minute } => {
                let today = now
                    .with_hour(*hour)?
                    .with_minute(*minute)?
                    .with_second(0)?
                    .with_nanosecond(0)?;
                if today > now {
                    Some(today)
                } else {
                    today.checked_add_signed(Duration::days(1))
                }
            }
            TimeSpec::At(at) => Some(*at),
            TimeSpec::Cron(schedule) => schedule.after(&now).next(),
        }
    }
}

/// "10 seconds", "5 minutes", "1 hour", "500 ms", and the short forms
/// "10s" / "5m" / "1h" / "500ms". Amounts that overflow the duration
/// range do not parse.
fn parse_interval(spec: &str) -> Option<Duration> {
    let (amount, unit) = match spec.split_once(char::is_whitespace) {
        Some((a, u)) => (a.trim(), u.trim()),
        None => {
            let digits = spec.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 || digits == spec.len() {
                return None;
            }
            spec.split_at(digits)
        }
    };

    let amount: i64 = amount.parse().ok()?;
    if amount <= 0 {
        return None;
    }

    match unit.to_ascii_lowercase().as_str() {
        "ms" | "millisecond" | "milliseconds" => Duration::try_milliseconds(amount),
        "s" | "sec" | "secs" | "second" | "seconds" => Duration::try_seconds(amount),
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount),
        "h" | "hour" | "hours" => Duration::try_hours(amount),
        "d" | "day" | "days" => Duration::try_days(amount),
        "w" | "week" | "weeks" => Duration::try_weeks(amount),
        _ => None,
    }
}

/// "every day at 3am", "daily at 15:30", "every day at 11:45pm".
fn parse_daily(spec: &str) -> Option<(u32, u32)> {
    let lower = spec.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("every day at ")
        .or_else(|| lower.strip_prefix("daily at "))?
        .trim();

    let (clock, meridiem) = if let Some(c) = rest.strip_suffix("am") {
        (c.trim(), Some(false))
    } else if let Some(c) = rest.strip_suffix("pm") {
        (c.trim(), Some(true))
    } else {
        (rest, None)
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (clock.parse::<u32>().ok()?, 0),
    };
    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(false) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour == 12 { 0 } else { hour }
        }
        Some(true) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour == 12 { 12 } else { hour + 12 }
        }
        None => {
            if hour > 23 {
                return None;
            }
            hour
        }
    };

    Some((hour, minute))
}

/// 6-field cron as-is; 5-field gets a seconds column prepended.
fn parse_cron(spec: &str) -> Option<Schedule> {
    let fields = spec.split_whitespace().count();
    match fields {
        5 => Schedule::from_str(&format!("0 {spec}")).ok(),
        6 | 7 => Schedule::from_str(spec).ok(),
        _ => None,
    }
}
