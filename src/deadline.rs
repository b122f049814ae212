//! Remaining-time evaluation for task deadlines.
//!
//! Deadlines are kept as UTC instants everywhere in the core. Conversion to the
//! local zone happens only when a deadline is turned into display text.

use chrono::{DateTime, Local, TimeZone, Utc};

pub const DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadlineStatus {
    pub is_past_deadline: bool,
    pub minutes_left: u64,
}

impl DeadlineStatus {
    pub fn label(&self) -> String {
        if self.is_past_deadline {
            "Deadline passed".to_string()
        } else {
            format!("{} min left", self.minutes_left)
        }
    }
}

/// Whole minutes left until `deadline`, clamped at zero once it is reached.
pub fn evaluate(deadline: DateTime<Utc>, now: DateTime<Utc>) -> DeadlineStatus {
    if deadline <= now {
        return DeadlineStatus {
            is_past_deadline: true,
            minutes_left: 0,
        };
    }
    let seconds = (deadline - now).num_seconds();
    DeadlineStatus {
        is_past_deadline: false,
        minutes_left: u64::try_from(seconds / 60).unwrap_or(0),
    }
}

pub fn format_in<Tz: TimeZone>(deadline: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    deadline.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

pub fn format_local(deadline: DateTime<Utc>) -> String {
    format_in(deadline, &Local)
}
