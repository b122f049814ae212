use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeadlineParseError {
    #[error("deadline is required")]
    Empty,
    #[error("unrecognised deadline {0:?} (use DD-MM-YYYY HH:MM or +30m, +2h, +1d)")]
    Unrecognised(String),
    #[error("deadline {0:?} does not exist in the local timezone")]
    Nonexistent(String),
    #[error("deadline must be in the future")]
    InPast,
}

fn relative_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+\s*(\d+)\s*([mhd])$").ok())
        .as_ref()
}

/// Parses form input into an absolute deadline.
///
/// Accepts `DD-MM-YYYY HH:MM` read in `tz`, or an offset from `now` such as
/// `+45m`, `+3h` or `+2d`.
pub fn parse_deadline_in<Tz: TimeZone>(
    input: &str,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<DateTime<Utc>, DeadlineParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DeadlineParseError::Empty);
    }

    let deadline = if let Some(caps) = relative_re().and_then(|re| re.captures(input)) {
        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| DeadlineParseError::Unrecognised(input.to_string()))?;
        let offset = match &caps[2] {
            "m" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            _ => Duration::try_days(amount),
        }
        .ok_or_else(|| DeadlineParseError::Unrecognised(input.to_string()))?;
        now.checked_add_signed(offset)
            .ok_or_else(|| DeadlineParseError::Unrecognised(input.to_string()))?
    } else {
        let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
        let naive = NaiveDateTime::parse_from_str(&normalized, "%d-%m-%Y %H:%M")
            .map_err(|_| DeadlineParseError::Unrecognised(input.to_string()))?;
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            // Ambiguous wall time during a DST fold: take the earlier instant.
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => return Err(DeadlineParseError::Nonexistent(input.to_string())),
        }
    };

    if deadline <= now {
        return Err(DeadlineParseError::InPast);
    }
    Ok(deadline)
}

pub fn parse_deadline(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, DeadlineParseError> {
    parse_deadline_in(input, now, &chrono::Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_relative_minutes() {
        let result = parse_deadline_in("+10m", now(), &Utc);
        assert_eq!(result, Ok(now() + Duration::minutes(10)));
    }

    #[test]
    fn test_parse_relative_hours_and_days_with_spaces() {
        assert_eq!(
            parse_deadline_in("  + 3 h ", now(), &Utc),
            Ok(now() + Duration::hours(3))
        );
        assert_eq!(
            parse_deadline_in("+2d", now(), &Utc),
            Ok(now() + Duration::days(2))
        );
    }

    #[test]
    fn test_parse_absolute_in_utc() {
        let result = parse_deadline_in("15-10-2026 09:30", now(), &Utc);
        assert_eq!(result, Ok(Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap()));
    }

    #[test]
    fn test_parse_absolute_converts_local_to_utc() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let result = parse_deadline_in("14-10-2026   18:00", now(), &tz);
        assert_eq!(result, Ok(Utc.with_ymd_and_hms(2026, 10, 14, 16, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_rejects_past_deadline() {
        assert_eq!(
            parse_deadline_in("13-10-2026 09:30", now(), &Utc),
            Err(DeadlineParseError::InPast)
        );
        assert_eq!(
            parse_deadline_in("+0m", now(), &Utc),
            Err(DeadlineParseError::InPast)
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert_eq!(
            parse_deadline_in("   ", now(), &Utc),
            Err(DeadlineParseError::Empty)
        );
        assert_eq!(
            parse_deadline_in("tomorrow", now(), &Utc),
            Err(DeadlineParseError::Unrecognised("tomorrow".to_string()))
        );
        assert_eq!(
            parse_deadline_in("2026-10-15 09:30", now(), &Utc),
            Err(DeadlineParseError::Unrecognised("2026-10-15 09:30".to_string()))
        );
    }
}
