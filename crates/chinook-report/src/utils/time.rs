use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use time::{Date, Month, OffsetDateTime, UtcOffset};

const NANOS_PER_MILLI: i128 = 1_000_000;

fn calendar_date_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*(\d{4})-(\d{2})-(\d{2})(?:[ T].*)?$")
            .expect("calendar date regex should compile")
    })
}

#[must_use]
pub fn unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

#[must_use]
pub fn format_unix_ms(timestamp_unix_ms: u64) -> String {
    let nanos = i128::from(timestamp_unix_ms)
        .checked_mul(NANOS_PER_MILLI)
        .unwrap_or(i128::MAX);
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.millisecond()
    )
}

/// Parses the date part of dataset timestamps such as `2017-04-01 00:00:00`
/// or `2017-04-01`. Any time-of-day suffix is ignored.
pub fn parse_calendar_date(raw: &str) -> Result<Date> {
    let captures = calendar_date_regex()
        .captures(raw)
        .ok_or_else(|| anyhow!("unsupported date format: {raw:?}"))?;

    let year = captures[1]
        .parse::<i32>()
        .with_context(|| format!("invalid year in date: {raw:?}"))?;
    let month = captures[2]
        .parse::<u8>()
        .with_context(|| format!("invalid month in date: {raw:?}"))?;
    let day = captures[3]
        .parse::<u8>()
        .with_context(|| format!("invalid day in date: {raw:?}"))?;

    let month = Month::try_from(month).map_err(|_| anyhow!("month out of range in date: {raw:?}"))?;
    match Date::from_calendar_date(year, month, day) {
        Ok(date) => Ok(date),
        Err(error) => bail!("invalid calendar date {raw:?}: {error}"),
    }
}

#[must_use]
pub fn format_calendar_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Whole days from `start` to `end`; negative when `end` precedes `start`.
#[must_use]
pub fn days_between(start: Date, end: Date) -> i64 {
    (end - start).whole_days()
}

#[cfg(test)]
mod tests {
    use super::{days_between, format_calendar_date, format_unix_ms, parse_calendar_date};

    #[test]
    fn parses_dataset_timestamp_with_time_suffix() {
        let date = parse_calendar_date("2017-04-01 00:00:00").expect("date should parse");
        assert_eq!(format_calendar_date(date), "2017-04-01");
    }

    #[test]
    fn parses_bare_and_iso_dates() {
        assert!(parse_calendar_date("2016-05-03").is_ok());
        assert!(parse_calendar_date("2016-05-03T12:00:00Z").is_ok());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_calendar_date("").is_err());
        assert!(parse_calendar_date("03/05/2016").is_err());
        assert!(parse_calendar_date("2016-13-01").is_err());
        assert!(parse_calendar_date("2016-02-30").is_err());
    }

    #[test]
    fn counts_days_across_a_leap_year() {
        let start = parse_calendar_date("2016-01-01").expect("start should parse");
        let end = parse_calendar_date("2017-01-01").expect("end should parse");
        assert_eq!(days_between(start, end), 366);
        assert_eq!(days_between(end, start), -366);
    }

    #[test]
    fn formats_unix_epoch_millis() {
        assert_eq!(format_unix_ms(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_unix_ms(1_500), "1970-01-01T00:00:01.500Z");
    }
}
