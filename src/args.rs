//! Parsing helpers for command-line values.

use anyhow::{Context, Result};
use cadence_core::codec::weekday_from_code;
use cadence_core::time::local_to_utc;
use cadence_core::Frequency;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a start or end time.
///
/// Accepts RFC 3339 (`2024-01-01T09:00:00Z`), a local date-time
/// (`2024-01-01T09:00`) or a bare date (midnight). Local values are read in `tz`.
pub fn parse_datetime(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in LOCAL_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(local_to_utc(tz, local));
        }
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").with_context(|| {
        format!("Could not parse \"{input}\". Expected YYYY-MM-DDTHH:MM or YYYY-MM-DD")
    })?;
    Ok(local_to_utc(tz, date.and_time(NaiveTime::MIN)))
}

/// Parse a human duration such as "30m" or "1h 30m".
pub fn parse_duration(input: &str) -> Result<Duration> {
    let std_dur = humantime::parse_duration(input)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Could not parse duration: \"{input}\""))?;
    Duration::from_std(std_dur).context("Duration too large")
}

/// Parse a comma-separated weekday list: "mo,we,fr" or "monday,wednesday".
pub fn parse_weekdays(input: &str) -> Result<Vec<Weekday>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            weekday_from_code(part)
                .or_else(|| part.parse::<Weekday>().ok())
                .ok_or_else(|| anyhow::anyhow!("Unknown weekday '{part}'"))
        })
        .collect()
}

/// clap value parser for `--freq`.
pub fn parse_frequency(input: &str) -> std::result::Result<Frequency, String> {
    match input.to_ascii_lowercase().as_str() {
        "daily" | "day" => Ok(Frequency::Daily),
        "weekly" | "week" => Ok(Frequency::Weekly),
        "monthly" | "month" => Ok(Frequency::Monthly),
        "yearly" | "year" => Ok(Frequency::Yearly),
        _ => Err(format!(
            "unknown frequency '{input}' (expected daily, weekly, monthly or yearly)"
        )),
    }
}

/// Rule text as typed on a shell: a literal `\n` separates lines.
pub fn unescape_rule(input: &str) -> String {
    input.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        assert_eq!(parse_datetime("2024-01-01T09:00:00Z", Tz::UTC).unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-01T10:00:00+01:00", Tz::UTC).unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-01T09:00", Tz::UTC).unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-01 09:00", Tz::UTC).unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-01-01T10:00", chrono_tz::Europe::Berlin).unwrap(),
            expected
        );
        assert_eq!(
            parse_datetime("2024-01-01", Tz::UTC).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_datetime("next tuesday", Tz::UTC).is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::minutes(90));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn weekday_lists() {
        assert_eq!(
            parse_weekdays("MO,we, Friday").unwrap(),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
        assert!(parse_weekdays("").unwrap().is_empty());
        assert!(parse_weekdays("mo,xx").is_err());
    }

    #[test]
    fn frequencies() {
        assert_eq!(parse_frequency("Weekly"), Ok(Frequency::Weekly));
        assert_eq!(parse_frequency("year"), Ok(Frequency::Yearly));
        assert!(parse_frequency("hourly").is_err());
    }

    #[test]
    fn rule_escapes() {
        assert_eq!(
            unescape_rule("DTSTART:20240101T090000Z\\nRRULE:FREQ=DAILY"),
            "DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY"
        );
    }
}
