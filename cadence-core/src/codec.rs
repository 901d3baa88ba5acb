//! Rule text encoding.
//!
//! Rules are stored as the two-line iCalendar subset the event form has always
//! written:
//!
//! ```text
//! DTSTART:20240101T090000Z
//! RRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE,FR;COUNT=3
//! ```
//!
//! Zoned rules use `DTSTART;TZID=Europe/Berlin:20240101T090000`. An anchor in
//! the second pass of a repeated hour keeps its zone but is written in UTC
//! (`DTSTART;TZID=Europe/Berlin:20241027T013000Z`). Only the keys
//! the expander understands are accepted; anything else is reported as
//! unsupported so callers can fall back to treating the event as one-off.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::DecodeError;
use crate::rule::{Frequency, RecurrenceRule, Termination, weekday_ordinal};
use crate::time::{local_to_utc, utc_to_local};

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Encode a rule as storable text.
pub fn encode(rule: &RecurrenceRule) -> String {
    let dtstart = if rule.timezone() == Tz::UTC {
        format!("DTSTART:{}Z", rule.anchor().format(DATE_TIME_FORMAT))
    } else if local_to_utc(rule.timezone(), rule.anchor_local()) != rule.anchor() {
        // Wall-clock time would read back as the first pass of a repeated hour
        format!(
            "DTSTART;TZID={}:{}Z",
            rule.timezone().name(),
            rule.anchor().format(DATE_TIME_FORMAT)
        )
    } else {
        format!(
            "DTSTART;TZID={}:{}",
            rule.timezone().name(),
            rule.anchor_local().format(DATE_TIME_FORMAT)
        )
    };

    let mut parts = vec![
        format!("FREQ={}", rule.frequency().as_rrule()),
        format!("INTERVAL={}", rule.interval()),
    ];

    if !rule.weekdays().is_empty() {
        let codes: Vec<&str> = rule.weekdays().iter().map(weekday_code).collect();
        parts.push(format!("BYDAY={}", codes.join(",")));
    }

    if rule.week_start() != Weekday::Mon {
        parts.push(format!("WKST={}", weekday_code(rule.week_start())));
    }

    match rule.termination() {
        Termination::Never => {}
        Termination::AfterCount(n) => parts.push(format!("COUNT={n}")),
        Termination::Until(date) => parts.push(format!("UNTIL={}", date.format(DATE_FORMAT))),
    }

    format!("{dtstart}\nRRULE:{}", parts.join(";"))
}

/// Decode stored rule text.
pub fn decode(text: &str) -> Result<RecurrenceRule, DecodeError> {
    let mut start = None;
    let mut rule_value = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let upper = line.to_ascii_uppercase();

        if upper.starts_with("DTSTART") {
            start = Some(parse_dtstart(line)?);
        } else if upper.starts_with("RRULE:") {
            rule_value = Some(&line["RRULE:".len()..]);
        } else if !line.contains(':') && upper.contains("FREQ=") {
            // Bare rule value without the property name
            rule_value = Some(line);
        } else {
            let name = line.split([':', ';']).next().unwrap_or(line);
            return Err(DecodeError::Unsupported(format!("{name} line")));
        }
    }

    if start.is_none() && rule_value.is_none() {
        return Err(DecodeError::Empty);
    }
    let (anchor, timezone) = start.ok_or(DecodeError::MissingStart)?;
    let rule_value = rule_value.ok_or(DecodeError::MissingRule)?;

    let parts = parse_rule_parts(rule_value, timezone)?;
    let frequency = parts.frequency.ok_or(DecodeError::MissingFrequency)?;

    let termination = match (parts.count, parts.until) {
        (Some(_), Some(_)) => return Err(DecodeError::ConflictingTermination),
        (Some(n), None) => Termination::AfterCount(n),
        (None, Some(date)) => Termination::Until(date),
        (None, None) => Termination::Never,
    };

    let rule = RecurrenceRule::builder(frequency, anchor)
        .interval(parts.interval)
        .weekday_ordinals(&parts.weekdays)
        .termination(termination)
        .timezone(timezone)
        .week_start(parts.week_start)
        .build()?;

    Ok(rule)
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for RecurrenceRule {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

struct RuleParts {
    frequency: Option<Frequency>,
    interval: u32,
    weekdays: Vec<u8>,
    week_start: Weekday,
    count: Option<u32>,
    until: Option<NaiveDate>,
}

fn parse_rule_parts(value: &str, timezone: Tz) -> Result<RuleParts, DecodeError> {
    let mut parts = RuleParts {
        frequency: None,
        interval: 1,
        weekdays: Vec::new(),
        week_start: Weekday::Mon,
        count: None,
        until: None,
    };

    for part in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, val) = part
            .split_once('=')
            .ok_or_else(|| DecodeError::MalformedPart(part.to_string()))?;
        let key = key.trim().to_ascii_uppercase();
        let val = val.trim();

        match key.as_str() {
            "FREQ" => {
                parts.frequency = Some(
                    Frequency::from_rrule(val)
                        .ok_or_else(|| DecodeError::UnknownFrequency(val.to_string()))?,
                );
            }
            "INTERVAL" => parts.interval = parse_number(&key, val)?,
            "COUNT" => parts.count = Some(parse_number(&key, val)?),
            "UNTIL" => parts.until = Some(parse_until(val, timezone)?),
            "BYDAY" => {
                parts.weekdays = val
                    .split(',')
                    .map(|code| parse_byday(code.trim()))
                    .collect::<Result<_, _>>()?;
            }
            "WKST" => {
                parts.week_start = weekday_from_code(val).ok_or_else(|| invalid(&key, val))?;
            }
            _ => return Err(DecodeError::Unsupported(key)),
        }
    }

    Ok(parts)
}

fn parse_number(key: &str, val: &str) -> Result<u32, DecodeError> {
    val.parse().map_err(|_| invalid(key, val))
}

fn parse_byday(code: &str) -> Result<u8, DecodeError> {
    if let Some(weekday) = weekday_from_code(code) {
        return Ok(weekday_ordinal(weekday));
    }

    // "1MO", "-1FR" and friends select the nth weekday of a month or year
    let split = code.len().saturating_sub(2);
    let has_ordinal = split > 0
        && code.is_char_boundary(split)
        && weekday_from_code(&code[split..]).is_some()
        && code[..split]
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == '-');
    if has_ordinal {
        Err(DecodeError::Unsupported(format!("BYDAY={code}")))
    } else {
        Err(invalid("BYDAY", code))
    }
}

/// Parse a DTSTART line into the anchor instant and the rule's zone.
fn parse_dtstart(line: &str) -> Result<(DateTime<Utc>, Tz), DecodeError> {
    let (head, value) = line
        .split_once(':')
        .ok_or_else(|| DecodeError::InvalidDateTime(line.to_string()))?;
    let value = value.trim();

    let mut timezone = Tz::UTC;
    let mut date_only = false;
    for param in head.split(';').skip(1) {
        match param.split_once('=') {
            Some((name, tzid)) if name.eq_ignore_ascii_case("TZID") => {
                timezone = tzid
                    .parse::<Tz>()
                    .map_err(|_| DecodeError::UnknownTimezone(tzid.to_string()))?;
            }
            Some((name, kind)) if name.eq_ignore_ascii_case("VALUE") => {
                date_only = kind.eq_ignore_ascii_case("DATE");
            }
            _ => {}
        }
    }

    if date_only || value.len() == DATE_FORMAT_LEN {
        let date = parse_date(value)?;
        return Ok((local_to_utc(timezone, date.and_time(NaiveTime::MIN)), timezone));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = parse_date_time(utc, value)?;
        return Ok((naive.and_utc(), timezone));
    }

    let naive = parse_date_time(value, value)?;
    Ok((local_to_utc(timezone, naive), timezone))
}

const DATE_FORMAT_LEN: usize = 8;

/// UNTIL may be a date, a UTC date-time or a floating date-time; only the
/// calendar date in the rule's zone matters.
fn parse_until(value: &str, timezone: Tz) -> Result<NaiveDate, DecodeError> {
    if value.len() == DATE_FORMAT_LEN {
        return parse_date(value);
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = parse_date_time(utc, value)?;
        return Ok(utc_to_local(timezone, naive.and_utc()).date());
    }

    Ok(parse_date_time(value, value)?.date())
}

fn parse_date(value: &str) -> Result<NaiveDate, DecodeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| DecodeError::InvalidDateTime(value.to_string()))
}

fn parse_date_time(value: &str, original: &str) -> Result<NaiveDateTime, DecodeError> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|_| DecodeError::InvalidDateTime(original.to_string()))
}

fn invalid(key: &str, value: &str) -> DecodeError {
    DecodeError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Two-letter iCalendar weekday code.
pub fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

pub fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}
