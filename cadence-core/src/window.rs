//! Query windows for expansion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, CadenceResult};
use crate::rule::days_from_week_start;
use crate::time::local_to_utc;

/// Days on either side of "now" a window covers when no bounds are given.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Half-open range `[start, end)` of instants currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Calendar grid views, each mapping a date to a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Day,
    Week,
    #[default]
    Month,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CadenceResult<Self> {
        if start > end {
            return Err(CadenceError::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Window { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether an event spanning `[start, end)` is at least partly visible.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// One local day in `tz`, midnight to midnight.
    pub fn day(date: NaiveDate, tz: Tz) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self::local_dates(date, next, tz)
    }

    /// The week containing `date`, starting on `week_start`.
    pub fn week(date: NaiveDate, tz: Tz, week_start: Weekday) -> Self {
        let back = u64::from(days_from_week_start(date.weekday(), week_start));
        let first = date.checked_sub_days(Days::new(back)).unwrap_or(date);
        let next = first.checked_add_days(Days::new(7)).unwrap_or(first);
        Self::local_dates(first, next, tz)
    }

    /// The calendar month containing `date`.
    pub fn month(date: NaiveDate, tz: Tz) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
        Self::local_dates(first, next, tz)
    }

    pub fn for_view(view: View, date: NaiveDate, tz: Tz, week_start: Weekday) -> Self {
        match view {
            View::Day => Self::day(date, tz),
            View::Week => Self::week(date, tz, week_start),
            View::Month => Self::month(date, tz),
        }
    }

    /// Parse `--from`/`--to` style bounds (YYYY-MM-DD, local to `tz`).
    ///
    /// `to` includes the whole day. Missing bounds default to
    /// ±[`DEFAULT_WINDOW_DAYS`] around `now`.
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> CadenceResult<Self> {
        let start = match from {
            Some(s) => local_to_utc(tz, parse_date(s)?.and_time(NaiveTime::MIN)),
            None => now - Duration::days(DEFAULT_WINDOW_DAYS),
        };

        let end = match to {
            Some(s) => {
                let date = parse_date(s)?;
                let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
                local_to_utc(tz, next.and_time(NaiveTime::MIN))
            }
            None => now + Duration::days(DEFAULT_WINDOW_DAYS),
        };

        Self::new(start, end)
    }

    fn local_dates(first: NaiveDate, next: NaiveDate, tz: Tz) -> Self {
        Window {
            start: local_to_utc(tz, first.and_time(NaiveTime::MIN)),
            end: local_to_utc(tz, next.and_time(NaiveTime::MIN)),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

impl FromStr for View {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(View::Day),
            "week" => Ok(View::Week),
            "month" => Ok(View::Month),
            other => Err(CadenceError::InvalidWindow(format!(
                "Unknown view '{other}'. Expected day, week or month"
            ))),
        }
    }
}

fn parse_date(s: &str) -> CadenceResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        CadenceError::InvalidWindow(format!("Invalid date format '{s}'. Expected YYYY-MM-DD"))
    })
}
