//! Event rows as the data store keeps them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, CadenceResult};
use crate::exception::{Exception, ExceptionKind};
use crate::occurrence::{EventDetails, Occurrence};

/// One row of the events table.
///
/// A recurring series is a row with `is_recurring` and `rrule` set. Each
/// exception to it is a row of its own with `is_exception`, pointing back at
/// the series through `recurring_event_id` and keyed by `original_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub calendar_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub rrule: Option<String>,
    #[serde(default)]
    pub recurring_event_id: Option<String>,
    #[serde(default)]
    pub is_exception: bool,
    #[serde(default)]
    pub original_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl EventRecord {
    pub fn details(&self) -> EventDetails {
        EventDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            all_day: self.all_day,
        }
    }

    pub fn duration(&self) -> Duration {
        (self.end_time - self.start_time).max(Duration::zero())
    }

    /// Whether this row owns a rule and may have exception rows.
    pub fn is_series(&self) -> bool {
        self.is_recurring && !self.is_exception && self.rrule.is_some()
    }

    /// Series id and original start, if this row overrides one occurrence.
    pub fn exception_key(&self) -> Option<(&str, DateTime<Utc>)> {
        if !self.is_exception {
            return None;
        }
        Some((self.recurring_event_id.as_deref()?, self.original_start?))
    }

    /// The cancellation that hides the generated occurrence this row replaces.
    ///
    /// A detached row is an event in its own right and is shown from its own
    /// fields, so only its key takes part in resolving the series.
    pub fn suppression(&self) -> Option<Exception> {
        let (series_id, original_start) = self.exception_key()?;

        Some(Exception {
            id: self.id.clone(),
            series_id: series_id.to_string(),
            original_start,
            kind: ExceptionKind::Cancelled,
        })
    }

    /// Build the row that persists `exception` for the `series` row.
    ///
    /// Fields the exception leaves alone are copied from the series. Without
    /// an end override the series duration is kept.
    pub fn from_exception(series: &EventRecord, exception: &Exception) -> EventRecord {
        let mut row = EventRecord {
            id: exception.id.clone(),
            calendar_id: series.calendar_id.clone(),
            title: series.title.clone(),
            description: series.description.clone(),
            start_time: exception.original_start,
            end_time: shift(exception.original_start, series.duration()),
            all_day: series.all_day,
            location: series.location.clone(),
            is_recurring: false,
            rrule: None,
            recurring_event_id: Some(series.id.clone()),
            is_exception: true,
            original_start: Some(exception.original_start),
            is_cancelled: false,
        };

        match &exception.kind {
            ExceptionKind::Cancelled => row.is_cancelled = true,
            ExceptionKind::Detached(overrides) => {
                if let Some(title) = &overrides.title {
                    row.title = title.clone();
                }
                if let Some(description) = &overrides.description {
                    row.description = Some(description.clone());
                }
                if let Some(location) = &overrides.location {
                    row.location = Some(location.clone());
                }
                if let Some(all_day) = overrides.all_day {
                    row.all_day = all_day;
                }
                if let Some(start) = overrides.start {
                    row.start_time = start;
                    row.end_time = shift(start, series.duration());
                }
                if let Some(end) = overrides.end {
                    row.end_time = end.max(row.start_time);
                }
            }
        }

        row
    }

    /// The row shown as a single event, outside any expansion.
    pub fn standalone_occurrence(&self) -> Occurrence {
        Occurrence {
            series_id: self
                .recurring_event_id
                .clone()
                .unwrap_or_else(|| self.id.clone()),
            start: self.start_time,
            end: self.end_time.max(self.start_time),
            is_exception: self.is_exception,
            original_start: self.original_start,
            details: self.details(),
        }
    }
}

fn shift(start: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    start.checked_add_signed(duration).unwrap_or(start)
}

/// Parse a JSON array of event rows.
pub fn records_from_json(json: &str) -> CadenceResult<Vec<EventRecord>> {
    serde_json::from_str(json).map_err(|e| CadenceError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::EventOverrides;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn series_row() -> EventRecord {
        EventRecord {
            id: "evt-1".into(),
            calendar_id: "cal-1".into(),
            title: "Standup".into(),
            description: Some("Daily sync".into()),
            start_time: at(1, 9),
            end_time: at(1, 10),
            all_day: false,
            location: Some("Room 4".into()),
            is_recurring: true,
            rrule: Some("DTSTART:20240101T090000Z\nRRULE:FREQ=DAILY;INTERVAL=1".into()),
            recurring_event_id: None,
            is_exception: false,
            original_start: None,
            is_cancelled: false,
        }
    }

    #[test]
    fn test_from_exception_copies_parent_fields() {
        let exception = Exception::detached("evt-1", at(4, 9), EventOverrides::title("Rescheduled"));
        let row = EventRecord::from_exception(&series_row(), &exception);

        assert_eq!(row.id, exception.id);
        assert_eq!(row.title, "Rescheduled");
        assert_eq!(row.description.as_deref(), Some("Daily sync"));
        assert_eq!(row.location.as_deref(), Some("Room 4"));
        assert_eq!(row.start_time, at(4, 9));
        assert_eq!(row.end_time, at(4, 10));
        assert!(!row.is_recurring);
        assert!(row.rrule.is_none());
        assert!(row.is_exception);
        assert_eq!(row.recurring_event_id.as_deref(), Some("evt-1"));
        assert_eq!(row.original_start, Some(at(4, 9)));
    }

    #[test]
    fn test_from_exception_moved_start_keeps_duration() {
        let overrides = EventOverrides {
            start: Some(at(4, 14)),
            ..EventOverrides::default()
        };
        let exception = Exception::detached("evt-1", at(4, 9), overrides);
        let row = EventRecord::from_exception(&series_row(), &exception);

        assert_eq!(row.start_time, at(4, 14));
        assert_eq!(row.end_time, at(4, 15));
        assert_eq!(row.original_start, Some(at(4, 9)));
    }

    #[test]
    fn test_cancellation_row_roundtrip() {
        let exception = Exception::cancelled("evt-1", at(5, 9));
        let row = EventRecord::from_exception(&series_row(), &exception);
        assert!(row.is_cancelled);
        assert_eq!(row.suppression(), Some(exception));
    }

    #[test]
    fn test_detached_row_only_suppresses_its_slot() {
        let exception = Exception::detached("evt-1", at(4, 9), EventOverrides::times(at(9, 14), at(9, 15)));
        let row = EventRecord::from_exception(&series_row(), &exception);

        let suppression = row.suppression().unwrap();
        assert_eq!(suppression.id, row.id);
        assert_eq!(suppression.original_start, at(4, 9));
        assert!(suppression.is_cancelled());
    }

    #[test]
    fn test_suppression_needs_key() {
        assert!(series_row().suppression().is_none());

        let mut legacy = EventRecord::from_exception(
            &series_row(),
            &Exception::detached("evt-1", at(4, 9), EventOverrides::title("Old")),
        );
        legacy.original_start = None;
        assert!(legacy.suppression().is_none());
        assert!(legacy.exception_key().is_none());
    }

    #[test]
    fn test_extreme_start_does_not_overflow() {
        let overrides = EventOverrides {
            start: Some(DateTime::<Utc>::MAX_UTC),
            ..EventOverrides::default()
        };
        let exception = Exception::detached("evt-1", at(4, 9), overrides);
        let row = EventRecord::from_exception(&series_row(), &exception);

        assert_eq!(row.start_time, DateTime::<Utc>::MAX_UTC);
        assert_eq!(row.end_time, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_rows_from_store_json() {
        let json = r#"[
            {
                "id": "evt-2",
                "calendar_id": "cal-1",
                "title": "Dentist",
                "start_time": "2024-01-03T15:00:00Z",
                "end_time": "2024-01-03T16:00:00Z"
            }
        ]"#;

        let rows = records_from_json(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_recurring);
        assert!(!rows[0].is_series());
        assert_eq!(rows[0].duration(), Duration::hours(1));

        assert!(matches!(
            records_from_json("{not json"),
            Err(CadenceError::Serialization(_))
        ));
    }

    #[test]
    fn test_standalone_occurrence_points_at_series() {
        let row = EventRecord::from_exception(
            &series_row(),
            &Exception::detached("evt-1", at(4, 9), EventOverrides::title("Moved")),
        );
        let occurrence = row.standalone_occurrence();
        assert_eq!(occurrence.series_id, "evt-1");
        assert!(occurrence.is_exception);
        assert_eq!(occurrence.original_start, Some(at(4, 9)));
        assert_eq!(occurrence.title(), "Moved");
    }

    #[test]
    fn test_standalone_occurrence_keeps_cleared_fields() {
        let mut row = EventRecord::from_exception(
            &series_row(),
            &Exception::detached("evt-1", at(4, 9), EventOverrides::title("Offsite")),
        );
        row.description = None;
        row.location = None;

        let occurrence = row.standalone_occurrence();
        assert_eq!(occurrence.details.description, None);
        assert_eq!(occurrence.details.location, None);
    }
}
