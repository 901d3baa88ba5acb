//! Turning a calendar's event rows into what is on screen.

use std::collections::HashMap;

use tracing::debug;

use crate::occurrence::Occurrence;
use crate::record::EventRecord;
use crate::series::Series;
use crate::window::Window;

/// All occurrences of `rows` overlapping `window`, sorted by start.
///
/// Series rows are expanded, with the slot of every exception row pointing at
/// them left out. Every other row is shown at its own times: plain events,
/// detached occurrences (wherever they were moved to), and exception rows
/// that cannot be tied to a slot (no original start, no matching series, or a
/// series whose rule no longer decodes). Cancellation rows are never shown.
pub fn agenda(rows: &[EventRecord], window: &Window) -> Vec<Occurrence> {
    let mut exceptions_by_series: HashMap<&str, Vec<&EventRecord>> = HashMap::new();
    for row in rows {
        if let Some((series_id, _)) = row.exception_key() {
            exceptions_by_series.entry(series_id).or_default().push(row);
        }
    }

    let mut occurrences = Vec::new();

    for row in rows.iter().filter(|row| row.is_series()) {
        let exception_rows = exceptions_by_series
            .get(row.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        occurrences.extend(Series::from_record(row, exception_rows).occurrences(window));
    }

    occurrences.extend(
        rows.iter()
            .filter(|row| !row.is_series() && !row.is_cancelled)
            .filter(|row| window.overlaps(row.start_time, row.end_time.max(row.start_time)))
            .map(EventRecord::standalone_occurrence),
    );

    occurrences.sort_by_key(|occurrence| occurrence.start);

    debug!(rows = rows.len(), count = occurrences.len(), %window, "built agenda");

    occurrences
}

/// Ids of the rows that must be deleted along with the series `series_id`.
pub fn dependent_ids(rows: &[EventRecord], series_id: &str) -> Vec<String> {
    rows.iter()
        .filter(|row| row.is_exception && row.recurring_event_id.as_deref() == Some(series_id))
        .map(|row| row.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{EventOverrides, Exception};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn row(id: &str, title: &str, start: DateTime<Utc>) -> EventRecord {
        EventRecord {
            id: id.into(),
            calendar_id: "cal-1".into(),
            title: title.into(),
            description: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            all_day: false,
            location: None,
            is_recurring: false,
            rrule: None,
            recurring_event_id: None,
            is_exception: false,
            original_start: None,
            is_cancelled: false,
        }
    }

    fn weekly_standup() -> EventRecord {
        EventRecord {
            is_recurring: true,
            rrule: Some("DTSTART:20240101T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE,FR".into()),
            ..row("standup", "Standup", at(1, 9))
        }
    }

    fn first_week() -> Window {
        Window::new(at(1, 0), at(8, 0)).unwrap()
    }

    #[test]
    fn test_agenda_merges_series_and_plain_events() {
        let rows = vec![
            weekly_standup(),
            row("dentist", "Dentist", at(3, 15)),
            row("later", "Next month", at(31, 12) + Duration::days(5)),
        ];

        let titles: Vec<String> = agenda(&rows, &first_week())
            .into_iter()
            .map(|o| format!("{} {}", o.start.format("%d %H"), o.details.title))
            .collect();

        assert_eq!(
            titles,
            vec!["01 09 Standup", "03 09 Standup", "03 15 Dentist", "05 09 Standup"]
        );
    }

    #[test]
    fn test_agenda_applies_exception_rows() {
        let standup = weekly_standup();
        let series = Series::from_record(&standup, &[]);
        let moved = series.reschedule(at(3, 9), at(4, 11), at(4, 12)).unwrap();
        let renamed = series.detach(at(5, 9), EventOverrides::title("Demo")).unwrap();

        let rows = vec![
            standup.clone(),
            EventRecord::from_exception(&standup, &moved),
            EventRecord::from_exception(&standup, &renamed),
        ];

        let occurrences = agenda(&rows, &first_week());
        let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![at(1, 9), at(4, 11), at(5, 9)]);
        assert_eq!(occurrences[1].original_start, Some(at(3, 9)));
        assert_eq!(occurrences[2].title(), "Demo");
        assert!(occurrences[2].is_exception);
    }

    #[test]
    fn test_occurrence_moved_into_next_week() {
        let standup = weekly_standup();
        let series = Series::from_record(&standup, &[]);
        let moved = series.reschedule(at(3, 9), at(10, 11), at(10, 12)).unwrap();
        let rows = vec![standup.clone(), EventRecord::from_exception(&standup, &moved)];

        let first: Vec<_> = agenda(&rows, &first_week()).iter().map(|o| o.start).collect();
        assert_eq!(first, vec![at(1, 9), at(5, 9)]);

        let second_week = Window::new(at(8, 0), at(15, 0)).unwrap();
        let second = agenda(&rows, &second_week);
        let starts: Vec<_> = second.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![at(8, 9), at(10, 9), at(10, 11), at(12, 9)]);
        assert!(second[2].is_exception);
        assert_eq!(second[2].original_start, Some(at(3, 9)));
        assert_eq!(second[2].series_id, "standup");
    }

    #[test]
    fn test_detached_row_does_not_inherit_cleared_fields() {
        let standup = EventRecord {
            description: Some("Daily sync".into()),
            location: Some("Room 4".into()),
            ..weekly_standup()
        };
        let series = Series::from_record(&standup, &[]);
        let exception = series.detach(at(3, 9), EventOverrides::title("Offsite")).unwrap();

        let mut detached = EventRecord::from_exception(&standup, &exception);
        detached.description = None;
        detached.location = None;

        let occurrences = agenda(&[standup, detached], &first_week());
        let offsite = occurrences.iter().find(|o| o.is_exception).unwrap();
        assert_eq!(offsite.title(), "Offsite");
        assert_eq!(offsite.details.description, None);
        assert_eq!(offsite.details.location, None);
    }

    #[test]
    fn test_legacy_and_orphan_exception_rows_are_standalone() {
        let standup = weekly_standup();
        let exception = Exception::detached("standup", at(3, 9), EventOverrides::title("Legacy"));
        let mut legacy = EventRecord::from_exception(&standup, &exception);
        legacy.original_start = None;

        let orphan_source = Exception::detached("gone", at(2, 9), EventOverrides::title("Orphan"));
        let mut orphan = EventRecord::from_exception(&standup, &orphan_source);
        orphan.recurring_event_id = Some("gone".into());

        let rows = vec![standup, legacy, orphan];
        let titles: Vec<String> = agenda(&rows, &first_week())
            .into_iter()
            .map(|o| o.details.title)
            .collect();

        // The legacy row does not replace the Wednesday occurrence
        assert_eq!(titles, vec!["Standup", "Orphan", "Standup", "Legacy", "Standup"]);
    }

    #[test]
    fn test_undecodable_series_shows_detached_rows() {
        let mut broken = weekly_standup();
        broken.rrule = Some("RRULE:FREQ=WEEKLY;BYMONTHDAY=1".into());

        let detached = EventRecord::from_exception(
            &broken,
            &Exception::detached("standup", at(3, 9), EventOverrides::title("Kept")),
        );
        let cancelled =
            EventRecord::from_exception(&broken, &Exception::cancelled("standup", at(5, 9)));

        let rows = vec![broken, detached, cancelled];
        let titles: Vec<String> = agenda(&rows, &first_week())
            .into_iter()
            .map(|o| o.details.title)
            .collect();
        assert_eq!(titles, vec!["Standup", "Kept"]);
    }

    #[test]
    fn test_dependent_ids() {
        let standup = weekly_standup();
        let a = EventRecord::from_exception(&standup, &Exception::cancelled("standup", at(3, 9)));
        let b = EventRecord::from_exception(&standup, &Exception::cancelled("standup", at(5, 9)));
        let ids = vec![a.id.clone(), b.id.clone()];

        let rows = vec![standup, row("dentist", "Dentist", at(3, 15)), a, b];
        assert_eq!(dependent_ids(&rows, "standup"), ids);
        assert!(dependent_ids(&rows, "dentist").is_empty());
    }
}
