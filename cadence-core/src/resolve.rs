//! Merging generated occurrences with a series' exceptions.

use tracing::trace;

use crate::exception::{EventOverrides, ExceptionKind, ExceptionSet};
use crate::occurrence::Occurrence;

/// Apply `exceptions` to generated `occurrences`.
///
/// Matching is by generated start. A detachment replaces the overridden fields
/// and marks the instance as an exception; a cancellation drops it.
/// Exceptions with no matching occurrence are ignored. Input order is kept,
/// and moved instances are not checked against any window.
pub fn resolve(occurrences: Vec<Occurrence>, exceptions: &ExceptionSet) -> Vec<Occurrence> {
    if exceptions.is_empty() {
        return occurrences;
    }

    let mut matched = 0usize;
    let resolved: Vec<Occurrence> = occurrences
        .into_iter()
        .filter_map(|occurrence| match exceptions.get(occurrence.start) {
            None => Some(occurrence),
            Some(exception) => {
                matched += 1;
                match &exception.kind {
                    ExceptionKind::Cancelled => None,
                    ExceptionKind::Detached(overrides) => Some(apply(occurrence, overrides)),
                }
            }
        })
        .collect();

    trace!(
        matched,
        skipped = exceptions.len().saturating_sub(matched),
        "resolved exceptions"
    );

    resolved
}

fn apply(mut occurrence: Occurrence, overrides: &EventOverrides) -> Occurrence {
    let generated_start = occurrence.start;
    let duration = occurrence.duration();

    if let Some(start) = overrides.start {
        occurrence.start = start;
        occurrence.end = start.checked_add_signed(duration).unwrap_or(start);
    }
    if let Some(end) = overrides.end {
        occurrence.end = end.max(occurrence.start);
    }

    let details = &mut occurrence.details;
    if let Some(title) = &overrides.title {
        details.title = title.clone();
    }
    if let Some(description) = &overrides.description {
        details.description = Some(description.clone());
    }
    if let Some(location) = &overrides.location {
        details.location = Some(location.clone());
    }
    if let Some(all_day) = overrides.all_day {
        details.all_day = all_day;
    }

    occurrence.is_exception = true;
    occurrence.original_start = Some(generated_start);
    occurrence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::Exception;
    use crate::expand::expand;
    use crate::occurrence::EventDetails;
    use crate::rule::{Frequency, RecurrenceRule};
    use crate::window::Window;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    /// Daily every other day, Day 0 through Day 10.
    fn generated() -> Vec<Occurrence> {
        let rule = RecurrenceRule::builder(Frequency::Daily, day(0))
            .interval(2)
            .until(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap())
            .build()
            .unwrap();
        let window = Window::new(day(0), day(11)).unwrap();

        expand(&rule, day(0) + Duration::hours(1), &window)
            .into_iter()
            .map(|slot| Occurrence::generated("evt-1", slot.start, slot.end, EventDetails::new("Run")))
            .collect()
    }

    #[test]
    fn test_override_replaces_only_its_occurrence() {
        let exceptions: ExceptionSet =
            [Exception::detached("evt-1", day(4), EventOverrides::title("Rescheduled"))]
                .into_iter()
                .collect();

        let before = generated();
        let after = resolve(before.clone(), &exceptions);
        assert_eq!(after.len(), 6);

        for (original, resolved) in before.iter().zip(&after) {
            if original.start == day(4) {
                assert_eq!(resolved.title(), "Rescheduled");
                assert!(resolved.is_exception);
                assert_eq!(resolved.original_start, Some(day(4)));
                assert_eq!(resolved.start, day(4));
                assert_eq!(resolved.end, original.end);
            } else {
                assert_eq!(resolved, original);
            }
        }
    }

    #[test]
    fn test_cancellation_drops_occurrence() {
        let exceptions: ExceptionSet = [Exception::cancelled("evt-1", day(6))].into_iter().collect();
        let starts: Vec<_> = resolve(generated(), &exceptions)
            .iter()
            .map(|o| o.start)
            .collect();
        assert_eq!(starts, vec![day(0), day(2), day(4), day(8), day(10)]);
    }

    #[test]
    fn test_unmatched_exceptions_are_ignored() {
        let exceptions: ExceptionSet = [
            Exception::cancelled("evt-1", day(3)),
            Exception::detached("evt-1", day(40), EventOverrides::title("Never seen")),
        ]
        .into_iter()
        .collect();

        assert_eq!(resolve(generated(), &exceptions), generated());
    }

    #[test]
    fn test_moved_start_keeps_duration() {
        let moved = day(4) + Duration::hours(5);
        let overrides = EventOverrides {
            start: Some(moved),
            ..EventOverrides::default()
        };
        let exceptions: ExceptionSet = [Exception::detached("evt-1", day(4), overrides)]
            .into_iter()
            .collect();

        let resolved = resolve(generated(), &exceptions);
        let detached = resolved.iter().find(|o| o.is_exception).unwrap();
        assert_eq!(detached.start, moved);
        assert_eq!(detached.end, moved + Duration::hours(1));
        assert_eq!(detached.original_start, Some(day(4)));
    }

    #[test]
    fn test_moved_start_and_end() {
        let exceptions: ExceptionSet = [Exception::detached(
            "evt-1",
            day(2),
            EventOverrides::times(day(3), day(3) + Duration::hours(3)),
        )]
        .into_iter()
        .collect();

        let resolved = resolve(generated(), &exceptions);
        assert_eq!(resolved[1].start, day(3));
        assert_eq!(resolved[1].duration(), Duration::hours(3));
        // Order follows the input, not the moved times
        assert_eq!(resolved[2].start, day(4));
    }

    #[test]
    fn test_start_at_end_of_time_does_not_overflow() {
        let overrides = EventOverrides {
            start: Some(DateTime::<Utc>::MAX_UTC),
            ..EventOverrides::default()
        };
        let exceptions: ExceptionSet = [Exception::detached("evt-1", day(2), overrides)]
            .into_iter()
            .collect();

        let resolved = resolve(generated(), &exceptions);
        assert_eq!(resolved[1].start, DateTime::<Utc>::MAX_UTC);
        assert_eq!(resolved[1].end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_end_before_start_collapses() {
        let overrides = EventOverrides {
            end: Some(day(0) - Duration::hours(2)),
            ..EventOverrides::default()
        };
        let exceptions: ExceptionSet = [Exception::detached("evt-1", day(0), overrides)]
            .into_iter()
            .collect();

        let resolved = resolve(generated(), &exceptions);
        assert_eq!(resolved[0].end, resolved[0].start);
    }
}
