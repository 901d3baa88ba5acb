//! A recurring event together with its exceptions.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{trace, warn};

use crate::error::{CadenceError, CadenceResult};
use crate::exception::{EventOverrides, Exception, ExceptionKind, ExceptionSet};
use crate::expand::OccurrenceExpander;
use crate::occurrence::{EventDetails, Occurrence};
use crate::record::EventRecord;
use crate::resolve::resolve;
use crate::rule::RecurrenceRule;
use crate::window::Window;

/// An event's base definition. Without a rule it is a plain one-off event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    rule: Option<RecurrenceRule>,
    details: EventDetails,
    exceptions: ExceptionSet,
}

impl Series {
    pub fn new(
        id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        details: EventDetails,
    ) -> Self {
        Series {
            id: id.into(),
            start,
            end: end.max(start),
            rule: None,
            details,
            exceptions: ExceptionSet::new(),
        }
    }

    /// Make the series repeat. Occurrences start at the rule's anchor.
    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        let duration = self.duration();
        self.start = rule.anchor();
        self.end = self.start.checked_add_signed(duration).unwrap_or(self.start);
        self.rule = Some(rule);
        self
    }

    pub fn with_exceptions(mut self, exceptions: impl IntoIterator<Item = Exception>) -> Self {
        self.exceptions.extend(exceptions);
        self
    }

    /// Build a series from its row and the exception rows pointing at it.
    ///
    /// Rule text that fails to decode is logged and the event is treated as
    /// non-recurring. Each exception row hides the occurrence it replaces;
    /// detached rows are shown from their own fields by [`crate::agenda`].
    /// Rows that are not exceptions of this series are skipped.
    pub fn from_record(record: &EventRecord, exception_rows: &[&EventRecord]) -> Self {
        let mut series = Series::new(
            record.id.clone(),
            record.start_time,
            record.end_time,
            record.details(),
        );

        let rule = match (record.is_recurring, record.rrule.as_deref()) {
            (true, Some(text)) => match text.parse::<RecurrenceRule>() {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(event = %record.id, error = %e, "Ignoring undecodable recurrence rule");
                    None
                }
            },
            _ => None,
        };

        if let Some(rule) = rule {
            series = series.with_rule(rule);
        }

        for row in exception_rows {
            match row.suppression() {
                Some(exception) if exception.series_id == series.id => {
                    series.exceptions.insert(exception);
                }
                _ => trace!(row = %row.id, series = %series.id, "Skipping unrelated row"),
            }
        }

        series
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.rule.as_ref()
    }

    pub fn is_recurring(&self) -> bool {
        self.rule.is_some()
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn exceptions(&self) -> &ExceptionSet {
        &self.exceptions
    }

    /// Occurrences overlapping `window`, with exceptions applied, sorted by start.
    ///
    /// A moved occurrence is shown where it was moved to: its slot may lie
    /// outside the window while the moved instance falls inside, or the
    /// other way round.
    pub fn occurrences(&self, window: &Window) -> Vec<Occurrence> {
        let Some(rule) = &self.rule else {
            if window.overlaps(self.start, self.end) {
                return vec![self.occurrence_at(self.start)];
            }
            return Vec::new();
        };

        let expander = OccurrenceExpander::with_duration(rule, self.duration());
        let mut generated: Vec<Occurrence> = expander
            .between(window)
            .map(|slot| {
                Occurrence::generated(self.id.clone(), slot.start, slot.end, self.details.clone())
            })
            .collect();

        let slots: HashSet<DateTime<Utc>> = generated.iter().map(|o| o.start).collect();
        let moved_in: Vec<Occurrence> = self
            .exceptions
            .iter()
            .filter(|exception| !slots.contains(&exception.original_start))
            .filter(|exception| match &exception.kind {
                ExceptionKind::Detached(overrides) => {
                    overrides.start.is_some() || overrides.end.is_some()
                }
                ExceptionKind::Cancelled => false,
            })
            .filter(|exception| expander.occurs_at(exception.original_start))
            .map(|exception| self.occurrence_at(exception.original_start))
            .collect();
        generated.extend(moved_in);

        let mut occurrences = resolve(generated, &self.exceptions);
        occurrences.retain(|o| window.overlaps(o.start, o.end));
        occurrences.sort_by_key(|o| o.start);
        occurrences
    }

    fn occurrence_at(&self, start: DateTime<Utc>) -> Occurrence {
        let end = start.checked_add_signed(self.duration()).unwrap_or(start);
        Occurrence::generated(self.id.clone(), start, end, self.details.clone())
    }

    /// Create the exception that edits just the occurrence at `original_start`.
    pub fn detach(
        &self,
        original_start: DateTime<Utc>,
        overrides: EventOverrides,
    ) -> CadenceResult<Exception> {
        let original_start = self.check_occurrence(original_start)?;
        Ok(Exception::detached(self.id.clone(), original_start, overrides))
    }

    /// Create the exception that removes the occurrence at `original_start`.
    pub fn cancel(&self, original_start: DateTime<Utc>) -> CadenceResult<Exception> {
        let original_start = self.check_occurrence(original_start)?;
        Ok(Exception::cancelled(self.id.clone(), original_start))
    }

    /// Move one occurrence, as when it is dragged on the grid.
    ///
    /// The occurrence is detached with new times; the rest of the series
    /// stays where it is.
    pub fn reschedule(
        &self,
        original_start: DateTime<Utc>,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> CadenceResult<Exception> {
        self.detach(original_start, EventOverrides::times(new_start, new_end))
    }

    fn check_occurrence(&self, original_start: DateTime<Utc>) -> CadenceResult<DateTime<Utc>> {
        let Some(rule) = &self.rule else {
            return Err(CadenceError::NotRecurring(self.id.clone()));
        };

        let original_start = original_start.trunc_subsecs(0);
        if !OccurrenceExpander::with_duration(rule, self.duration()).occurs_at(original_start) {
            return Err(CadenceError::NotAnOccurrence {
                series_id: self.id.clone(),
                start: original_start,
            });
        }

        Ok(original_start)
    }
}
