//! Occurrence expansion.
//!
//! Walks a [`RecurrenceRule`] forward from its anchor and yields the slots that
//! overlap a [`Window`]. The walk starts close to the window rather than at the
//! anchor: the period index just before the window is computed arithmetically,
//! together with how many occurrences came before it (needed for `COUNT`). Cost
//! is proportional to the occurrences in the window, regardless of how far the
//! window is from the anchor.
//!
//! Stepping happens on wall-clock dates in the rule's time zone. Monthly and
//! yearly rules clamp to the last day of shorter months, always measured from
//! the anchor day, so Jan 31 → Feb 29 → Mar 31.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::rule::{Frequency, RecurrenceRule, Termination, days_from_week_start};
use crate::time::{local_to_utc, utc_to_local};
use crate::window::Window;

/// One scheduled instance of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Expands a rule for a series whose first occurrence lasts `duration`.
#[derive(Debug, Clone, Copy)]
pub struct OccurrenceExpander<'a> {
    rule: &'a RecurrenceRule,
    duration: Duration,
}

impl<'a> OccurrenceExpander<'a> {
    /// `anchor_end` is the end of the first occurrence; every slot reuses the
    /// same duration. An end before the anchor counts as zero length.
    pub fn new(rule: &'a RecurrenceRule, anchor_end: DateTime<Utc>) -> Self {
        Self::with_duration(rule, anchor_end - rule.anchor())
    }

    pub fn with_duration(rule: &'a RecurrenceRule, duration: Duration) -> Self {
        OccurrenceExpander {
            rule,
            duration: duration.max(Duration::zero()),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Lazily yield the slots overlapping `window`, in start order.
    pub fn between(&self, window: &Window) -> Slots<'a> {
        Slots::new(self.rule, self.duration, *window)
    }

    /// Whether the rule schedules an occurrence starting exactly at `instant`.
    pub fn occurs_at(&self, instant: DateTime<Utc>) -> bool {
        let Some(second_after) = instant.checked_add_signed(Duration::seconds(1)) else {
            return false;
        };
        let Ok(window) = Window::new(instant, second_after) else {
            return false;
        };

        Slots::new(self.rule, Duration::seconds(1), window).any(|slot| slot.start == instant)
    }
}

/// Expand `rule` for `window`, collecting the slots.
pub fn expand(rule: &RecurrenceRule, anchor_end: DateTime<Utc>, window: &Window) -> Vec<Slot> {
    let slots: Vec<Slot> = OccurrenceExpander::new(rule, anchor_end)
        .between(window)
        .collect();

    debug!(
        frequency = %rule.frequency(),
        interval = rule.interval(),
        %window,
        count = slots.len(),
        "expanded recurrence rule"
    );

    slots
}

/// Iterator over the slots of a rule inside a window.
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    rule: &'a RecurrenceRule,
    duration: Duration,
    window: Window,
    timezone: Tz,
    anchor_date: NaiveDate,
    anchor_time: NaiveTime,
    /// Weekly only: first day of the week block holding the anchor.
    block_start: NaiveDate,
    /// Weekly only: day offsets inside a block, ascending.
    offsets: Vec<u64>,
    /// Weekly only: offset of the anchor date inside its block.
    anchor_offset: u64,
    period: u64,
    offset_index: usize,
    /// Number of occurrences the series had before the next candidate.
    emitted: u64,
    done: bool,
}

impl<'a> Slots<'a> {
    fn new(rule: &'a RecurrenceRule, duration: Duration, window: Window) -> Self {
        let anchor_local = rule.anchor_local();
        let anchor_date = anchor_local.date();
        let week_start = rule.week_start();

        let anchor_offset = u64::from(days_from_week_start(anchor_date.weekday(), week_start));
        let block_start = anchor_date
            .checked_sub_days(Days::new(anchor_offset))
            .unwrap_or(anchor_date);

        let mut offsets: Vec<u64> = rule
            .effective_weekdays()
            .iter()
            .map(|day| u64::from(days_from_week_start(day, week_start)))
            .collect();
        offsets.sort_unstable();

        let mut slots = Slots {
            rule,
            duration,
            window,
            timezone: rule.timezone(),
            anchor_date,
            anchor_time: anchor_local.time(),
            block_start,
            offsets,
            anchor_offset,
            period: 0,
            offset_index: 0,
            emitted: 0,
            done: window.is_empty(),
        };

        if !slots.done {
            slots.period = slots.first_period();
            slots.emitted = slots.occurrences_before(slots.period);
        }

        slots
    }

    /// Earliest period that could still overlap the window, with one period of
    /// slack so DST offsets and time-of-day never cause a miss.
    fn first_period(&self) -> u64 {
        let Some(threshold) = self.window.start().checked_sub_signed(self.duration) else {
            return 0;
        };
        if threshold <= self.rule.anchor() {
            return 0;
        }

        let threshold_date = utc_to_local(self.timezone, threshold).date();
        let units = match self.rule.frequency() {
            Frequency::Daily => (threshold_date - self.anchor_date).num_days(),
            Frequency::Weekly => {
                let back = u64::from(days_from_week_start(
                    threshold_date.weekday(),
                    self.rule.week_start(),
                ));
                let threshold_block = threshold_date
                    .checked_sub_days(Days::new(back))
                    .unwrap_or(threshold_date);
                (threshold_block - self.block_start).num_days() / 7
            }
            Frequency::Monthly => months_between(self.anchor_date, threshold_date),
            Frequency::Yearly => i64::from(threshold_date.year() - self.anchor_date.year()),
        };

        let periods = units / i64::from(self.rule.interval());
        u64::try_from(periods - 1).unwrap_or(0)
    }

    /// How many occurrences precede the first candidate of `period`.
    fn occurrences_before(&self, period: u64) -> u64 {
        if period == 0 {
            return 0;
        }

        match self.rule.frequency() {
            Frequency::Weekly => {
                let per_block = self.offsets.len() as u64;
                let first_block = self
                    .offsets
                    .iter()
                    .filter(|offset| **offset >= self.anchor_offset)
                    .count() as u64;
                first_block.saturating_add((period - 1).saturating_mul(per_block))
            }
            _ => period,
        }
    }

    /// Date of the next candidate, advancing the walk. `None` once the
    /// calendar arithmetic runs out of range.
    fn next_candidate_date(&mut self) -> Option<NaiveDate> {
        let interval = u64::from(self.rule.interval());

        if self.rule.frequency() == Frequency::Weekly {
            loop {
                if self.offset_index >= self.offsets.len() {
                    self.period += 1;
                    self.offset_index = 0;
                }
                let offset = *self.offsets.get(self.offset_index)?;
                self.offset_index += 1;

                // The anchor's own block only counts days from the anchor on
                if self.period == 0 && offset < self.anchor_offset {
                    continue;
                }

                let days = self
                    .period
                    .checked_mul(interval.checked_mul(7)?)?
                    .checked_add(offset)?;
                return self.block_start.checked_add_days(Days::new(days));
            }
        }

        let steps = self.period.checked_mul(interval)?;
        self.period += 1;

        match self.rule.frequency() {
            Frequency::Daily => self.anchor_date.checked_add_days(Days::new(steps)),
            Frequency::Monthly => self
                .anchor_date
                .checked_add_months(Months::new(u32::try_from(steps).ok()?)),
            Frequency::Yearly => self
                .anchor_date
                .checked_add_months(Months::new(u32::try_from(steps.checked_mul(12)?).ok()?)),
            Frequency::Weekly => None,
        }
    }
}

impl Iterator for Slots<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        while !self.done {
            let Some(date) = self.next_candidate_date() else {
                self.done = true;
                break;
            };

            match self.rule.termination() {
                Termination::AfterCount(n) if self.emitted >= u64::from(n) => {
                    self.done = true;
                    break;
                }
                Termination::Until(until) if date > until => {
                    self.done = true;
                    break;
                }
                _ => {}
            }

            // The anchor may sit in the second pass of a repeated hour
            let start = if date == self.anchor_date {
                self.rule.anchor()
            } else {
                local_to_utc(self.timezone, date.and_time(self.anchor_time))
            };
            if start >= self.window.end() {
                self.done = true;
                break;
            }
            self.emitted += 1;

            let Some(end) = start.checked_add_signed(self.duration) else {
                self.done = true;
                break;
            };
            if self.window.overlaps(start, end) {
                return Some(Slot { start, end });
            }
        }

        None
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let from_months = i64::from(from.year()) * 12 + i64::from(from.month0());
    let to_months = i64::from(to.year()) * 12 + i64::from(to.month0());
    to_months - from_months
}
