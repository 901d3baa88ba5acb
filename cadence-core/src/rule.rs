//! Recurrence rule types.
//!
//! A [`RecurrenceRule`] is the validated, immutable description of how a series
//! repeats. [`RecurrenceConfig`] is the loosely-typed shape the event form edits;
//! converting between the two is where validation happens.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::time::utc_to_local;

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// The `FREQ=` value written to rule text.
    pub fn as_rrule(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// Parse a `FREQ=` value.
    ///
    /// Sub-daily frequencies found in older or imported rules map to `Daily`,
    /// since the expander only walks calendar days and larger units.
    pub fn from_rrule(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "DAILY" | "HOURLY" | "MINUTELY" | "SECONDLY" => Some(Frequency::Daily),
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            "YEARLY" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

const WEEKDAYS_FROM_SUNDAY: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Weekday for an ordinal in the 0=Sunday..6=Saturday numbering the form uses.
pub fn weekday_from_ordinal(ordinal: u8) -> Option<Weekday> {
    WEEKDAYS_FROM_SUNDAY.get(usize::from(ordinal)).copied()
}

/// Ordinal of a weekday in the 0=Sunday..6=Saturday numbering.
pub fn weekday_ordinal(weekday: Weekday) -> u8 {
    // num_days_from_sunday is always < 7
    weekday.num_days_from_sunday() as u8
}

/// Position of `day` in a week that begins on `week_start` (0..=6).
pub fn days_from_week_start(day: Weekday, week_start: Weekday) -> u32 {
    (7 + day.num_days_from_monday() - week_start.num_days_from_monday()) % 7
}

/// A set of weekdays, iterated Sunday first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn single(weekday: Weekday) -> Self {
        WeekdaySet(1 << weekday_ordinal(weekday))
    }

    /// Build a set from 0=Sunday..6=Saturday ordinals, rejecting repeats and
    /// out-of-range values.
    pub fn from_ordinals(ordinals: &[u8]) -> Result<Self, RuleError> {
        let mut set = WeekdaySet::EMPTY;
        for &ordinal in ordinals {
            let weekday =
                weekday_from_ordinal(ordinal).ok_or(RuleError::WeekdayOutOfRange(ordinal))?;
            if !set.insert(weekday) {
                return Err(RuleError::DuplicateWeekday(ordinal));
            }
        }
        Ok(set)
    }

    /// Adds a weekday. Returns false if it was already present.
    pub fn insert(&mut self, weekday: Weekday) -> bool {
        let bit = 1 << weekday_ordinal(weekday);
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday_ordinal(weekday)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAYS_FROM_SUNDAY
            .into_iter()
            .filter(move |weekday| self.contains(*weekday))
    }

    /// Sorted ordinals, Sunday first.
    pub fn ordinals(&self) -> Vec<u8> {
        self.iter().map(weekday_ordinal).collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for weekday in iter {
            set.insert(weekday);
        }
        set
    }
}

/// When a series stops repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    Never,
    /// Stop after this many occurrences.
    AfterCount(u32),
    /// Last date (inclusive, in the rule's time zone) an occurrence may start on.
    Until(NaiveDate),
}

/// A validated recurrence rule.
///
/// Serializes as its rule text (see [`crate::codec`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    weekdays: WeekdaySet,
    termination: Termination,
    anchor: DateTime<Utc>,
    timezone: Tz,
    week_start: Weekday,
}

impl RecurrenceRule {
    /// Start building a rule whose first occurrence starts at `anchor`.
    pub fn builder(frequency: Frequency, anchor: DateTime<Utc>) -> RuleBuilder {
        RuleBuilder {
            frequency,
            anchor,
            interval: 1,
            weekdays: Vec::new(),
            termination: Termination::Never,
            timezone: Tz::UTC,
            week_start: Weekday::Mon,
        }
    }

    /// Build a rule from the event form's configuration.
    ///
    /// The form has no week start of its own; it comes from user settings.
    pub fn from_config(
        anchor: DateTime<Utc>,
        timezone: Tz,
        week_start: Weekday,
        config: &RecurrenceConfig,
    ) -> Result<Self, RuleError> {
        let termination = match config.end_type {
            EndType::Never => Termination::Never,
            EndType::Count => Termination::AfterCount(config.count.ok_or(RuleError::MissingCount)?),
            EndType::Until => Termination::Until(config.until.ok_or(RuleError::MissingUntil)?),
        };

        RecurrenceRule::builder(config.frequency, anchor)
            .interval(config.interval)
            .weekday_ordinals(config.weekdays.as_deref().unwrap_or_default())
            .termination(termination)
            .timezone(timezone)
            .week_start(week_start)
            .build()
    }

    /// Project the rule back onto the form's configuration shape.
    pub fn to_config(&self) -> RecurrenceConfig {
        let (end_type, count, until) = match self.termination {
            Termination::Never => (EndType::Never, None, None),
            Termination::AfterCount(n) => (EndType::Count, Some(n), None),
            Termination::Until(date) => (EndType::Until, None, Some(date)),
        };

        RecurrenceConfig {
            frequency: self.frequency,
            interval: self.interval,
            weekdays: (self.frequency == Frequency::Weekly).then(|| self.weekdays.ordinals()),
            end_type,
            count,
            until,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Weekdays as configured. Empty means "the anchor's weekday".
    pub fn weekdays(&self) -> WeekdaySet {
        self.weekdays
    }

    /// Weekdays a weekly rule actually lands on.
    pub fn effective_weekdays(&self) -> WeekdaySet {
        if self.weekdays.is_empty() {
            WeekdaySet::single(self.anchor_local().weekday())
        } else {
            self.weekdays
        }
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// The anchor as wall-clock time in the rule's zone.
    pub fn anchor_local(&self) -> NaiveDateTime {
        utc_to_local(self.timezone, self.anchor)
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.to_string()
    }
}

impl TryFrom<String> for RecurrenceRule {
    type Error = crate::error::DecodeError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

/// Builder for [`RecurrenceRule`]; validation happens in [`RuleBuilder::build`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    frequency: Frequency,
    anchor: DateTime<Utc>,
    interval: u32,
    weekdays: Vec<u8>,
    termination: Termination,
    timezone: Tz,
    week_start: Weekday,
}

impl RuleBuilder {
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn weekdays<I: IntoIterator<Item = Weekday>>(mut self, weekdays: I) -> Self {
        self.weekdays = weekdays.into_iter().map(weekday_ordinal).collect();
        self
    }

    /// Weekdays as 0=Sunday..6=Saturday ordinals.
    pub fn weekday_ordinals(mut self, ordinals: &[u8]) -> Self {
        self.weekdays = ordinals.to_vec();
        self
    }

    pub fn termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn count(self, count: u32) -> Self {
        self.termination(Termination::AfterCount(count))
    }

    pub fn until(self, date: NaiveDate) -> Self {
        self.termination(Termination::Until(date))
    }

    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn build(self) -> Result<RecurrenceRule, RuleError> {
        if self.interval < 1 {
            return Err(RuleError::InvalidInterval(self.interval));
        }

        let weekdays = WeekdaySet::from_ordinals(&self.weekdays)?;
        if !weekdays.is_empty() && self.frequency != Frequency::Weekly {
            return Err(RuleError::WeekdaysRequireWeekly);
        }

        if self.termination == Termination::AfterCount(0) {
            return Err(RuleError::InvalidCount);
        }

        // Rule text stores whole seconds
        let anchor = self.anchor.trunc_subsecs(0);

        Ok(RecurrenceRule {
            frequency: self.frequency,
            interval: self.interval,
            weekdays,
            termination: self.termination,
            anchor,
            timezone: self.timezone,
            week_start: self.week_start,
        })
    }
}

/// How the event form expresses the end of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    Never,
    Count,
    Until,
}

fn default_interval() -> u32 {
    1
}

/// Recurrence settings as edited in the event form.
///
/// Fields are only meaningful in combination (`count` with `end_type = count`,
/// and so on); [`RecurrenceRule::from_config`] checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceConfig {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// 0=Sunday..6=Saturday
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekdays: Option<Vec<u8>>,
    pub end_type: EndType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
}

impl Default for RecurrenceConfig {
    /// A new recurring event starts out as "weekly, forever".
    fn default() -> Self {
        RecurrenceConfig {
            frequency: Frequency::Weekly,
            interval: 1,
            weekdays: None,
            end_type: EndType::Never,
            count: None,
            until: None,
        }
    }
}
