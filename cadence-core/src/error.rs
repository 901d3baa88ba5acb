//! Error types for the cadence core.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Validation failures raised while building a [`RecurrenceRule`](crate::rule::RecurrenceRule).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Interval must be at least 1, got {0}")]
    InvalidInterval(u32),

    #[error("Weekday ordinal {0} is out of range (expected 0=Sunday..6=Saturday)")]
    WeekdayOutOfRange(u8),

    #[error("Weekday ordinal {0} is listed more than once")]
    DuplicateWeekday(u8),

    #[error("Weekdays can only be set on weekly rules")]
    WeekdaysRequireWeekly,

    #[error("Occurrence count must be at least 1")]
    InvalidCount,

    #[error("End type 'count' requires a count")]
    MissingCount,

    #[error("End type 'until' requires an end date")]
    MissingUntil,
}

/// Failures while reading the stored rule text.
///
/// Callers are expected to treat any of these as "the event does not repeat".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Rule text is empty")]
    Empty,

    #[error("Rule text has no DTSTART line")]
    MissingStart,

    #[error("Rule text has no RRULE line")]
    MissingRule,

    #[error("RRULE has no FREQ")]
    MissingFrequency,

    #[error("Unknown frequency '{0}'")]
    UnknownFrequency(String),

    #[error("Malformed rule part '{0}'")]
    MalformedPart(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Unsupported rule feature: {0}")]
    Unsupported(String),

    #[error("Rule sets both COUNT and UNTIL")]
    ConflictingTermination,

    #[error("Invalid date-time '{0}'")]
    InvalidDateTime(String),

    #[error("Unknown time zone '{0}'")]
    UnknownTimezone(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Errors that can occur in cadence operations.
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("Invalid recurrence rule: {0}")]
    Rule(#[from] RuleError),

    #[error("Could not decode recurrence rule: {0}")]
    Decode(#[from] DecodeError),

    #[error("Event '{0}' does not repeat")]
    NotRecurring(String),

    #[error("Series '{series_id}' has no occurrence starting at {start}")]
    NotAnOccurrence {
        series_id: String,
        start: DateTime<Utc>,
    },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for cadence operations.
pub type CadenceResult<T> = Result<T, CadenceError>;
