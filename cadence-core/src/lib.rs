//! Recurrence core for the cadence calendar.
//!
//! This crate turns stored recurrence rules into the concrete occurrences a
//! calendar view shows:
//! - `rule` and `codec` for building, validating and storing rules
//! - `expand` for walking a rule over a visible window
//! - `exception` and `resolve` for single-occurrence edits
//! - `series`, `record` and `agenda` for working from data-store rows

pub mod agenda;
pub mod codec;
pub mod describe;
pub mod error;
pub mod exception;
pub mod expand;
pub mod occurrence;
pub mod record;
pub mod resolve;
pub mod rule;
pub mod series;
pub mod time;
pub mod window;

pub use agenda::{agenda, dependent_ids};
pub use codec::{decode, encode};
pub use error::{CadenceError, CadenceResult, DecodeError, RuleError};
pub use exception::{EventOverrides, Exception, ExceptionKind, ExceptionSet};
pub use expand::{OccurrenceExpander, Slot, expand};
pub use occurrence::{EventDetails, Occurrence};
pub use record::EventRecord;
pub use resolve::resolve;
pub use rule::{
    EndType, Frequency, RecurrenceConfig, RecurrenceRule, RuleBuilder, Termination, WeekdaySet,
};
pub use series::Series;
pub use window::{View, Window};
