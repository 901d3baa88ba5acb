//! Per-occurrence exceptions to a recurring series.
//!
//! An exception is keyed by the start the rule originally scheduled for the
//! occurrence it replaces. That key survives the occurrence being moved, so a
//! rescheduled instance still lines up with its slot on the next expansion.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields an exception replaces on its occurrence. `None` keeps the series value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl EventOverrides {
    pub fn title(title: impl Into<String>) -> Self {
        EventOverrides {
            title: Some(title.into()),
            ..EventOverrides::default()
        }
    }

    pub fn times(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventOverrides {
            start: Some(start),
            end: Some(end),
            ..EventOverrides::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == EventOverrides::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExceptionKind {
    /// The occurrence is shown with these fields replaced.
    Detached(EventOverrides),
    /// The occurrence is not shown at all.
    Cancelled,
}

/// A persisted override of one occurrence of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exception {
    pub id: String,
    pub series_id: String,
    pub original_start: DateTime<Utc>,
    pub kind: ExceptionKind,
}

impl Exception {
    /// New exception with a fresh id.
    pub fn new(
        series_id: impl Into<String>,
        original_start: DateTime<Utc>,
        kind: ExceptionKind,
    ) -> Self {
        Exception {
            id: Uuid::new_v4().to_string(),
            series_id: series_id.into(),
            original_start: original_start.trunc_subsecs(0),
            kind,
        }
    }

    pub fn detached(
        series_id: impl Into<String>,
        original_start: DateTime<Utc>,
        overrides: EventOverrides,
    ) -> Self {
        Self::new(series_id, original_start, ExceptionKind::Detached(overrides))
    }

    pub fn cancelled(series_id: impl Into<String>, original_start: DateTime<Utc>) -> Self {
        Self::new(series_id, original_start, ExceptionKind::Cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ExceptionKind::Cancelled)
    }
}

/// The exceptions of one series, at most one per original start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionSet {
    by_start: BTreeMap<DateTime<Utc>, Exception>,
}

impl ExceptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exception, returning the one it replaced at the same start.
    ///
    /// Keys are whole seconds, matching the precision of generated starts.
    pub fn insert(&mut self, exception: Exception) -> Option<Exception> {
        let key = exception.original_start.trunc_subsecs(0);
        self.by_start.insert(key, exception)
    }

    pub fn get(&self, original_start: DateTime<Utc>) -> Option<&Exception> {
        self.by_start.get(&original_start.trunc_subsecs(0))
    }

    pub fn remove(&mut self, original_start: DateTime<Utc>) -> Option<Exception> {
        self.by_start.remove(&original_start.trunc_subsecs(0))
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    /// Exceptions ordered by original start.
    pub fn iter(&self) -> impl Iterator<Item = &Exception> {
        self.by_start.values()
    }
}

impl FromIterator<Exception> for ExceptionSet {
    fn from_iter<I: IntoIterator<Item = Exception>>(iter: I) -> Self {
        let mut set = ExceptionSet::new();
        for exception in iter {
            set.insert(exception);
        }
        set
    }
}

impl Extend<Exception> for ExceptionSet {
    fn extend<I: IntoIterator<Item = Exception>>(&mut self, iter: I) {
        for exception in iter {
            self.insert(exception);
        }
    }
}
