//! Concrete event instances as the calendar grid renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presentational fields shared by a series and all of its occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub all_day: bool,
}

impl EventDetails {
    pub fn new(title: impl Into<String>) -> Self {
        EventDetails {
            title: title.into(),
            ..EventDetails::default()
        }
    }
}

/// One instance of an event. Derived on every render and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub series_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Set when an exception replaced the generated instance, or when the
    /// instance is a detached row of a series.
    pub is_exception: bool,
    /// Where the rule originally scheduled this instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_start: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: EventDetails,
}

impl Occurrence {
    /// An instance exactly as the rule generated it.
    pub fn generated(
        series_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        details: EventDetails,
    ) -> Self {
        Occurrence {
            series_id: series_id.into(),
            start,
            end,
            is_exception: false,
            original_start: None,
            details,
        }
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}
