use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{EventOverrides, EventRecord, Exception, Series};
use chrono::{DateTime, Utc};

use super::agenda::read_rows;

pub enum Edit {
    Override(EventOverrides),
    Cancel,
}

/// Print the exception row for one occurrence of `series_id`, ready to insert.
pub async fn run(path: &Path, series_id: &str, original_start: DateTime<Utc>, edit: Edit) -> Result<()> {
    let rows = read_rows(path).await?;
    let row = exception_row(&rows, series_id, original_start, edit)?;

    let json = serde_json::to_string_pretty(&row).context("Could not serialize event row")?;
    println!("{json}");

    Ok(())
}

pub fn exception_row(
    rows: &[EventRecord],
    series_id: &str,
    original_start: DateTime<Utc>,
    edit: Edit,
) -> Result<EventRecord> {
    let series_row = rows
        .iter()
        .find(|row| row.id == series_id)
        .ok_or_else(|| anyhow::anyhow!("Event '{series_id}' not found"))?;

    let existing: Vec<&EventRecord> = rows
        .iter()
        .filter(|row| row.recurring_event_id.as_deref() == Some(series_id))
        .collect();
    let series = Series::from_record(series_row, &existing);

    let exception: Exception = match edit {
        Edit::Override(overrides) => series.detach(original_start, overrides)?,
        Edit::Cancel => series.cancel(original_start)?,
    };

    Ok(EventRecord::from_exception(series_row, &exception))
}
