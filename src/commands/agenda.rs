use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{EventRecord, Window, agenda, record::records_from_json};
use chrono_tz::Tz;
use tracing::debug;

use crate::render::render_agenda;

/// Read a JSON export of event rows.
pub async fn read_rows(path: &Path) -> Result<Vec<EventRecord>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;

    let rows = records_from_json(&json)
        .with_context(|| format!("Invalid event rows in {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "read event rows");

    Ok(rows)
}

pub async fn run(path: &Path, window: Window, tz: Tz, json: bool) -> Result<()> {
    let rows = read_rows(path).await?;
    let occurrences = agenda(&rows, &window);

    if json {
        let out =
            serde_json::to_string_pretty(&occurrences).context("Could not serialize agenda")?;
        println!("{out}");
    } else {
        println!("{}", render_agenda(&occurrences, tz));
    }

    Ok(())
}
