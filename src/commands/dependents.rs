use std::path::Path;

use anyhow::Result;
use cadence_core::dependent_ids;

use super::agenda::read_rows;

/// Print the ids of exception rows to delete together with a series.
pub async fn run(path: &Path, series_id: &str) -> Result<()> {
    let rows = read_rows(path).await?;

    if !rows.iter().any(|row| row.id == series_id) {
        anyhow::bail!("Event '{}' not found in {}", series_id, path.display());
    }

    for id in dependent_ids(&rows, series_id) {
        println!("{id}");
    }

    Ok(())
}
