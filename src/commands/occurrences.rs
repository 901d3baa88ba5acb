use anyhow::{Context, Result};
use cadence_core::{OccurrenceExpander, RecurrenceRule, Window};
use chrono::Duration;
use chrono_tz::Tz;
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(text: &str, duration: Duration, window: Window, tz: Tz) -> Result<()> {
    let rule: RecurrenceRule = text.parse().context("Could not decode recurrence rule")?;

    let mut found = 0usize;
    for slot in OccurrenceExpander::with_duration(&rule, duration).between(&window) {
        println!("{}", slot.render(tz));
        found += 1;
    }

    if found == 0 {
        println!("{}", "No occurrences in this window".dimmed());
    }

    Ok(())
}
