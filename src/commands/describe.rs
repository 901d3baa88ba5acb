use anyhow::{Context, Result};
use cadence_core::RecurrenceRule;
use chrono_tz::Tz;
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(text: &str, tz: Tz, form: bool) -> Result<()> {
    let rule: RecurrenceRule = text.parse().context("Could not decode recurrence rule")?;

    if form {
        let json = serde_json::to_string_pretty(&rule.to_config())
            .context("Could not serialize recurrence form")?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", rule.render(tz));
    println!();
    println!("{}", rule.to_string().dimmed());

    Ok(())
}
