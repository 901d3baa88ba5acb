//! Terminal rendering for cadence-core types.
//!
//! Times are shown in the configured zone, so rendering takes it explicitly.

use cadence_core::{Occurrence, RecurrenceRule, Slot, Termination};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self, tz: Tz) -> String;
}

impl Render for Occurrence {
    fn render(&self, tz: Tz) -> String {
        let time = if self.details.all_day {
            format!("{:>13}", "all-day")
        } else {
            format!("{} - {}", clock(self.start, tz), clock(self.end, tz))
        };

        let mut line = format!("{} {}", time, self.details.title);

        if let Some(location) = &self.details.location {
            line.push_str(&format!(" {}", format!("@ {location}").dimmed()));
        }

        if self.is_exception {
            let note = match self.original_start {
                Some(original) if original != self.start => {
                    format!("(moved from {})", local(original, tz).format("%a %b %-d %H:%M"))
                }
                _ => "(edited)".to_string(),
            };
            line.push_str(&format!(" {}", note.yellow()));
        }

        line
    }
}

impl Render for Slot {
    fn render(&self, tz: Tz) -> String {
        format!(
            "{}  {} - {}",
            local(self.start, tz).format("%a %Y-%m-%d").bold(),
            clock(self.start, tz),
            clock(self.end, tz)
        )
    }
}

impl Render for RecurrenceRule {
    fn render(&self, tz: Tz) -> String {
        let termination = match self.termination() {
            Termination::Never => "never".to_string(),
            Termination::AfterCount(n) => format!("after {n}"),
            Termination::Until(date) => format!("until {date}"),
        };

        let lines = [
            format!("{}", self.describe().bold()),
            format!("  Frequency:  {}", self.frequency()),
            format!("  Interval:   {}", self.interval()),
            format!("  Ends:       {termination}"),
            format!("  Time zone:  {}", self.timezone().name()),
            format!(
                "  First:      {}",
                local(self.anchor(), tz).format("%a %Y-%m-%d %H:%M %Z")
            ),
        ];
        lines.join("\n")
    }
}

/// Occurrences grouped under day headings ("Today", "Tomorrow", "Wed Feb 25").
pub fn render_agenda(occurrences: &[Occurrence], tz: Tz) -> String {
    if occurrences.is_empty() {
        return "No events found".dimmed().to_string();
    }

    let today = Utc::now().with_timezone(&tz).date_naive();
    let mut lines = Vec::new();
    let mut current_date: Option<NaiveDate> = None;

    for occurrence in occurrences {
        let date = local(occurrence.start, tz).date_naive();

        if current_date != Some(date) {
            if current_date.is_some() {
                lines.push(String::new());
            }
            lines.push(date_label(date, today).bold().to_string());
            current_date = Some(date);
        }

        lines.push(format!("  {}", occurrence.render(tz)));
    }

    lines.join("\n")
}

fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

fn local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

fn clock(instant: DateTime<Utc>, tz: Tz) -> String {
    format!("{:>5}", local(instant, tz).format("%H:%M"))
}
