use anyhow::{Context, Result};
use cadence_core::{Frequency, RecurrenceConfig, RecurrenceRule, Termination};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// What the user asked for, either as flags or as the event form's JSON.
pub enum RuleSource {
    Flags {
        frequency: Frequency,
        interval: u32,
        weekdays: Vec<Weekday>,
        count: Option<u32>,
        until: Option<NaiveDate>,
    },
    Form(String),
}

pub fn run(source: RuleSource, start: DateTime<Utc>, tz: Tz, week_start: Weekday) -> Result<()> {
    let rule = build_rule(source, start, tz, week_start)?;

    println!("{}", rule);
    println!("{}", rule.describe().dimmed());

    Ok(())
}

pub fn build_rule(
    source: RuleSource,
    start: DateTime<Utc>,
    tz: Tz,
    week_start: Weekday,
) -> Result<RecurrenceRule> {
    match source {
        RuleSource::Flags {
            frequency,
            interval,
            weekdays,
            count,
            until,
        } => {
            let termination = match (count, until) {
                (Some(n), None) => Termination::AfterCount(n),
                (None, Some(date)) => Termination::Until(date),
                (None, None) => Termination::Never,
                (Some(_), Some(_)) => anyhow::bail!("--count and --until cannot be combined"),
            };

            RecurrenceRule::builder(frequency, start)
                .interval(interval)
                .weekdays(weekdays)
                .termination(termination)
                .timezone(tz)
                .week_start(week_start)
                .build()
                .context("Invalid recurrence")
        }
        RuleSource::Form(json) => {
            let config: RecurrenceConfig =
                serde_json::from_str(&json).context("Could not parse recurrence form JSON")?;
            let rule = RecurrenceRule::from_config(start, tz, week_start, &config)
                .context("Invalid recurrence")?;
            Ok(rule)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn flags_build_weekly_rule() {
        let source = RuleSource::Flags {
            frequency: Frequency::Weekly,
            interval: 1,
            weekdays: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            count: Some(3),
            until: None,
        };
        let rule = build_rule(source, monday(), Tz::UTC, Weekday::Mon).unwrap();

        assert_eq!(
            rule.to_string(),
            "DTSTART:20240101T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE,FR;COUNT=3"
        );
    }

    #[test]
    fn form_json_builds_rule() {
        let source = RuleSource::Form(r#"{"frequency":"daily","interval":2,"endType":"never"}"#.into());
        let rule = build_rule(source, monday(), Tz::UTC, Weekday::Mon).unwrap();
        assert_eq!(rule.describe(), "every 2 days");
    }

    #[test]
    fn form_json_uses_configured_week_start() {
        let source = RuleSource::Form(r#"{"frequency":"weekly","interval":2,"endType":"never"}"#.into());
        let rule = build_rule(source, monday(), Tz::UTC, Weekday::Sun).unwrap();

        assert_eq!(rule.week_start(), Weekday::Sun);
        assert!(rule.to_string().ends_with(";WKST=SU"));
    }

    #[test]
    fn count_and_until_conflict() {
        let source = RuleSource::Flags {
            frequency: Frequency::Daily,
            interval: 1,
            weekdays: Vec::new(),
            count: Some(3),
            until: NaiveDate::from_ymd_opt(2024, 2, 1),
        };
        assert!(build_rule(source, monday(), Tz::UTC, Weekday::Mon).is_err());
    }

    #[test]
    fn invalid_form_is_rejected() {
        let source = RuleSource::Form(r#"{"frequency":"daily","interval":0,"endType":"never"}"#.into());
        assert!(build_rule(source, monday(), Tz::UTC, Weekday::Mon).is_err());
    }
}
