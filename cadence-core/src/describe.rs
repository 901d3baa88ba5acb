//! Human-readable rule descriptions, e.g. "every 2 weeks on Monday and Friday, 10 times".

use chrono::{Datelike, Weekday};

use crate::rule::{Frequency, RecurrenceRule, Termination, days_from_week_start};

impl RecurrenceRule {
    /// Describe the rule in English.
    pub fn describe(&self) -> String {
        let mut text = every(self.interval(), self.frequency());
        let anchor = self.anchor_local().date();

        match self.frequency() {
            Frequency::Daily => {}
            Frequency::Weekly => {
                let mut days: Vec<Weekday> = self.effective_weekdays().iter().collect();
                days.sort_by_key(|day| days_from_week_start(*day, self.week_start()));
                let names: Vec<String> = days.iter().map(|day| weekday_name(*day).to_string()).collect();
                text.push_str(" on ");
                text.push_str(&join_list(&names));
            }
            Frequency::Monthly => {
                text.push_str(&format!(" on the {}", ordinal(anchor.day())));
            }
            Frequency::Yearly => {
                text.push_str(&format!(" on {}", anchor.format("%B %-d")));
            }
        }

        match self.termination() {
            Termination::Never => {}
            Termination::AfterCount(1) => text.push_str(", once"),
            Termination::AfterCount(n) => text.push_str(&format!(", {n} times")),
            Termination::Until(date) => {
                text.push_str(&format!(" until {}", date.format("%B %-d, %Y")));
            }
        }

        text
    }
}

fn every(interval: u32, frequency: Frequency) -> String {
    let unit = match frequency {
        Frequency::Daily => "day",
        Frequency::Weekly => "week",
        Frequency::Monthly => "month",
        Frequency::Yearly => "year",
    };

    if interval == 1 {
        format!("every {unit}")
    } else {
        format!("every {interval} {unit}s")
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// "a", "a and b", "a, b and c"
fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_daily() {
        let rule = RecurrenceRule::builder(Frequency::Daily, at(1, 1)).build().unwrap();
        assert_eq!(rule.describe(), "every day");

        let rule = RecurrenceRule::builder(Frequency::Daily, at(1, 1))
            .interval(3)
            .build()
            .unwrap();
        assert_eq!(rule.describe(), "every 3 days");
    }

    #[test]
    fn test_weekly_lists_days_from_week_start() {
        let rule = RecurrenceRule::builder(Frequency::Weekly, at(1, 1))
            .weekdays([Weekday::Fri, Weekday::Sun, Weekday::Mon, Weekday::Wed])
            .count(3)
            .build()
            .unwrap();
        assert_eq!(
            rule.describe(),
            "every week on Monday, Wednesday, Friday and Sunday, 3 times"
        );

        // Without weekdays the anchor's day is used
        let rule = RecurrenceRule::builder(Frequency::Weekly, at(1, 3))
            .interval(2)
            .count(1)
            .build()
            .unwrap();
        assert_eq!(rule.describe(), "every 2 weeks on Wednesday, once");
    }

    #[test]
    fn test_monthly_and_yearly() {
        let rule = RecurrenceRule::builder(Frequency::Monthly, at(1, 31))
            .until(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .build()
            .unwrap();
        assert_eq!(rule.describe(), "every month on the 31st until June 30, 2024");

        let rule = RecurrenceRule::builder(Frequency::Yearly, at(1, 31)).build().unwrap();
        assert_eq!(rule.describe(), "every year on January 31");
    }

    #[test]
    fn test_ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31].into_iter().map(ordinal).collect();
        assert_eq!(
            got,
            vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd", "31st"]
        );
    }
}
