//! Wall-clock conversions between a rule's time zone and UTC.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (the repeated hour when clocks go back) resolve to the
/// earlier instant. Times inside a DST gap are moved forward by an hour.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return dt.with_timezone(&Utc);
    }

    local
        .checked_add_signed(Duration::hours(1))
        .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

/// Wall-clock time of `instant` in `tz`.
pub fn utc_to_local(tz: Tz, instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Berlin;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_plain_conversion() {
        let utc = local_to_utc(Berlin, naive(2024, 1, 15, 9, 0));
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap());
        assert_eq!(utc_to_local(Berlin, utc), naive(2024, 1, 15, 9, 0));
    }

    #[test]
    fn test_gap_moves_forward() {
        // 2024-03-31 02:30 does not exist in Berlin; clocks jump 02:00 -> 03:00
        let utc = local_to_utc(Berlin, naive(2024, 3, 31, 2, 30));
        assert_eq!(utc_to_local(Berlin, utc), naive(2024, 3, 31, 3, 30));
    }

    #[test]
    fn test_ambiguous_takes_earliest() {
        // 2024-10-27 02:30 happens twice in Berlin; first at 00:30 UTC
        let utc = local_to_utc(Berlin, naive(2024, 10, 27, 2, 30));
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
    }
}
