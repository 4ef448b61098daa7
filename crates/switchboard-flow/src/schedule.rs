//! Appointment synthesis.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};

/// Returns the next weekday after `now`, skipping Saturday and Sunday, at
/// `hour`:00.
///
/// `hour` is clamped to 0..=23, so the result is always constructible.
pub fn next_weekday_at(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let mut day = now.date_naive() + Days::new(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day = day + Days::new(1);
    }

    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    day.and_time(time).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 15, 30, 0).unwrap()
    }

    #[test]
    fn midweek_rolls_to_next_day() {
        // Tuesday 2025-03-11 → Wednesday 2025-03-12.
        let appt = next_weekday_at(at(2025, 3, 11), 10);
        assert_eq!(appt, Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap());
    }

    #[test]
    fn friday_rolls_to_monday() {
        // Friday 2025-03-14 → Monday 2025-03-17.
        let appt = next_weekday_at(at(2025, 3, 14), 10);
        assert_eq!(appt, Utc.with_ymd_and_hms(2025, 3, 17, 10, 0, 0).unwrap());
        assert_eq!(appt.weekday(), Weekday::Mon);
    }

    #[test]
    fn saturday_rolls_to_monday() {
        let appt = next_weekday_at(at(2025, 3, 15), 10);
        assert_eq!(appt.weekday(), Weekday::Mon);
    }

    #[test]
    fn sunday_rolls_to_monday() {
        let appt = next_weekday_at(at(2025, 3, 16), 10);
        assert_eq!(appt.weekday(), Weekday::Mon);
    }

    #[test]
    fn out_of_range_hour_is_clamped() {
        let appt = next_weekday_at(at(2025, 3, 11), 99);
        assert_eq!(appt.time(), NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    }
}
