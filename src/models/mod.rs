pub mod chain;
pub mod index;
pub mod rates;
pub mod term;

/// Common traits shared by the calculation components
pub mod traits {
    use chrono::NaiveDate;
    use std::borrow::Cow;

    use crate::error::CalcResult;
    use crate::models::rates::RateCurve;

    /// Anything able to hand out the treasury curve for a quote date.
    pub trait RateSource {
        fn curve_for(&self, date: NaiveDate) -> CalcResult<Cow<'_, RateCurve>>;
    }
}

/// Time-to-expiration helpers using CBOE's minute convention
pub mod utils {
    use chrono::{Datelike, NaiveDate, Weekday};

    pub const MINUTES_PER_DAY: i64 = 1_440;
    pub const MINUTES_PER_YEAR: i64 = 525_600;
    /// Minutes in the 30-day target horizon
    pub const MINUTES_30_DAYS: i64 = 30 * MINUTES_PER_DAY;
    /// 09:30, standard SPX (AM) settlement
    pub const MINUTES_AM_SETTLEMENT: i64 = 570;
    /// 16:00, SPXW (PM) settlement
    pub const MINUTES_PM_SETTLEMENT: i64 = 960;

    /// Calendar days between quote date and expiry.
    pub fn days_to_expiry(quote_date: NaiveDate, expiry: NaiveDate) -> i64 {
        (expiry - quote_date).num_days()
    }

    /// Minutes from the snapshot time to settlement:
    /// `M_current + M_settlement + M_other`, where `M_other` covers the whole days
    /// strictly between quote day and expiration day.
    pub fn minutes_to_expiry(
        quote_date: NaiveDate,
        quote_time_minutes: i64,
        expiry: NaiveDate,
        settlement_minutes: i64,
    ) -> i64 {
        let dte = days_to_expiry(quote_date, expiry);
        if dte <= 0 {
            return (settlement_minutes - quote_time_minutes).max(0);
        }
        let current = MINUTES_PER_DAY - quote_time_minutes;
        let other = (dte - 1) * MINUTES_PER_DAY;
        current + settlement_minutes + other
    }

    /// Year fraction for a minute count.
    pub fn years_from_minutes(minutes: i64) -> f64 {
        minutes as f64 / MINUTES_PER_YEAR as f64
    }

    pub fn is_friday(date: NaiveDate) -> bool {
        date.weekday() == Weekday::Fri
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn d(y: i32, m: u32, day: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, day).unwrap()
        }

        #[test]
        fn test_pm_settlement_at_close_is_whole_days() {
            let minutes = minutes_to_expiry(d(2024, 1, 2), 960, d(2024, 1, 22), 960);
            assert_eq!(minutes, 20 * MINUTES_PER_DAY);
        }

        #[test]
        fn test_am_settlement_loses_six_and_a_half_hours() {
            let pm = minutes_to_expiry(d(2024, 1, 2), 960, d(2024, 1, 19), 960);
            let am = minutes_to_expiry(d(2024, 1, 2), 960, d(2024, 1, 19), 570);
            assert_eq!(pm - am, 390);
        }

        #[test]
        fn test_next_day_expiry() {
            // 8h left today + 16h tomorrow
            let minutes = minutes_to_expiry(d(2024, 1, 2), 960, d(2024, 1, 3), 960);
            assert_eq!(minutes, MINUTES_PER_DAY);
            assert!((years_from_minutes(minutes) - 1.0 / 365.0).abs() < 1e-15);
        }
    }
}
