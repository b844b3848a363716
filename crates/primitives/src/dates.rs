//! Conversions between calendar dates and the day counts used by columnar storage.

use chrono::Datelike;

use crate::Date;

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Number of days since 1970-01-01.
#[must_use]
pub fn epoch_days(date: Date) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
}

/// Inverse of [`epoch_days`]. Returns `None` outside chrono's supported range.
#[must_use]
pub fn date_from_epoch_days(days: i32) -> Option<Date> {
    days.checked_add(UNIX_EPOCH_FROM_CE).and_then(Date::from_num_days_from_ce_opt)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1970, 1, 1, 0)]
    #[case(1970, 1, 2, 1)]
    #[case(1969, 12, 31, -1)]
    #[case(2024, 3, 1, 19_783)]
    fn epoch_day_counts(#[case] y: i32, #[case] m: u32, #[case] d: u32, #[case] days: i32) {
        let date = Date::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(epoch_days(date), days);
        assert_eq!(date_from_epoch_days(days), Some(date));
    }

    #[test]
    fn out_of_range_days() {
        assert!(date_from_epoch_days(i32::MAX).is_none());
    }
}
