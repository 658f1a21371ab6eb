use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Generate `horizon` future dates strictly after `last`.
///
/// With `business_days_only`, Saturdays and Sundays are skipped (market
/// holidays are not modeled; the backtest join drops any mismatch).
pub fn future_dates(last: NaiveDate, horizon: u32, business_days_only: bool) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(horizon as usize);
    let mut cursor = last;
    while dates.len() < horizon as usize {
        cursor += Duration::days(1);
        if business_days_only
            && matches!(cursor.weekday(), Weekday::Sat | Weekday::Sun)
        {
            continue;
        }
        dates.push(cursor);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_mode_is_consecutive() {
        // 2024-01-05 is a Friday
        let last: NaiveDate = "2024-01-05".parse().unwrap();
        let dates = future_dates(last, 3, false);
        assert_eq!(dates[0], "2024-01-06".parse().unwrap());
        assert_eq!(dates[2], "2024-01-08".parse().unwrap());
    }

    #[test]
    fn business_mode_skips_weekends() {
        let last: NaiveDate = "2024-01-05".parse().unwrap();
        let dates = future_dates(last, 3, true);
        assert_eq!(dates[0], "2024-01-08".parse().unwrap()); // Monday
        assert_eq!(dates[1], "2024-01-09".parse().unwrap());
        assert_eq!(dates[2], "2024-01-10".parse().unwrap());
        assert!(dates
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    }
}
