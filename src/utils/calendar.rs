use chrono::{Datelike, NaiveDate, Weekday};

/// Billable days are Monday through Friday. There is no holiday calendar.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Actual length of a month (28-31), leap years included. An invalid
/// year/month combination yields 0 so that ranges built on top of it come out
/// empty.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|date| date.pred_opt())
        .map(|date| date.day())
        .unwrap_or(0)
}

/// Enumerates the business days of a month between `start_day` and `end_day`,
/// both inclusive. `end_day` is clamped to the month's length and a
/// `start_day` past the end of the month produces an empty vector.
pub fn business_days_in_range(
    year: i32,
    month: u32,
    start_day: u32,
    end_day: u32,
) -> Vec<NaiveDate> {
    let last = end_day.min(last_day_of_month(year, month));
    (start_day..=last)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .filter(|date| is_business_day(*date))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Weekday};

    use super::{business_days_in_range, is_business_day, last_day_of_month};

    #[test]
    fn weekends_are_not_business_days_over_a_full_year() {
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        while date <= end {
            let expected = !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            assert_eq!(is_business_day(date), expected, "{date}");
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn month_lengths() {
        assert_eq!(last_day_of_month(2025, 1), 31);
        assert_eq!(last_day_of_month(2025, 4), 30);
        assert_eq!(last_day_of_month(2025, 2), 28);
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2025, 12), 31);
    }

    #[test]
    fn invalid_month_has_no_days() {
        assert_eq!(last_day_of_month(2025, 13), 0);
        assert!(business_days_in_range(2025, 13, 1, 31).is_empty());
    }

    #[test]
    fn range_is_clamped_to_month_length() {
        // June 2025 has 30 days, 28th and 29th fall on a weekend.
        let days = business_days_in_range(2025, 6, 24, 31);
        let expected = [24, 25, 26, 27, 30]
            .map(|day| NaiveDate::from_ymd_opt(2025, 6, day).unwrap());
        assert_eq!(days, expected);
    }

    #[test]
    fn start_past_month_end_is_empty() {
        assert!(business_days_in_range(2025, 6, 31, 31).is_empty());
        assert!(business_days_in_range(2025, 2, 29, 29).is_empty());
    }

    #[test]
    fn full_week_filters_to_weekdays() {
        // 2025-06-01 is a Sunday.
        let days = business_days_in_range(2025, 6, 1, 8);
        let expected = [2, 3, 4, 5, 6]
            .map(|day| NaiveDate::from_ymd_opt(2025, 6, day).unwrap());
        assert_eq!(days, expected);
    }
}
