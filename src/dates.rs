use chrono::{Datelike, Days, Duration, Local, NaiveDate};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next_month = first + Duration::days(32);
    let last = next_month.with_day(1).unwrap_or(next_month) - Duration::days(1);
    (first, last)
}

/// `[reference - days, reference]`, the look-back used for note counts.
pub fn lookback_start(reference: NaiveDate, days: i64) -> NaiveDate {
    reference - Duration::days(days.max(0))
}

/// Start of a window of `days` calendar days ending on `reference` inclusive.
/// `None` when the window reaches past the earliest representable date.
pub fn window_start(reference: NaiveDate, days: usize) -> Option<NaiveDate> {
    let back = u64::try_from(days.saturating_sub(1)).ok()?;
    reference.checked_sub_days(Days::new(back))
}

/// Every day of the window ending on `reference`, oldest first.
pub fn window_days(reference: NaiveDate, days: usize) -> Option<impl Iterator<Item = NaiveDate>> {
    let start = window_start(reference, days)?;
    Some(start.iter_days().take(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn february_bounds_follow_leap_years() {
        assert_eq!(month_bounds(ymd(2024, 2, 15)), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(month_bounds(ymd(2023, 2, 15)), (ymd(2023, 2, 1), ymd(2023, 2, 28)));
    }

    #[test]
    fn month_bounds_cover_long_and_short_months() {
        assert_eq!(month_bounds(ymd(2024, 1, 31)), (ymd(2024, 1, 1), ymd(2024, 1, 31)));
        assert_eq!(month_bounds(ymd(2024, 4, 1)), (ymd(2024, 4, 1), ymd(2024, 4, 30)));
        assert_eq!(month_bounds(ymd(2024, 12, 25)), (ymd(2024, 12, 1), ymd(2024, 12, 31)));
    }

    #[test]
    fn lookback_includes_both_ends() {
        assert_eq!(lookback_start(ymd(2024, 3, 8), 7), ymd(2024, 3, 1));
    }

    #[test]
    fn window_days_are_consecutive_and_end_on_reference() {
        let days: Vec<NaiveDate> = window_days(ymd(2024, 3, 2), 30).unwrap().collect();
        assert_eq!(days.len(), 30);
        assert_eq!(days[0], ymd(2024, 2, 2));
        assert_eq!(days[29], ymd(2024, 3, 2));
        assert!(days.windows(2).all(|pair| pair[1] - pair[0] == Duration::days(1)));
    }

    #[test]
    fn oversized_window_has_no_start() {
        assert_eq!(window_start(ymd(2024, 3, 8), usize::MAX), None);
        assert_eq!(window_start(ymd(2024, 3, 8), 1_000_000_000), None);
        assert!(window_days(ymd(2024, 3, 8), 1_000_000_000).is_none());
        assert_eq!(window_start(ymd(2024, 3, 8), 1), Some(ymd(2024, 3, 8)));
    }
}
