//! Monthly date listing.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Whether a date falls on Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Dates to show for a month.
///
/// Every weekday of the month, plus each weekend day listed in
/// `dates_with_tasks`. The result is sorted.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `year`/`month` do not name a month.
pub fn month_dates(
    year: i32,
    month: u32,
    dates_with_tasks: &BTreeSet<NaiveDate>,
) -> Result<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation(format!("invalid month: {year}-{month:02}")))?;

    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(|d| !is_weekend(*d) || dates_with_tasks.contains(d))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_weekends_only_with_tasks() {
        // June 1, 2024 is a Saturday.
        let with_tasks = BTreeSet::from([june(1)]);
        let dates = month_dates(2024, 6, &with_tasks).unwrap();

        assert_eq!(dates.first(), Some(&june(1)));
        assert!(!dates.contains(&june(2)));
        assert!(dates.contains(&june(3)));
        assert_eq!(dates.last(), Some(&june(28)));
        assert!(!dates.contains(&june(29)));
        assert!(!dates.contains(&june(30)));
        // 20 weekdays plus the Saturday exception.
        assert_eq!(dates.len(), 21);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_task_dates_outside_month_are_ignored() {
        let with_tasks = BTreeSet::from([NaiveDate::from_ymd_opt(2024, 7, 6).unwrap()]);
        let dates = month_dates(2024, 6, &with_tasks).unwrap();
        assert_eq!(dates.len(), 20);
        assert!(dates.iter().all(|d| !is_weekend(*d)));
    }

    #[test]
    fn test_february_leap_year() {
        let dates = month_dates(2024, 2, &BTreeSet::new()).unwrap();
        assert_eq!(dates.last(), Some(&NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    }

    #[test]
    fn test_invalid_month() {
        assert!(matches!(month_dates(2024, 13, &BTreeSet::new()), Err(Error::Validation(_))));
        assert!(month_dates(2024, 0, &BTreeSet::new()).is_err());
    }
}
