use chrono::NaiveDate;
use std::mem::replace;

/// A date range iterator that yields each calendar day from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// The smallest range covering every date in `dates`, or `None` if empty.
    pub fn spanning<I>(dates: I) -> Option<DateRange>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().fold(None, |range, date| match range {
            None => Some(DateRange(date, date)),
            Some(DateRange(start, end)) => Some(DateRange(start.min(date), end.max(date))),
        })
    }

    /// Number of calendar days in the closed interval.
    pub fn num_days(&self) -> usize {
        let days = (self.1 - self.0).num_days() + 1;
        days.max(0) as usize
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            match self.0.succ_opt() {
                Some(next) => Some(replace(&mut self.0, next)),
                None => {
                    // NaiveDate::MAX has no successor; close the range after it.
                    let last = self.0;
                    self.1 = NaiveDate::MIN;
                    Some(last)
                }
            }
        } else {
            None
        }
    }
}
