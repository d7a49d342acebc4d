//! Daily regularization of irregular series.
//!
//! Produces exactly one value per calendar day over a closed date range,
//! carrying the most recent earlier value into days that have none.

use chrono::NaiveDate;
use sfa_core::date_range::DateRange;
use std::collections::HashMap;

/// A single (date, value) pair. `value` is `None` when the day has no usable
/// observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl DailyValue {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        DailyValue { date, value }
    }
}

/// What the regularizer had to make up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Days that took a carried-forward value.
    pub filled_days: usize,
    /// Days at the start of the range with nothing to carry forward.
    /// These are left empty.
    pub leading_missing_days: usize,
}

impl FillReport {
    pub fn merge(&mut self, other: FillReport) {
        self.filled_days += other.filled_days;
        self.leading_missing_days += other.leading_missing_days;
    }

    pub fn is_clean(&self) -> bool {
        self.filled_days == 0 && self.leading_missing_days == 0
    }
}

/// A regularized daily series and its fill report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Regularized {
    pub days: Vec<DailyValue>,
    pub report: FillReport,
}

/// Forward-fill `points` over every day of `range`.
///
/// Points outside the range are ignored. If a date appears more than once,
/// the last point with a value wins.
pub fn forward_fill(points: &[DailyValue], range: DateRange) -> Regularized {
    let mut by_date: HashMap<NaiveDate, f64> = HashMap::with_capacity(points.len());
    for point in points {
        if let Some(value) = point.value {
            by_date.insert(point.date, value);
        }
    }

    let mut days = Vec::with_capacity(range.num_days());
    let mut report = FillReport::default();
    let mut last: Option<f64> = None;
    for date in range {
        let value = match by_date.get(&date) {
            Some(&value) => {
                last = Some(value);
                Some(value)
            }
            None if last.is_some() => {
                report.filled_days += 1;
                last
            }
            None => {
                report.leading_missing_days += 1;
                None
            }
        };
        days.push(DailyValue { date, value });
    }
    Regularized { days, report }
}

/// Forward-fill `points` over the span from their first to last date.
pub fn forward_fill_observed(points: &[DailyValue]) -> Regularized {
    match DateRange::spanning(points.iter().map(|p| p.date)) {
        Some(range) => forward_fill(points, range),
        None => Regularized::default(),
    }
}
