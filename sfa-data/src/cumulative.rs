//! Running totals that restart in every calendar year.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Independent running sums, one per calendar year.
///
/// Adding a value for a date only touches the total of that date's year,
/// so the first value of a year starts a fresh sum.
#[derive(Debug, Clone, Default)]
pub struct YearlyRunningTotal {
    totals: BTreeMap<i32, f64>,
}

impl YearlyRunningTotal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the total for `date`'s year and return the new total.
    pub fn add(&mut self, date: NaiveDate, value: f64) -> f64 {
        let total = self.totals.entry(date.year()).or_insert(0.0);
        *total += value;
        *total
    }

    #[cfg(test)]
    fn total(&self, year: i32) -> Option<f64> {
        self.totals.get(&year).copied()
    }
}
