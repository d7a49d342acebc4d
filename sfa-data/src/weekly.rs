//! Weekly sap and sugar production per tap.
//!
//! For every tap-year the readings are reduced to one row per day
//! ([`reconcile_same_day`]), extended to a contiguous calendar
//! ([`fill_calendar_gaps`]) and summarized into cumulative and trailing
//! 7-day totals ([`summarize`]).

use crate::syrup::syrup_litres;
use chrono::{Datelike, NaiveDate, TimeDelta};
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sfa_core::{
    date_range::DateRange,
    reading::SapSugarReading,
    tree::{TreeIndex, TreeInfo},
};
use sfa_utils::{dates::day_of_year, missing::mean_present};
use std::{collections::BTreeMap, collections::HashSet, convert::Infallible, str::FromStr};

/// Length of the trailing window, in days.
pub const WINDOW_DAYS: usize = 7;

/// Sap and sugar for one tap on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySap {
    pub date: NaiveDate,
    pub sap_weight: Option<f64>,
    pub sugar_content: Option<f64>,
}

/// Cumulative and trailing production for one tap-day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionDay {
    pub date: NaiveDate,
    pub cumulative_sap: f64,
    pub cumulative_sugar_weight: f64,
    pub trailing_sap: f64,
    pub trailing_sugar_weight: f64,
}

/// One row of the weekly table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecord {
    pub tap_id: String,
    pub tree_id: String,
    pub site: Option<String>,
    pub year: i32,
    pub date: NaiveDate,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub day_of_year_from: i32,
    pub day_of_year_to: i32,
    pub cumulative_sap: f64,
    pub cumulative_sugar_weight: f64,
    pub trailing_7day_sap: f64,
    pub trailing_7day_sugar_weight: f64,
    pub cumulative_syrup_litres: f64,
    pub trailing_7day_syrup_litres: f64,
}

/// Site-level projection of a weekly row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummaryRecord {
    pub site: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub trailing_7day_sap: f64,
    pub trailing_7day_sugar_weight: f64,
}

impl From<&WeeklyRecord> for WeeklySummaryRecord {
    fn from(record: &WeeklyRecord) -> Self {
        WeeklySummaryRecord {
            site: record.site.clone(),
            date_from: record.date_from,
            date_to: record.date_to,
            trailing_7day_sap: record.trailing_7day_sap,
            trailing_7day_sugar_weight: record.trailing_7day_sugar_weight,
        }
    }
}

/// Matches either everything or an explicit, case-insensitive set of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    All,
    Only(HashSet<String>),
}

impl Selector {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selector::Only(values.into_iter().map(|v| v.as_ref().trim().to_uppercase()).collect())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(set) => set.contains(&value.trim().to_uppercase()),
        }
    }

    /// Like [`Selector::matches`], but an unknown value only passes `All`.
    pub fn matches_known(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Selector::All, _) => true,
            (Selector::Only(_), Some(value)) => self.matches(value),
            (Selector::Only(_), None) => false,
        }
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    /// `all` (any case) or a comma-separated list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<&str> = s.split(',').map(str::trim).filter(|v| !v.is_empty()).collect();
        if values.is_empty() || values.iter().any(|v| v.eq_ignore_ascii_case("all")) {
            Ok(Selector::All)
        } else {
            Ok(Selector::only(values))
        }
    }
}

/// Which taps and years go into the weekly table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyFilter {
    pub site: Selector,
    pub tree: Selector,
    pub tap: Selector,
    pub year: Selector,
    pub species: Selector,
}

impl WeeklyFilter {
    /// Whether a tap on `tree_id` (with metadata `tree`, if known) is selected.
    pub fn selects_tap(&self, tap_id: &str, tree_id: &str, tree: Option<&TreeInfo>) -> bool {
        self.tap.matches(tap_id)
            && self.tree.matches(tree_id)
            && self.site.matches_known(tree.map(|t| t.site.as_str()))
            && self.species.matches_known(tree.map(|t| t.species.as_str()))
    }

    pub fn selects_year(&self, year: i32) -> bool {
        self.year.matches(&year.to_string())
    }
}

/// Collapse days with more than one reading into a single reading.
///
/// `days` must be in date order. The merged sap weight is the sum of the
/// day's sap weights; the merged sugar content is the sap-weighted mean,
/// where a reading without sugar content counts with the day's mean sugar
/// content. Days with a single reading pass through unchanged.
pub fn reconcile_same_day(days: &[DailySap]) -> Vec<DailySap> {
    days.iter()
        .chunk_by(|d| d.date)
        .into_iter()
        .map(|(date, group)| {
            let group: Vec<&DailySap> = group.collect();
            match group.as_slice() {
                [single] => **single,
                _ => merge_day(date, &group),
            }
        })
        .collect()
}

fn merge_day(date: NaiveDate, readings: &[&DailySap]) -> DailySap {
    let weights: Vec<f64> = readings.iter().filter_map(|r| r.sap_weight).collect();
    let sap_weight = (!weights.is_empty()).then(|| weights.iter().sum::<f64>());

    let day_mean_sugar = mean_present(readings.iter().map(|r| r.sugar_content));
    let sugar_content = match (sap_weight, day_mean_sugar) {
        (Some(total), Some(day_mean)) if total != 0.0 => {
            let weighted: f64 = readings
                .iter()
                .filter_map(|r| r.sap_weight.map(|w| w * r.sugar_content.unwrap_or(day_mean)))
                .sum();
            Some(weighted / total)
        }
        _ => None,
    };

    DailySap {
        date,
        sap_weight,
        sugar_content,
    }
}

/// Insert an empty day for every calendar day between the first and last
/// date that has no row. Returns the extended series and the number of
/// inserted days.
///
/// `days` must hold at most one row per date.
pub fn fill_calendar_gaps(days: &[DailySap]) -> (Vec<DailySap>, usize) {
    let Some(range) = DateRange::spanning(days.iter().map(|d| d.date)) else {
        return (Vec::new(), 0);
    };
    let by_date: BTreeMap<NaiveDate, &DailySap> = days.iter().map(|d| (d.date, d)).collect();
    let mut inserted = 0;
    let filled = range
        .map(|date| match by_date.get(&date) {
            Some(day) => **day,
            None => {
                inserted += 1;
                DailySap {
                    date,
                    sap_weight: None,
                    sugar_content: None,
                }
            }
        })
        .collect();
    (filled, inserted)
}

/// Running sums of `values`.
fn cumulative_sum(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values
        .scan(0.0, |total, v| {
            *total += v;
            Some(*total)
        })
        .collect()
}

/// Difference between each cumulative value and the one `WINDOW_DAYS` rows
/// earlier (zero before the start). Series no longer than the window have
/// no complete trailing window and report the cumulative value itself.
pub fn trailing_window(cumulative: &[f64]) -> Vec<f64> {
    if cumulative.len() <= WINDOW_DAYS {
        return cumulative.to_vec();
    }
    cumulative
        .iter()
        .enumerate()
        .map(|(i, &total)| {
            let before = if i >= WINDOW_DAYS {
                cumulative[i - WINDOW_DAYS]
            } else {
                0.0
            };
            total - before
        })
        .collect()
}

/// Cumulative and trailing production for one tap-year series.
///
/// Missing sugar content is replaced by the series mean sugar content for
/// the sugar weight; missing sap weight counts as zero.
pub fn summarize(days: &[DailySap]) -> Vec<ProductionDay> {
    let mean_sugar = mean_present(days.iter().map(|d| d.sugar_content));
    let sugar_weights = days.iter().map(|d| {
        let sugar = d.sugar_content.or(mean_sugar);
        d.sap_weight
            .zip(sugar)
            .map(|(sap, sugar)| sap * sugar / 100.0)
            .unwrap_or(0.0)
    });

    let cumulative_sap = cumulative_sum(days.iter().map(|d| d.sap_weight.unwrap_or(0.0)));
    let cumulative_sugar = cumulative_sum(sugar_weights);
    let trailing_sap = trailing_window(&cumulative_sap);
    let trailing_sugar = trailing_window(&cumulative_sugar);

    days.iter()
        .enumerate()
        .map(|(i, d)| ProductionDay {
            date: d.date,
            cumulative_sap: cumulative_sap[i],
            cumulative_sugar_weight: cumulative_sugar[i],
            trailing_sap: trailing_sap[i],
            trailing_sugar_weight: trailing_sugar[i],
        })
        .collect()
}

fn weekly_record(tap_id: &str, tree_id: &str, site: Option<&str>, day: &ProductionDay) -> WeeklyRecord {
    let date_from = day.date - TimeDelta::days(WINDOW_DAYS as i64 - 1);
    let day_of_year_to = day_of_year(&day.date) as i32;
    WeeklyRecord {
        tap_id: tap_id.to_string(),
        tree_id: tree_id.to_string(),
        site: site.map(str::to_string),
        year: day.date.year(),
        date: day.date,
        date_from,
        date_to: day.date,
        day_of_year_from: day_of_year_to + 1 - WINDOW_DAYS as i32,
        day_of_year_to,
        cumulative_sap: day.cumulative_sap,
        cumulative_sugar_weight: day.cumulative_sugar_weight,
        trailing_7day_sap: day.trailing_sap,
        trailing_7day_sugar_weight: day.trailing_sugar_weight,
        cumulative_syrup_litres: syrup_litres(day.cumulative_sugar_weight),
        trailing_7day_syrup_litres: syrup_litres(day.trailing_sugar_weight),
    }
}

/// Weekly rows for one tap's chronologically ordered readings, year by year.
pub fn tap_weekly(
    tap_id: &str,
    readings: &[SapSugarReading],
    site: Option<&str>,
    filter: &WeeklyFilter,
) -> Vec<WeeklyRecord> {
    let Some(tree_id) = readings.first().map(|r| r.tree_id.as_str()) else {
        return Vec::new();
    };
    let mut rows = Vec::new();
    for (year, year_readings) in &readings.iter().chunk_by(|r| r.year()) {
        if !filter.selects_year(year) {
            continue;
        }
        let days: Vec<DailySap> = year_readings
            .map(|r| DailySap {
                date: r.date(),
                sap_weight: r.sap_weight,
                sugar_content: r.sugar_content,
            })
            .collect();
        let reconciled = reconcile_same_day(&days);
        if reconciled.len() < days.len() {
            info!(
                "tap {} {}: merged {} same-day readings",
                tap_id,
                year,
                days.len() - reconciled.len()
            );
        }
        let (series, inserted) = fill_calendar_gaps(&reconciled);
        if inserted > 0 {
            warn!(
                "tap {} {}: {} days without readings; sap counted as 0 and sugar as the tap-year mean",
                tap_id, year, inserted
            );
        }
        rows.extend(
            summarize(&series)
                .iter()
                .map(|day| weekly_record(tap_id, tree_id, site, day)),
        );
    }
    rows
}

/// The weekly table for every tap passing `filter`, ordered by tap then date.
///
/// Rows carry the site of their tree from `trees`; a filter that matches
/// nothing yields an empty table.
pub fn weekly_table(
    readings: Vec<SapSugarReading>,
    trees: &TreeIndex,
    filter: &WeeklyFilter,
) -> Vec<WeeklyRecord> {
    let taps = SapSugarReading::by_tap(readings);
    let mut table = Vec::new();
    for (tap_id, series) in &taps {
        let Some(tree_id) = series.first().map(|r| r.tree_id.as_str()) else {
            continue;
        };
        let tree = TreeInfo::lookup(trees, tree_id);
        if !filter.selects_tap(tap_id, tree_id, tree) {
            continue;
        }
        if tree.is_none() {
            warn!("tap {}: tree {} has no site metadata", tap_id, tree_id);
        }
        table.extend(tap_weekly(tap_id, series, tree.map(|t| t.site.as_str()), filter));
    }
    if table.is_empty() {
        info!("no sap readings match the weekly filter; weekly table is empty");
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, m, d).unwrap()
    }

    fn sap(date: NaiveDate, sap_weight: Option<f64>, sugar_content: Option<f64>) -> DailySap {
        DailySap {
            date,
            sap_weight,
            sugar_content,
        }
    }

    fn daily_series(n: u32) -> Vec<DailySap> {
        (0..n)
            .map(|i| sap(day(3, 1 + i), Some(f64::from(i % 4) * 2.5 + 1.0), Some(2.0 + f64::from(i % 3) * 0.3)))
            .collect()
    }

    #[test]
    fn test_reconcile_weighted_sugar() {
        let days = vec![
            sap(day(3, 1), Some(10.0), Some(2.0)),
            sap(day(3, 1), Some(20.0), Some(3.0)),
            sap(day(3, 2), Some(5.0), Some(1.5)),
        ];
        let merged = reconcile_same_day(&days);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].sap_weight, Some(30.0));
        let sugar = merged[0].sugar_content.unwrap();
        assert!((sugar - 80.0 / 30.0).abs() < TOLERANCE);
        assert_eq!(merged[1], days[2]);

        let production = summarize(&merged[..1]);
        assert!((production[0].cumulative_sugar_weight - 0.8).abs() < TOLERANCE);
    }

    #[test]
    fn test_reconcile_missing_sugar_uses_day_mean() {
        let days = vec![
            sap(day(3, 1), Some(10.0), Some(2.0)),
            sap(day(3, 1), Some(10.0), None),
            sap(day(3, 1), Some(20.0), Some(4.0)),
        ];
        let merged = reconcile_same_day(&days);
        // day mean sugar = 3.0; (10*2 + 10*3 + 20*4) / 40
        assert_eq!(merged[0].sap_weight, Some(40.0));
        assert!((merged[0].sugar_content.unwrap() - 130.0 / 40.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_reconcile_without_any_sugar() {
        let days = vec![
            sap(day(3, 1), Some(10.0), None),
            sap(day(3, 1), None, None),
        ];
        let merged = reconcile_same_day(&days);
        assert_eq!(merged[0].sap_weight, Some(10.0));
        assert_eq!(merged[0].sugar_content, None);
    }

    #[test]
    fn test_fill_calendar_gaps() {
        let days = vec![
            sap(day(3, 30), Some(1.0), Some(2.0)),
            sap(day(4, 2), Some(3.0), Some(2.0)),
        ];
        let (filled, inserted) = fill_calendar_gaps(&days);
        assert_eq!(inserted, 2);
        let dates: Vec<_> = filled.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(3, 30), day(3, 31), day(4, 1), day(4, 2)]);
        assert_eq!(filled[1].sap_weight, None);
        assert_eq!(filled[1].sugar_content, None);
    }

    #[test]
    fn test_summarize_fill_policy() {
        let days = vec![
            sap(day(3, 1), Some(10.0), Some(2.0)),
            sap(day(3, 2), None, None),
            sap(day(3, 3), Some(10.0), None),
            sap(day(3, 4), Some(10.0), Some(4.0)),
        ];
        let production = summarize(&days);
        let cum_sap: Vec<_> = production.iter().map(|p| p.cumulative_sap).collect();
        assert_eq!(cum_sap, vec![10.0, 10.0, 20.0, 30.0]);
        // March 3 uses the tap-year mean sugar content (3.0)
        let cum_sugar: Vec<_> = production.iter().map(|p| p.cumulative_sugar_weight).collect();
        assert!((cum_sugar[1] - 0.2).abs() < TOLERANCE);
        assert!((cum_sugar[2] - 0.5).abs() < TOLERANCE);
        assert!((cum_sugar[3] - 0.9).abs() < TOLERANCE);
    }

    #[test]
    fn test_short_series_trailing_equals_cumulative() {
        let production = summarize(&daily_series(3));
        for p in &production {
            assert_eq!(p.trailing_sap, p.cumulative_sap);
            assert_eq!(p.trailing_sugar_weight, p.cumulative_sugar_weight);
        }

        // exactly a week is still too short for a trailing window
        let production = summarize(&daily_series(7));
        assert_eq!(production[6].trailing_sap, production[6].cumulative_sap);
    }

    #[test]
    fn test_trailing_window_identity() {
        let production = summarize(&daily_series(20));
        for n in 0..production.len() {
            let before = if n >= WINDOW_DAYS {
                production[n - WINDOW_DAYS].cumulative_sap
            } else {
                0.0
            };
            assert!((production[n].trailing_sap + before - production[n].cumulative_sap).abs() < TOLERANCE);
        }
        // day 8 (index 7) sums days 2..=8
        let expected: f64 = daily_series(20)[1..8].iter().map(|d| d.sap_weight.unwrap()).sum();
        assert!((production[7].trailing_sap - expected).abs() < TOLERANCE);
    }

    #[test]
    fn test_gap_fill_is_idempotent_without_gaps() {
        let days = daily_series(12);
        let (filled, inserted) = fill_calendar_gaps(&days);
        assert_eq!(inserted, 0);
        assert_eq!(summarize(&filled), summarize(&days));
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("all".parse::<Selector>().unwrap(), Selector::All);
        assert_eq!("ALL".parse::<Selector>().unwrap(), Selector::All);
        assert_eq!("".parse::<Selector>().unwrap(), Selector::All);
        let only: Selector = "hf, quebec".parse().unwrap();
        assert!(only.matches("HF"));
        assert!(only.matches("Quebec"));
        assert!(!only.matches("VT"));
        assert!(!only.matches_known(None));
        assert!(Selector::All.matches_known(None));
    }

    const SAP_CSV: &str = r#"tap_id,tree_id,timestamp,sap_weight,sugar_content
A1N,A1,2019-03-01 08:00,10,2
A1N,A1,2019-03-01 17:00,20,3
A1N,A1,2019-03-04 08:00,6,
A1N,A1,2020-03-02 08:00,4,2.5
B2S,B2,2019-03-02 08:00,8,2
"#;

    const TREES_CSV: &str = "tree_id,site,species\nA1,hf,ACSA\nB2,VT,ACRU\n";

    fn fixtures() -> (Vec<SapSugarReading>, TreeIndex) {
        let readings = SapSugarReading::parse_csv(SAP_CSV).unwrap();
        let trees = TreeInfo::index(TreeInfo::parse_csv(TREES_CSV).unwrap());
        (readings, trees)
    }

    #[test]
    fn test_weekly_table_per_tap_year() {
        let (readings, trees) = fixtures();
        let table = weekly_table(readings, &trees, &WeeklyFilter::default());

        let a1n_2019: Vec<_> = table
            .iter()
            .filter(|r| r.tap_id == "A1N" && r.year == 2019)
            .collect();
        assert_eq!(a1n_2019.len(), 4);
        assert_eq!(a1n_2019[0].site.as_deref(), Some("HF"));
        assert_eq!(a1n_2019[0].tree_id, "A1");
        assert_eq!(a1n_2019[0].cumulative_sap, 30.0);
        assert_eq!(a1n_2019[3].cumulative_sap, 36.0);
        assert_eq!(a1n_2019[3].trailing_7day_sap, 36.0);
        assert_eq!(a1n_2019[3].date_from, day(2, 26));
        assert_eq!(a1n_2019[3].date_to, day(3, 4));
        assert_eq!(a1n_2019[3].day_of_year_to, 63);
        assert_eq!(a1n_2019[3].day_of_year_from, 57);
        assert!(
            (a1n_2019[0].cumulative_syrup_litres - 0.8 / 1.33).abs() < TOLERANCE,
            "syrup follows sugar weight"
        );

        // 2020 restarts from zero
        let a1n_2020: Vec<_> = table
            .iter()
            .filter(|r| r.tap_id == "A1N" && r.year == 2020)
            .collect();
        assert_eq!(a1n_2020.len(), 1);
        assert_eq!(a1n_2020[0].cumulative_sap, 4.0);

        assert_eq!(table.iter().filter(|r| r.tap_id == "B2S").count(), 1);
    }

    #[test]
    fn test_weekly_table_filters() {
        let (readings, trees) = fixtures();
        let filter = WeeklyFilter {
            species: "acsa".parse().unwrap(),
            year: "2020".parse().unwrap(),
            ..WeeklyFilter::default()
        };
        let table = weekly_table(readings, &trees, &filter);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].tap_id, "A1N");
        assert_eq!(table[0].year, 2020);
    }

    #[test]
    fn test_weekly_table_empty_filter_result() {
        let (readings, trees) = fixtures();
        let filter = WeeklyFilter {
            site: "nowhere".parse().unwrap(),
            ..WeeklyFilter::default()
        };
        assert!(weekly_table(readings, &trees, &filter).is_empty());
    }

    #[test]
    fn test_tree_without_metadata() {
        let (readings, _) = fixtures();
        let empty = TreeIndex::new();
        let all = weekly_table(readings.clone(), &empty, &WeeklyFilter::default());
        assert!(all.iter().all(|r| r.site.is_none()));
        assert!(!all.is_empty());

        let by_site = WeeklyFilter {
            site: "hf".parse().unwrap(),
            ..WeeklyFilter::default()
        };
        assert!(weekly_table(readings, &empty, &by_site).is_empty());
    }

    #[test]
    fn test_window_start_reaches_into_previous_year() {
        let readings =
            SapSugarReading::parse_csv("tap_id,tree_id,timestamp,sap_weight,sugar_content\nC3E,C3,2019-01-02 09:00,3,2\n")
                .unwrap();
        let rows = tap_weekly("C3E", &readings, None, &WeeklyFilter::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date_from, NaiveDate::from_ymd_opt(2018, 12, 27).unwrap());
        assert_eq!(rows[0].date_to, NaiveDate::from_ymd_opt(2019, 1, 2).unwrap());
        assert_eq!(rows[0].day_of_year_to, 2);
        assert_eq!(rows[0].day_of_year_from, -4);
        assert_eq!(rows[0].year, 2019);
    }

    #[test]
    fn test_summary_projection() {
        let (readings, trees) = fixtures();
        let table = weekly_table(readings, &trees, &WeeklyFilter::default());
        let summary = WeeklySummaryRecord::from(&table[0]);
        assert_eq!(summary.site.as_deref(), Some("HF"));
        assert_eq!(summary.date_to, table[0].date_to);
        assert_eq!(summary.trailing_7day_sap, table[0].trailing_7day_sap);
    }
}
