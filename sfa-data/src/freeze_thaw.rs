//! Freeze-thaw cycle counting.
//!
//! A station-year's sub-daily temperatures drive a two-phase counter that
//! advances by half a cycle every time the temperature crosses the
//! threshold in the direction it is waiting for. One full thaw plus one
//! full freeze is one cycle.

use crate::regularize::{forward_fill_observed, DailyValue, FillReport};
use chrono::{Datelike, NaiveDateTime};
use itertools::Itertools;
use log::{debug, warn};
use sfa_core::reading::TemperatureReading;

/// Which crossing the counter is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At a whole cycle count; the next reading at or above the threshold
    /// completes half a cycle.
    AwaitingThaw,
    /// Half way through a cycle; the next reading below the threshold
    /// completes it.
    AwaitingFreeze,
}

/// Freeze-thaw counter for one station-year.
///
/// The count is kept in half-cycles so it stays exact; `phase` always agrees
/// with its parity (even = `AwaitingThaw`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeThawState {
    half_cycles: u32,
    phase: Phase,
}

impl FreezeThawState {
    /// State at the first reading of a year.
    ///
    /// A first reading above the threshold is credited with half a cycle.
    pub fn start(first_temp: f64, threshold: f64) -> Self {
        if first_temp > threshold {
            FreezeThawState {
                half_cycles: 1,
                phase: Phase::AwaitingFreeze,
            }
        } else {
            FreezeThawState {
                half_cycles: 0,
                phase: Phase::AwaitingThaw,
            }
        }
    }

    /// State after observing `temp`.
    pub fn observe(self, temp: f64, threshold: f64) -> Self {
        match self.phase {
            Phase::AwaitingThaw if temp >= threshold => FreezeThawState {
                half_cycles: self.half_cycles + 1,
                phase: Phase::AwaitingFreeze,
            },
            Phase::AwaitingFreeze if temp < threshold => FreezeThawState {
                half_cycles: self.half_cycles + 1,
                phase: Phase::AwaitingThaw,
            },
            _ => self,
        }
    }

    /// Cumulative cycles, in steps of 0.5.
    pub fn count(&self) -> f64 {
        f64::from(self.half_cycles) / 2.0
    }

    #[cfg(test)]
    fn half_cycles(&self) -> u32 {
        self.half_cycles
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Counter value at every reading of one year, in order.
///
/// The first reading initializes the counter; every later reading is a
/// transition. The first reading is never also run as a transition, so a
/// year that opens exactly at the threshold starts at 0, not 0.5.
pub fn trace(readings: &[(NaiveDateTime, f64)], threshold: f64) -> Vec<(NaiveDateTime, FreezeThawState)> {
    let mut states = Vec::with_capacity(readings.len());
    let mut state: Option<FreezeThawState> = None;
    for &(timestamp, temp) in readings {
        let next = match state {
            None => FreezeThawState::start(temp, threshold),
            Some(current) => current.observe(temp, threshold),
        };
        state = Some(next);
        states.push((timestamp, next));
    }
    states
}

/// Per-day counter values for one year: the value at the last reading of
/// each day, forward-filled across days without readings.
pub fn daily_counts(readings: &[(NaiveDateTime, f64)], threshold: f64) -> (Vec<DailyValue>, FillReport) {
    let last_of_day: Vec<DailyValue> = trace(readings, threshold)
        .into_iter()
        .chunk_by(|(timestamp, _)| timestamp.date())
        .into_iter()
        .filter_map(|(date, day)| day.last().map(|(_, state)| DailyValue::new(date, Some(state.count()))))
        .collect();
    let regularized = forward_fill_observed(&last_of_day);
    (regularized.days, regularized.report)
}

/// Daily freeze-thaw counts for one station's chronologically ordered
/// readings. Each year restarts independently; readings without a
/// temperature are skipped.
pub fn station_freeze_thaw(
    station_id: &str,
    readings: &[TemperatureReading],
    threshold: f64,
) -> (Vec<DailyValue>, FillReport) {
    let observed: Vec<(NaiveDateTime, f64)> = readings
        .iter()
        .filter_map(|r| r.air_temperature.map(|t| (r.timestamp, t)))
        .collect();
    let skipped = readings.len() - observed.len();
    if skipped > 0 {
        debug!(
            "station {}: {} readings without temperature ignored for freeze-thaw",
            station_id, skipped
        );
    }

    let mut days = Vec::new();
    let mut report = FillReport::default();
    for (year, year_readings) in &observed.into_iter().chunk_by(|(timestamp, _)| timestamp.year()) {
        let year_readings: Vec<_> = year_readings.collect();
        let (year_days, year_report) = daily_counts(&year_readings, threshold);
        if year_report.filled_days > 0 {
            warn!(
                "station {} {}: {} days without temperature readings; freeze-thaw count carried forward",
                station_id, year, year_report.filled_days
            );
        }
        report.merge(year_report);
        days.extend(year_days);
    }
    (days, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const THRESHOLD: f64 = 3.0;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn reading(ts: NaiveDateTime, t: Option<f64>) -> TemperatureReading {
        TemperatureReading {
            station_id: "HF001".to_string(),
            timestamp: ts,
            air_temperature: t,
        }
    }

    #[test]
    fn test_start_rule() {
        let warm = FreezeThawState::start(3.5, THRESHOLD);
        assert_eq!(warm.count(), 0.5);
        assert_eq!(warm.phase(), Phase::AwaitingFreeze);

        // at the threshold is not above it
        let cold = FreezeThawState::start(3.0, THRESHOLD);
        assert_eq!(cold.count(), 0.0);
        assert_eq!(cold.phase(), Phase::AwaitingThaw);
    }

    #[test]
    fn test_transitions() {
        let state = FreezeThawState::start(-2.0, THRESHOLD);
        assert_eq!(state.observe(2.9, THRESHOLD), state);
        let thawed = state.observe(3.0, THRESHOLD);
        assert_eq!(thawed.count(), 0.5);
        assert_eq!(thawed.observe(3.0, THRESHOLD), thawed);
        let frozen = thawed.observe(2.99, THRESHOLD);
        assert_eq!(frozen.count(), 1.0);
        assert_eq!(frozen.phase(), Phase::AwaitingThaw);
    }

    #[test]
    fn test_first_reading_at_threshold_is_not_a_thaw() {
        let readings = vec![(at(2019, 3, 1, 0), 3.0), (at(2019, 3, 1, 6), 2.0)];
        let counts: Vec<f64> = trace(&readings, THRESHOLD)
            .iter()
            .map(|(_, s)| s.count())
            .collect();
        assert_eq!(counts, vec![0.0, 0.0]);
    }

    #[test]
    fn test_single_day_sequence() {
        let readings: Vec<_> = [2.0, 4.0, 2.0, 4.0]
            .iter()
            .enumerate()
            .map(|(h, &t)| (at(2019, 3, 1, h as u32 * 6), t))
            .collect();
        let counts: Vec<f64> = trace(&readings, THRESHOLD)
            .iter()
            .map(|(_, s)| s.count())
            .collect();
        assert_eq!(counts, vec![0.0, 0.5, 1.0, 1.5]);

        let (days, _) = daily_counts(&readings, THRESHOLD);
        assert_eq!(days, vec![DailyValue::new(at(2019, 3, 1, 0).date(), Some(1.5))]);
    }

    #[test]
    fn test_last_reading_of_day_and_forward_fill() {
        let readings = vec![
            (at(2019, 3, 1, 3), 1.0),
            (at(2019, 3, 1, 15), 6.0),
            // March 2 has no readings
            (at(2019, 3, 3, 3), -1.0),
            (at(2019, 3, 3, 15), 0.0),
        ];
        let (days, report) = daily_counts(&readings, THRESHOLD);
        let values: Vec<_> = days.iter().map(|d| d.value.unwrap()).collect();
        assert_eq!(values, vec![0.5, 0.5, 1.0]);
        assert_eq!(report.filled_days, 1);
    }

    #[test]
    fn test_each_year_restarts() {
        let readings = vec![
            reading(at(2018, 12, 31, 6), Some(-5.0)),
            reading(at(2018, 12, 31, 12), Some(5.0)),
            reading(at(2018, 12, 31, 18), Some(-5.0)),
            reading(at(2019, 1, 1, 6), Some(8.0)),
            reading(at(2019, 1, 1, 12), Some(9.0)),
        ];
        let (days, _) = station_freeze_thaw("HF001", &readings, THRESHOLD);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].value, Some(1.0));
        // no carry from 2018; a warm first reading starts at half a cycle
        assert_eq!(days[1].value, Some(0.5));
    }

    #[test]
    fn test_missing_temperatures_are_skipped() {
        let readings = vec![
            reading(at(2019, 2, 1, 0), None),
            reading(at(2019, 2, 1, 6), Some(-1.0)),
            reading(at(2019, 2, 1, 12), None),
            reading(at(2019, 2, 1, 18), Some(4.0)),
        ];
        let (days, _) = station_freeze_thaw("HF001", &readings, THRESHOLD);
        assert_eq!(days[0].value, Some(0.5));
    }

    #[test]
    fn test_counter_moves_in_half_steps() {
        let temps = [-4.0, 1.0, 3.5, 7.0, 2.0, 2.5, 9.0, -1.0, 3.0, 3.0, -6.0];
        let readings: Vec<_> = temps
            .iter()
            .enumerate()
            .map(|(i, &t)| (at(2019, 4, 1 + i as u32, 12), t))
            .collect();
        let states = trace(&readings, THRESHOLD);
        for pair in states.windows(2) {
            let step = pair[1].1.half_cycles() - pair[0].1.half_cycles();
            assert!(step <= 1);
        }
        for (_, state) in &states {
            let whole = state.half_cycles() % 2 == 0;
            assert_eq!(whole, state.count().fract() == 0.0);
            assert_eq!(whole, state.phase() == Phase::AwaitingThaw);
        }
    }
}
