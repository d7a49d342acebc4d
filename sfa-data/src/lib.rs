//! Derived metrics for temperature and sap-flow observations.
//!
//! This crate turns irregular, gappy field series into regularized daily
//! and weekly tables: growing degree days, freeze-thaw cycle counts and
//! trailing weekly sap/sugar/syrup production.

pub mod cumulative;
pub mod daily;
pub mod freeze_thaw;
pub mod gdd;
pub mod regularize;
pub mod weekly;

/// Tunable parameters of the daily metrics.
pub mod config {
    /// Default growing degree day base temperature (°C).
    pub const DEFAULT_GDD_BASE: f64 = 5.0;

    /// Default freeze-thaw threshold temperature (°C).
    pub const DEFAULT_FREEZE_THAW_THRESHOLD: f64 = 3.0;

    /// Species selected by the weekly command unless told otherwise (sugar maple).
    pub const DEFAULT_SPECIES: &str = "ACSA";

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct MetricsConfig {
        pub gdd_base: f64,
        pub freeze_thaw_threshold: f64,
    }

    impl Default for MetricsConfig {
        fn default() -> Self {
            MetricsConfig {
                gdd_base: DEFAULT_GDD_BASE,
                freeze_thaw_threshold: DEFAULT_FREEZE_THAW_THRESHOLD,
            }
        }
    }
}

/// Sugar to syrup conversion.
pub mod syrup {
    /// Kilograms of sugar per litre of finished maple syrup.
    pub const SUGAR_KG_PER_SYRUP_LITRE: f64 = 1.33;

    pub fn syrup_litres(sugar_weight: f64) -> f64 {
        sugar_weight / SUGAR_KG_PER_SYRUP_LITRE
    }

}
