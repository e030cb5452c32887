//! US EPA Air Quality Index from particulate concentration.
//!
//! Ref: https://www.airnow.gov/sites/default/files/2020-05/aqi-technical-assistance-document-sept2018.pdf
//!
//! The official formulas truncate the concentration before lookup (PM2.5 to
//! one decimal, PM10 to an integer). Readings are used as reported here.

use tracing::warn;

#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    concentration_low: f64,
    concentration_high: f64,
    index_low: f64,
    index_high: f64,
}

const fn band(
    concentration_low: f64,
    concentration_high: f64,
    index_low: f64,
    index_high: f64,
) -> Breakpoint {
    Breakpoint {
        concentration_low,
        concentration_high,
        index_low,
        index_high,
    }
}

// Evaluated top-down; a band matches when the concentration is strictly
// above its lower bound.
const BREAKPOINTS: [Breakpoint; 6] = [
    band(350.5, 500.0, 401.0, 500.0),
    band(250.5, 350.4, 301.0, 400.0),
    band(150.5, 250.4, 201.0, 300.0),
    band(55.5, 150.4, 151.0, 200.0),
    band(35.5, 55.4, 101.0, 150.0),
    band(12.1, 35.4, 51.0, 100.0),
];

// The lowest band includes its lower bound.
const GOOD: Breakpoint = band(0.0, 12.0, 0.0, 50.0);

/// Converts a concentration in µg/m³ to an AQI value.
///
/// Negative (and NaN) input is invalid: a diagnostic is logged and 0 is
/// returned.
pub fn compute_aqi(concentration: f64) -> f64 {
    let breakpoint = match BREAKPOINTS.iter().find(|b| concentration > b.concentration_low) {
        Some(b) => b,
        None if concentration >= 0.0 => &GOOD,
        None => {
            warn!("unable to calculate AQI on invalid sensor value: {concentration}");
            return 0.0;
        }
    };

    interpolate(concentration, breakpoint)
}

/// The reported AQI is the worst of the contributing pollutants.
pub fn combined_aqi(pm_2_5: f64, pm_10_0: f64) -> f64 {
    compute_aqi(pm_2_5).max(compute_aqi(pm_10_0))
}

fn interpolate(concentration: f64, b: &Breakpoint) -> f64 {
    let index_range = b.index_high - b.index_low;
    let concentration_range = b.concentration_high - b.concentration_low;

    (index_range / concentration_range * (concentration - b.concentration_low) + b.index_low)
        .round()
}
