//! Synthetic trend generation.
//!
//! Some dataset exports carry no temporal columns at all, which would
//! leave the dashboard's trend chart empty. This fallback fabricates a
//! 12-month series from the aggregate totals; callers must surface it
//! as synthetic via the report metadata.

use std::f64::consts::PI;

use rand::Rng;

use crate::aggregate::{period_key, TrendPoint};

/// Amplitude of the deterministic seasonal swing.
const SEASONAL_AMPLITUDE: f64 = 0.15;

/// Fabricate a 12-month trend for `year` from aggregate totals.
///
/// Each point scales the true totals by a fresh uniform multiplier in
/// [0.8, 1.2) and a seasonal factor `1 + 0.15 * sin(2π * month / 12)`.
pub fn synthesize_monthly_trend(
    total_species: u64,
    total_occurrences: u64,
    year: i32,
) -> Vec<TrendPoint> {
    let mut rng = rand::thread_rng();

    (1..=12u32)
        .map(|month| {
            let variation: f64 = rng.gen_range(0.8..1.2);
            let seasonal = 1.0 + (month as f64 / 12.0 * 2.0 * PI).sin() * SEASONAL_AMPLITUDE;

            TrendPoint {
                period: period_key(year, Some(month)),
                year,
                month: Some(month),
                species_count: (total_species as f64 * variation * seasonal).floor() as u64,
                occurrences: (total_occurrences as f64 / 12.0 * variation * seasonal).floor()
                    as u64,
            }
        })
        .collect()
}
