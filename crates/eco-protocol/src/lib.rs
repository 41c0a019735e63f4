//! EcoLens biodiversity API payload types.
//!
//! This crate defines the JSON contract exposed by the biodiversity
//! endpoints: the rich report payload, the legacy summary payload, the
//! error body, and the static IUCN / species-group lookup tables shared
//! by both. Pure types with no I/O and no async.

pub mod errors;
pub mod groups;
pub mod iucn;
pub mod report;
pub mod summary;

pub use errors::ApiError;
pub use groups::group_class;
pub use iucn::{is_endangered, iucn_color, ENDANGERED_CODES, IUCN_CODES};
pub use report::{
    IucnBreakdownEntry, ReportMetadata, ReportResponse, ReportSummary, SpeciesEntry,
    TrendPointPayload,
};
pub use summary::{SpeciesByClass, SummaryData, SummaryMetrics, SummaryResponse, SummaryStats};

/// Round a ratio/percentage to two decimal places for display stability.
///
/// All percentage and index fields on the wire go through this so the two
/// endpoint variants cannot drift apart in formatting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(100.0), 100.0);
    }
}
