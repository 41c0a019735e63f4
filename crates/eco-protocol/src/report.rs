//! The rich biodiversity report payload.
//!
//! Wire casing is camelCase throughout, matching what the dashboard's
//! chart components consume.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::round2;

/// Top-level payload for `GET /api/biodiversity/report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub summary: ReportSummary,
    pub iucn_breakdown: HashMap<String, IucnBreakdownEntry>,
    pub species_list: Vec<SpeciesEntry>,
    pub trend: Vec<TrendPointPayload>,
    pub metadata: ReportMetadata,
}

/// Headline summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_unique_species: u64,
    pub endangered_species: u64,
    /// Percentage of unique species in the endangered set, 2 decimals.
    pub endangered_ratio: f64,
    pub total_occurrences: u64,
    pub average_occurrences: f64,
    /// `100 * (1 - endangeredRatio)`, higher is better.
    pub biodiversity_index: f64,
}

impl ReportSummary {
    /// Derive the summary block from aggregate totals.
    ///
    /// Zero species yields all-zero fields rather than NaN.
    pub fn from_totals(unique_species: u64, endangered: u64, total_occurrences: u64) -> Self {
        if unique_species == 0 {
            return Self {
                total_unique_species: 0,
                endangered_species: 0,
                endangered_ratio: 0.0,
                total_occurrences,
                average_occurrences: 0.0,
                biodiversity_index: 0.0,
            };
        }

        let ratio = endangered as f64 / unique_species as f64;
        Self {
            total_unique_species: unique_species,
            endangered_species: endangered,
            endangered_ratio: round2(ratio * 100.0),
            total_occurrences,
            average_occurrences: round2(total_occurrences as f64 / unique_species as f64),
            biodiversity_index: round2((1.0 - ratio) * 100.0),
        }
    }
}

/// One slice of the IUCN category breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IucnBreakdownEntry {
    /// Distinct species in this category.
    pub count: u64,
    /// Share of total unique species, 2 decimals.
    pub percentage: f64,
    /// Chart color for the category.
    pub color: String,
}

/// One row of the top-species list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesEntry {
    pub scientific_name: String,
    /// Resolved vernacular name; falls back to the scientific name.
    pub common_name: String,
    pub iucn_red_list_category: String,
    pub total_occurrences: u64,
    /// Taxonomic class, or "Unknown" when the dataset left it blank.
    pub species_group: String,
    pub color: String,
}

/// One point of the occurrence trend series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPointPayload {
    /// Period key, `"YYYY"` or `"YYYY-MM"`.
    pub period: String,
    pub species_count: u64,
    pub occurrences: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

/// Report provenance block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// RFC 3339 generation timestamp.
    pub timestamp: String,
    /// Path of the CSV the report was built from.
    pub csv_path: String,
    pub total_records_processed: u64,
    /// True when the trend series was generated rather than observed.
    pub synthetic_trend: bool,
}

impl ReportMetadata {
    pub fn new(csv_path: impl Into<String>, records: u64, synthetic_trend: bool) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            csv_path: csv_path.into(),
            total_records_processed: records,
            synthetic_trend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_endangered_ratio() {
        // 3 endangered of 10 species: ratio 30.00, index 70.00
        let summary = ReportSummary::from_totals(10, 3, 500);
        assert_eq!(summary.endangered_ratio, 30.00);
        assert_eq!(summary.biodiversity_index, 70.00);
        assert_eq!(summary.average_occurrences, 50.00);
    }

    #[test]
    fn test_summary_zero_species_is_nan_safe() {
        let summary = ReportSummary::from_totals(0, 0, 0);
        assert_eq!(summary.endangered_ratio, 0.0);
        assert_eq!(summary.average_occurrences, 0.0);
        assert_eq!(summary.biodiversity_index, 0.0);
    }

    #[test]
    fn test_wire_casing() {
        let summary = ReportSummary::from_totals(4, 1, 100);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("totalUniqueSpecies").is_some());
        assert!(json.get("biodiversityIndex").is_some());
        assert!(json.get("total_unique_species").is_none());
    }

    #[test]
    fn test_trend_point_omits_absent_month() {
        let point = TrendPointPayload {
            period: "2020".to_string(),
            species_count: 3,
            occurrences: 40,
            year: Some(2020),
            month: None,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert!(json.get("month").is_none());
        assert_eq!(json["speciesCount"], 3);
    }
}
