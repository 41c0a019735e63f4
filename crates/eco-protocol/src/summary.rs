//! The legacy biodiversity summary payload.
//!
//! Older dashboard pages still consume this shape: snake_case outer keys,
//! a camelCase `data.metrics` block, and an opaque forecast passthrough.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::round2;

/// Top-level payload for `GET /api/biodiversity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: SummaryStats,
    pub species_by_class: SpeciesByClass,
    /// Count per IUCN code, all known codes present even when zero.
    pub iucn_categories: HashMap<String, u64>,
    pub data: SummaryData,
    /// Pre-computed ML forecast output, passed through untouched.
    /// Null when the forecast file is absent or unreadable.
    pub forecasts: Option<serde_json::Value>,
}

/// Snake_case headline stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_species: u64,
    pub endangered_species: u64,
    pub endangered_ratio: f64,
    pub biodiversity_index: f64,
    pub avg_occurrences: f64,
    /// The group filter that was applied, or "all".
    pub group_filter: String,
    pub timestamp: String,
}

impl SummaryStats {
    pub fn from_totals(
        unique_species: u64,
        endangered: u64,
        total_occurrences: u64,
        group_filter: Option<&str>,
    ) -> Self {
        let (ratio, index, avg) = if unique_species == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let ratio = endangered as f64 / unique_species as f64;
            (
                round2(ratio * 100.0),
                round2((1.0 - ratio) * 100.0),
                round2(total_occurrences as f64 / unique_species as f64),
            )
        };

        Self {
            total_species: unique_species,
            endangered_species: endangered,
            endangered_ratio: ratio,
            biodiversity_index: index,
            avg_occurrences: avg,
            group_filter: group_filter.unwrap_or("all").to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Unique species split across the classes the dashboard cards show.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpeciesByClass {
    pub birds: u64,
    pub mammals: u64,
    pub reptiles: u64,
    pub other: u64,
}

/// Wrapper matching the legacy `data.metrics` nesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryData {
    pub metrics: SummaryMetrics,
}

/// The camelCase metrics block nested under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_unique_species: u64,
    pub endangered_count: u64,
    pub endangered_ratio: f64,
    pub biodiversity_index: f64,
    pub avg_occurrences: f64,
}

impl From<&SummaryStats> for SummaryMetrics {
    fn from(stats: &SummaryStats) -> Self {
        Self {
            total_unique_species: stats.total_species,
            endangered_count: stats.endangered_species,
            endangered_ratio: stats.endangered_ratio,
            biodiversity_index: stats.biodiversity_index,
            avg_occurrences: stats.avg_occurrences,
        }
    }
}
