//! The legacy biodiversity summary endpoint.
//!
//! `GET /api/biodiversity?group=<birds|mammals|reptiles>`
//!
//! Kept for the older dashboard cards: snake_case shape, species-by-
//! class tallies, the fixed IUCN category table, and an opaque forecast
//! passthrough.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use eco_protocol::{
    group_class, SpeciesByClass, SummaryData, SummaryMetrics, SummaryResponse, SummaryStats,
    IUCN_CODES,
};
use occurrence_data::{
    aggregate, load_dataset, AggregateOptions, DatasetError, HeaderIndex, OccurrenceRecord,
};

use crate::handlers::dataset_error_response;
use crate::state::AppState;

/// Query parameters for the summary endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct SummaryParams {
    /// Species group filter (birds, mammals, reptiles).
    pub group: Option<String>,
}

/// GET /api/biodiversity
pub async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Response {
    tracing::info!("Summary requested: group={:?}", params.group);

    match build_summary(&state, params.group.as_deref()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => dataset_error_response(e, "Failed to load biodiversity data"),
    }
}

/// Assemble the legacy summary payload.
pub(crate) async fn build_summary(
    state: &AppState,
    group: Option<&str>,
) -> Result<SummaryResponse, DatasetError> {
    let dataset = load_dataset(&state.config.dataset_candidates)?;
    let header_line = dataset.header().ok_or_else(|| {
        DatasetError::MissingColumns(vec![
            "scientificName".to_string(),
            "numberOfOccurrences".to_string(),
        ])
    })?;
    let header = HeaderIndex::from_header_line(header_line)?;

    let options = AggregateOptions {
        class_filter: group.and_then(group_class).map(String::from),
        endangered_only: false,
    };
    let records = dataset
        .data_lines()
        .iter()
        .filter_map(|line| OccurrenceRecord::parse_line(&header, line));
    let agg = aggregate(records, &options);

    let mut species_by_class = SpeciesByClass::default();
    for species in agg.species() {
        match species.class.as_str() {
            "Aves" => species_by_class.birds += 1,
            "Mammalia" => species_by_class.mammals += 1,
            "Reptilia" => species_by_class.reptiles += 1,
            _ => species_by_class.other += 1,
        }
    }

    // Fixed table: every known code present, unknown codes dropped.
    let mut iucn_categories: HashMap<String, u64> =
        IUCN_CODES.iter().map(|c| (c.to_string(), 0)).collect();
    for (code, count) in &agg.iucn_tally {
        if let Some(entry) = iucn_categories.get_mut(code) {
            *entry = *count;
        }
    }

    let stats = SummaryStats::from_totals(
        agg.unique_species(),
        agg.endangered_species,
        agg.total_occurrences,
        group,
    );

    tracing::info!(
        "Summary: {} unique species (birds {}, mammals {}, reptiles {}, other {})",
        agg.unique_species(),
        species_by_class.birds,
        species_by_class.mammals,
        species_by_class.reptiles,
        species_by_class.other
    );

    Ok(SummaryResponse {
        data: SummaryData {
            metrics: SummaryMetrics::from(&stats),
        },
        summary: stats,
        species_by_class,
        iucn_categories,
        forecasts: load_forecasts(&state.config.forecast_file),
    })
}

/// Read the pre-computed forecast file as an opaque JSON value.
///
/// Absent or corrupt files degrade to `None`, never an error.
fn load_forecasts(path: &Path) -> Option<serde_json::Value> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Corrupt wildlife forecast file {:?}: {}", path, e);
            None
        }
    }
}
