//! The rich biodiversity report endpoint.
//!
//! `GET /api/biodiversity/report?group=<birds|mammals|amphibians>&only=endangered`
//!
//! The primary payload is shaped from cached common names only; cache
//! misses are resolved by a detached background task that may finish
//! after the response has been sent.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use eco_protocol::{
    group_class, iucn_color, round2, IucnBreakdownEntry, ReportMetadata, ReportResponse,
    ReportSummary, SpeciesEntry, TrendPointPayload,
};
use occurrence_data::{
    aggregate, load_dataset, synthesize_monthly_trend, AggregateOptions, DatasetError,
    HeaderIndex, OccurrenceRecord, TrendPoint,
};

use crate::handlers::dataset_error_response;
use crate::state::AppState;

/// Reference year for the synthetic fallback series.
const SYNTHETIC_TREND_YEAR: i32 = 2026;

/// Cap on the species list returned to callers.
const TOP_SPECIES: usize = 100;

/// Query parameters for the report endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct ReportParams {
    /// Species group filter (birds, mammals, amphibians, reptiles).
    pub group: Option<String>,

    /// Set to "endangered" to keep only CR/EN/VU rows.
    pub only: Option<String>,
}

impl ReportParams {
    pub(crate) fn aggregate_options(&self) -> AggregateOptions {
        let class_filter = self
            .group
            .as_deref()
            .and_then(group_class)
            .map(String::from);
        let endangered_only = self
            .only
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("endangered"))
            .unwrap_or(false);
        AggregateOptions {
            class_filter,
            endangered_only,
        }
    }
}

/// GET /api/biodiversity/report
pub async fn report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Response {
    tracing::info!(
        "Report requested: group={:?}, only={:?}",
        params.group,
        params.only
    );

    match build_report(&state, &params.aggregate_options()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => dataset_error_response(e, "Failed to generate biodiversity report"),
    }
}

/// Assemble the full report payload.
pub(crate) async fn build_report(
    state: &AppState,
    options: &AggregateOptions,
) -> Result<ReportResponse, DatasetError> {
    let dataset = load_dataset(&state.config.dataset_candidates)?;
    let header_line = dataset.header().ok_or_else(|| {
        DatasetError::MissingColumns(vec![
            "scientificName".to_string(),
            "numberOfOccurrences".to_string(),
        ])
    })?;
    let header = HeaderIndex::from_header_line(header_line)?;

    let records = dataset
        .data_lines()
        .iter()
        .filter_map(|line| OccurrenceRecord::parse_line(&header, line));
    let agg = aggregate(records, options);

    let unique = agg.unique_species();

    let mut iucn_breakdown = HashMap::new();
    for (code, count) in &agg.iucn_tally {
        let percentage = if unique == 0 {
            0.0
        } else {
            round2(*count as f64 / unique as f64 * 100.0)
        };
        iucn_breakdown.insert(
            code.clone(),
            IucnBreakdownEntry {
                count: *count,
                percentage,
                color: iucn_color(code).to_string(),
            },
        );
    }

    // Primary response uses cached names only; misses go to a detached
    // enrichment task so a slow lookup never delays the report.
    state.common_names.ensure_loaded().await;
    let mut uncached = Vec::new();
    let mut species_list = Vec::new();
    for species in agg.top_species(TOP_SPECIES) {
        let cached = state.common_names.get_cached(&species.scientific_name).await;
        if cached.is_none() {
            uncached.push(species.scientific_name.clone());
        }
        species_list.push(SpeciesEntry {
            scientific_name: species.scientific_name.clone(),
            common_name: cached.unwrap_or_else(|| species.scientific_name.clone()),
            iucn_red_list_category: species.iucn_code.clone(),
            total_occurrences: species.occurrences,
            species_group: if species.class.is_empty() {
                "Unknown".to_string()
            } else {
                species.class.clone()
            },
            color: iucn_color(&species.iucn_code).to_string(),
        });
    }

    if !uncached.is_empty() {
        tracing::info!(
            "Fetching common names for {} uncached species in background",
            uncached.len()
        );
        let cache = Arc::clone(&state.common_names);
        tokio::spawn(async move {
            let resolved = cache.resolve_batch(&uncached).await;
            tracing::info!("Background enrichment cached {} common names", resolved.len());
        });
    }

    let mut trend = agg.sorted_trend();
    let mut synthetic_trend = false;
    if trend.is_empty() && unique > 0 {
        trend = synthesize_monthly_trend(unique, agg.total_occurrences, SYNTHETIC_TREND_YEAR);
        synthetic_trend = true;
    }

    let summary = ReportSummary::from_totals(unique, agg.endangered_species, agg.total_occurrences);

    tracing::info!(
        "Generated report: {} unique species, {} endangered, {} occurrences",
        unique,
        agg.endangered_species,
        agg.total_occurrences
    );

    Ok(ReportResponse {
        summary,
        iucn_breakdown,
        species_list,
        trend: trend.into_iter().map(trend_payload).collect(),
        metadata: ReportMetadata::new(
            dataset.path().display().to_string(),
            dataset.record_count(),
            synthetic_trend,
        ),
    })
}

fn trend_payload(point: TrendPoint) -> TrendPointPayload {
    TrendPointPayload {
        period: point.period,
        species_count: point.species_count,
        occurrences: point.occurrences,
        year: Some(point.year),
        month: point.month,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_names::{CommonNameCache, VernacularLookup};
    use crate::config::ServiceConfig;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NoLookup;

    #[async_trait]
    impl VernacularLookup for NoLookup {
        async fn lookup(&self, _scientific_name: &str) -> Option<String> {
            None
        }
    }

    /// Stub lookup that counts calls and replies with a fixed name.
    struct CountingLookup {
        calls: AtomicUsize,
        response: String,
    }

    impl CountingLookup {
        fn new(name: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: name.to_string(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VernacularLookup for CountingLookup {
        async fn lookup(&self, _scientific_name: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(self.response.clone())
        }
    }

    fn state_with_lookup(
        dir: &tempfile::TempDir,
        csv: &str,
        lookup: Arc<dyn VernacularLookup>,
    ) -> AppState {
        let csv_path = dir.path().join("biodiversity.csv");
        let mut f = std::fs::File::create(&csv_path).unwrap();
        write!(f, "{}", csv).unwrap();

        let config = ServiceConfig {
            dataset_candidates: vec![csv_path],
            cache_file: dir.path().join("names.json"),
            forecast_file: dir.path().join("forecast.json"),
            gbif_base_url: "http://unused.invalid".to_string(),
        };
        AppState {
            config,
            common_names: Arc::new(CommonNameCache::new(dir.path().join("names.json"), lookup)),
        }
    }

    fn state_for_csv(dir: &tempfile::TempDir, csv: &str) -> AppState {
        state_with_lookup(dir, csv, Arc::new(NoLookup))
    }

    #[tokio::test]
    async fn test_report_panthera_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for_csv(
            &dir,
            "scientificName,numberOfOccurrences,iucnRedListCategory,class,year\n\
             \"Panthera tigris\",50,EN,Mammalia,2020\n\
             \"Panthera tigris\",25,EN,Mammalia,2021\n",
        );

        let report = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap();

        assert_eq!(report.summary.total_unique_species, 1);
        assert_eq!(report.summary.total_occurrences, 75);
        assert_eq!(report.species_list.len(), 1);
        assert_eq!(report.species_list[0].total_occurrences, 75);
        // Seeded cache already knows this one.
        assert_eq!(report.species_list[0].common_name, "Bengal Tiger");
        assert!(!report.metadata.synthetic_trend);
        let periods: Vec<&str> = report.trend.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2020", "2021"]);
    }

    #[tokio::test]
    async fn test_report_group_filter_excludes_other_classes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for_csv(
            &dir,
            "scientificName,numberOfOccurrences,iucnRedListCategory,class\n\
             Pavo cristatus,12,LC,Aves\n\
             Panthera tigris,50,EN,Mammalia\n",
        );

        let params = ReportParams {
            group: Some("birds".to_string()),
            only: None,
        };
        let report = build_report(&state, &params.aggregate_options())
            .await
            .unwrap();

        assert_eq!(report.summary.total_unique_species, 1);
        assert_eq!(report.species_list[0].scientific_name, "Pavo cristatus");
    }

    #[tokio::test]
    async fn test_report_without_temporal_columns_synthesizes_trend() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for_csv(
            &dir,
            "scientificName,numberOfOccurrences,iucnRedListCategory,class\n\
             Pavo cristatus,120,LC,Aves\n",
        );

        let report = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap();

        assert!(report.metadata.synthetic_trend);
        assert_eq!(report.trend.len(), 12);
        assert_eq!(report.trend[0].period, "2026-01");
    }

    #[tokio::test]
    async fn test_report_zero_matching_rows_is_nan_safe() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for_csv(
            &dir,
            "scientificName,numberOfOccurrences,iucnRedListCategory,class\n\
             Panthera tigris,50,EN,Mammalia\n",
        );

        let params = ReportParams {
            group: Some("birds".to_string()),
            only: None,
        };
        let report = build_report(&state, &params.aggregate_options())
            .await
            .unwrap();

        assert_eq!(report.summary.total_unique_species, 0);
        assert_eq!(report.summary.average_occurrences, 0.0);
        assert!(report.species_list.is_empty());
        assert!(report.trend.is_empty());
        assert!(!report.metadata.synthetic_trend);
    }

    #[tokio::test]
    async fn test_report_missing_columns_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for_csv(&dir, "species,count\nPavo cristatus,12\n");

        let err = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);
        assert!(err.to_string().contains("scientificName"));
    }

    #[tokio::test]
    async fn test_report_missing_dataset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            config: ServiceConfig {
                dataset_candidates: vec![dir.path().join("absent.csv")],
                cache_file: dir.path().join("names.json"),
                forecast_file: dir.path().join("forecast.json"),
                gbif_base_url: "http://unused.invalid".to_string(),
            },
            common_names: Arc::new(CommonNameCache::new(
                dir.path().join("names.json"),
                Arc::new(NoLookup),
            )),
        };

        let err = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 404);
    }

    #[tokio::test]
    async fn test_uncached_species_falls_back_then_enriches_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = Arc::new(CountingLookup::new("Forest Owlet"));
        // A species outside the seed table.
        let state = state_with_lookup(
            &dir,
            "scientificName,numberOfOccurrences,iucnRedListCategory,class\n\
             Athene blewitti,5,CR,Aves\n",
            Arc::clone(&lookup) as Arc<dyn VernacularLookup>,
        );

        let report = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap();

        // The primary response never waits for the remote path: the miss
        // falls back to the scientific name with zero lookups issued.
        assert_eq!(report.species_list[0].common_name, "Athene blewitti");
        assert_eq!(lookup.call_count(), 0, "response must not await the lookup");

        // The detached enrichment task populates the cache afterwards.
        for _ in 0..200 {
            if state.common_names.get_cached("Athene blewitti").await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(lookup.call_count(), 1);
        assert_eq!(
            state.common_names.get_cached("Athene blewitti").await.as_deref(),
            Some("Forest Owlet")
        );

        // A second report is a straight cache hit.
        let report = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap();
        assert_eq!(report.species_list[0].common_name, "Forest Owlet");
        assert_eq!(lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_report_endangered_ratio_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = String::from("scientificName,numberOfOccurrences,iucnRedListCategory,class\n");
        csv.push_str("Species cr,1,CR,Aves\n");
        csv.push_str("Species en,1,EN,Aves\n");
        csv.push_str("Species vu,1,VU,Aves\n");
        for i in 0..7 {
            csv.push_str(&format!("Species lc{},1,LC,Aves\n", i));
        }
        let state = state_for_csv(&dir, &csv);

        let report = build_report(&state, &AggregateOptions::default())
            .await
            .unwrap();

        assert_eq!(report.summary.total_unique_species, 10);
        assert_eq!(report.summary.endangered_species, 3);
        assert_eq!(report.summary.endangered_ratio, 30.00);
        assert_eq!(report.summary.biodiversity_index, 70.00);

        let breakdown_sum: u64 = report.iucn_breakdown.values().map(|e| e.count).sum();
        assert_eq!(breakdown_sum, 10);
        assert_eq!(report.iucn_breakdown["LC"].percentage, 70.00);
    }

    #[test]
    fn test_params_endangered_flag() {
        let params = ReportParams {
            group: None,
            only: Some("Endangered".to_string()),
        };
        assert!(params.aggregate_options().endangered_only);

        let params = ReportParams {
            group: None,
            only: Some("all".to_string()),
        };
        assert!(!params.aggregate_options().endangered_only);
    }
}
