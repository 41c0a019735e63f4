//! Folding occurrence records into report aggregates.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use eco_protocol::is_endangered;

use crate::record::OccurrenceRecord;

/// Filters applied while aggregating. Both compose with logical AND.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Canonical taxonomic class (e.g. "Aves"); rows of any other class
    /// are skipped entirely.
    pub class_filter: Option<String>,
    /// Drop rows whose IUCN code is outside the endangered set.
    pub endangered_only: bool,
}

impl AggregateOptions {
    fn accepts(&self, record: &OccurrenceRecord) -> bool {
        if let Some(class) = &self.class_filter {
            if record.class != *class {
                return false;
            }
        }
        if self.endangered_only && !is_endangered(&record.iucn_code) {
            return false;
        }
        true
    }
}

/// Per-species rollup. Static fields are first-seen; occurrences
/// accumulate across every row sharing the identity.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesAggregate {
    pub scientific_name: String,
    pub iucn_code: String,
    pub occurrences: u64,
    pub class: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// One bucket of the occurrence trend, keyed by `"YYYY"` or `"YYYY-MM"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub year: i32,
    pub month: Option<u32>,
    /// Distinct species observed within this period.
    pub species_count: u64,
    pub occurrences: u64,
}

#[derive(Debug, Default)]
struct TrendBucket {
    year: i32,
    month: Option<u32>,
    occurrences: u64,
    species: HashSet<String>,
}

/// Everything one pass over the dataset produces.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Sum of occurrence counts over all rows passing the filters.
    pub total_occurrences: u64,
    /// Distinct species whose first-seen IUCN code is endangered.
    pub endangered_species: u64,
    /// Rows that passed the filters.
    pub rows_processed: u64,
    /// Distinct species per IUCN code; sums to the unique-species count.
    pub iucn_tally: HashMap<String, u64>,
    species: Vec<SpeciesAggregate>,
    species_index: HashMap<String, usize>,
    trend: HashMap<String, TrendBucket>,
}

impl Aggregation {
    /// Number of unique species seen.
    pub fn unique_species(&self) -> u64 {
        self.species.len() as u64
    }

    /// Species aggregates in first-seen order.
    pub fn species(&self) -> &[SpeciesAggregate] {
        &self.species
    }

    /// Top `n` species by cumulative occurrences, descending.
    ///
    /// Ties keep first-seen order (stable sort).
    pub fn top_species(&self, n: usize) -> Vec<&SpeciesAggregate> {
        let mut sorted: Vec<&SpeciesAggregate> = self.species.iter().collect();
        sorted.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        sorted.truncate(n);
        sorted
    }

    /// Trend points sorted ascending by year, then month.
    pub fn sorted_trend(&self) -> Vec<TrendPoint> {
        let mut points: Vec<TrendPoint> = self
            .trend
            .values()
            .map(|bucket| TrendPoint {
                period: period_key(bucket.year, bucket.month),
                year: bucket.year,
                month: bucket.month,
                species_count: bucket.species.len() as u64,
                occurrences: bucket.occurrences,
            })
            .collect();
        points.sort_by_key(|p| (p.year, p.month.unwrap_or(0)));
        points
    }

    fn fold(&mut self, record: OccurrenceRecord) {
        self.rows_processed += 1;
        self.total_occurrences += record.occurrences;

        let first_seen = !self.species_index.contains_key(&record.scientific_name);
        if first_seen {
            // The tally counts distinct species, so categories and the
            // endangered count only move at first sight of a species.
            *self.iucn_tally.entry(record.iucn_code.clone()).or_insert(0) += 1;
            if is_endangered(&record.iucn_code) {
                self.endangered_species += 1;
            }

            self.species_index
                .insert(record.scientific_name.clone(), self.species.len());
            self.species.push(SpeciesAggregate {
                scientific_name: record.scientific_name.clone(),
                iucn_code: record.iucn_code.clone(),
                occurrences: record.occurrences,
                class: record.class.clone(),
                year: record.year,
                month: record.month,
            });
        } else {
            let idx = self.species_index[&record.scientific_name];
            self.species[idx].occurrences += record.occurrences;
        }

        if let Some(year) = record.year {
            let key = period_key(year, record.month);
            let bucket = self.trend.entry(key).or_insert_with(|| TrendBucket {
                year,
                month: record.month,
                ..TrendBucket::default()
            });
            bucket.occurrences += record.occurrences;
            bucket.species.insert(record.scientific_name.clone());
        }
    }
}

/// Format a trend bucket key: `"YYYY"` or zero-padded `"YYYY-MM"`.
pub fn period_key(year: i32, month: Option<u32>) -> String {
    match month {
        Some(m) => format!("{}-{:02}", year, m),
        None => year.to_string(),
    }
}

/// Fold records into an [`Aggregation`] under the given filters.
pub fn aggregate<I>(records: I, options: &AggregateOptions) -> Aggregation
where
    I: IntoIterator<Item = OccurrenceRecord>,
{
    let mut agg = Aggregation::default();
    for record in records {
        if options.accepts(&record) {
            agg.fold(record);
        }
    }
    agg
}
