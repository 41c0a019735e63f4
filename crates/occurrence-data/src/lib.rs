//! Biodiversity occurrence dataset ingestion and aggregation.
//!
//! Reads the occurrence CSV, parses rows permissively (bad values are
//! defaulted, never rejected), and folds them into the per-species,
//! per-IUCN-category, and per-period aggregates the report endpoints
//! are shaped from. Synchronous and allocation-light; all I/O-free
//! pieces are plain functions so they test without fixtures.

pub mod aggregate;
pub mod csv;
pub mod error;
pub mod record;
pub mod trend;

pub use aggregate::{aggregate, AggregateOptions, Aggregation, SpeciesAggregate, TrendPoint};
pub use csv::{load_dataset, parse_line, Dataset};
pub use error::DatasetError;
pub use record::{HeaderIndex, OccurrenceRecord};
pub use trend::synthesize_monthly_trend;
