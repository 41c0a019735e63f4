//! Header resolution and per-row record parsing.

use crate::csv::parse_line;
use crate::error::DatasetError;

/// Column positions resolved from the dataset header.
///
/// `scientificName` and `numberOfOccurrences` are required; everything
/// else is optional and simply absent from older dataset exports.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    scientific_name: usize,
    occurrences: usize,
    accepted_name: Option<usize>,
    iucn: Option<usize>,
    class: Option<usize>,
    taxon_rank: Option<usize>,
    year: Option<usize>,
    month: Option<usize>,
}

impl HeaderIndex {
    /// Resolve column positions from the parsed header fields.
    pub fn resolve(headers: &[String]) -> Result<Self, DatasetError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let scientific_name = find("scientificName");
        let occurrences = find("numberOfOccurrences");

        let mut missing = Vec::new();
        if scientific_name.is_none() {
            missing.push("scientificName".to_string());
        }
        if occurrences.is_none() {
            missing.push("numberOfOccurrences".to_string());
        }
        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns(missing));
        }

        Ok(Self {
            scientific_name: scientific_name.unwrap(),
            occurrences: occurrences.unwrap(),
            accepted_name: find("acceptedScientificName"),
            iucn: find("iucnRedListCategory"),
            class: find("class"),
            taxon_rank: find("taxonRank"),
            year: find("year"),
            month: find("month"),
        })
    }

    /// Resolve directly from the raw header line.
    pub fn from_header_line(line: &str) -> Result<Self, DatasetError> {
        Self::resolve(&parse_line(line))
    }
}

/// One parsed occurrence row.
///
/// Parsing is permissive: bad numerics become 0 or `None`, a blank IUCN
/// column becomes `NOT_EVALUATED`. Only a blank identity drops the row.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceRecord {
    /// Species identity: the accepted scientific name when present,
    /// otherwise the scientific name.
    pub scientific_name: String,
    pub iucn_code: String,
    pub occurrences: u64,
    /// Taxonomic class; empty when the dataset left it blank.
    pub class: String,
    pub taxon_rank: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Strip stray quote characters left behind by partially-quoted exports.
fn strip_quotes(field: &str) -> String {
    field.replace('"', "").trim().to_string()
}

fn field<'a>(cols: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| cols.get(i)).map(|s| s.as_str())
}

impl OccurrenceRecord {
    /// Parse a record from tokenized row fields.
    ///
    /// Returns `None` when the row has no usable species identity.
    pub fn parse(header: &HeaderIndex, cols: &[String]) -> Option<Self> {
        let accepted = field(cols, header.accepted_name)
            .map(strip_quotes)
            .filter(|s| !s.is_empty());
        let scientific = cols
            .get(header.scientific_name)
            .map(|s| strip_quotes(s))
            .filter(|s| !s.is_empty());

        let scientific_name = accepted.or(scientific)?;

        let occurrences = cols
            .get(header.occurrences)
            .and_then(|s| strip_quotes(s).parse::<u64>().ok())
            .unwrap_or(0);

        let iucn_code = field(cols, header.iucn)
            .map(strip_quotes)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "NOT_EVALUATED".to_string());

        let class = field(cols, header.class).map(strip_quotes).unwrap_or_default();
        let taxon_rank = field(cols, header.taxon_rank)
            .map(strip_quotes)
            .unwrap_or_default();

        let year = field(cols, header.year)
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|y| *y > 0);
        let month = field(cols, header.month)
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|m| (1..=12).contains(m));

        Some(Self {
            scientific_name,
            iucn_code,
            occurrences,
            class,
            taxon_rank,
            year,
            month,
        })
    }

    /// Parse a record from a raw CSV line.
    pub fn parse_line(header: &HeaderIndex, line: &str) -> Option<Self> {
        Self::parse(header, &parse_line(line))
    }
}
