//! Error types for dataset ingestion.

use thiserror::Error;

/// Errors raised while locating or structurally validating the dataset.
///
/// Row-level defects never produce an error; they are defaulted in
/// [`crate::record::OccurrenceRecord`] parsing instead.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Biodiversity dataset not found")]
    NotFound,

    #[error("Required CSV columns not found ({})", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Failed to read dataset: {0}")]
    Io(String),
}

impl DatasetError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            DatasetError::NotFound => 404,
            DatasetError::MissingColumns(_) => 400,
            DatasetError::Io(_) => 500,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DatasetError::NotFound.http_status_code(), 404);
        assert_eq!(
            DatasetError::MissingColumns(vec!["scientificName".into()]).http_status_code(),
            400
        );
        assert_eq!(DatasetError::Io("disk".into()).http_status_code(), 500);
    }

    #[test]
    fn test_missing_columns_message_names_them() {
        let err = DatasetError::MissingColumns(vec![
            "scientificName".to_string(),
            "numberOfOccurrences".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Required CSV columns not found (scientificName, numberOfOccurrences)"
        );
    }
}
