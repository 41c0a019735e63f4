//! CSV loading and line tokenization.

use std::path::{Path, PathBuf};

use crate::error::DatasetError;

/// Split one CSV line into trimmed fields.
///
/// A quote character toggles an in-quotes flag that suspends comma
/// splitting, so `A,"B, C",D` yields three fields. There is no escaped-
/// quote handling: a doubled quote simply toggles the flag twice.
/// Malformed quoting degrades to odd field boundaries, never an error.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// The loaded dataset: which candidate path won, plus its non-blank lines.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    lines: Vec<String>,
}

impl Dataset {
    /// Parse raw file content into a dataset (blank lines dropped).
    pub fn from_content(path: impl Into<PathBuf>, content: &str) -> Self {
        let lines = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect();
        Self {
            path: path.into(),
            lines,
        }
    }

    /// The path the dataset was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The header line. `None` for an entirely blank file.
    pub fn header(&self) -> Option<&str> {
        self.lines.first().map(|s| s.as_str())
    }

    /// All lines after the header.
    pub fn data_lines(&self) -> &[String] {
        if self.lines.is_empty() {
            &[]
        } else {
            &self.lines[1..]
        }
    }

    /// Number of data rows (header excluded).
    pub fn record_count(&self) -> u64 {
        self.data_lines().len() as u64
    }
}

/// Read the dataset from the first candidate path that exists.
///
/// All candidates absent maps to a 404 for the caller, not a crash.
pub fn load_dataset(candidates: &[PathBuf]) -> Result<Dataset, DatasetError> {
    let path = candidates
        .iter()
        .find(|p| p.exists())
        .ok_or(DatasetError::NotFound)?;

    let content = std::fs::read_to_string(path)?;
    Ok(Dataset::from_content(path.clone(), content.as_str()))
}
