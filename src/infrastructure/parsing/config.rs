//! Parsing configuration for result-table extraction
//!
//! Selector fallbacks and the positional column layout of the registry table.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::marcanet::{markers, phonetic};

/// Main parsing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Selectors for the result table body, tried in order
    pub table_body_selectors: Vec<String>,

    /// Row selectors inside the table body, tried in order
    pub row_selectors: Vec<String>,

    /// Substrings marking a fragment as carrying the result table
    pub table_hints: Vec<String>,

    /// Class of the row PrimeFaces renders for an empty table
    pub empty_marker: String,

    pub columns: ColumnLayout,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            table_body_selectors: vec![
                format!("tbody[id=\"{}\"]", phonetic::RESULT_TABLE_BODY),
                format!("tbody.{}", markers::DATA_TABLE_BODY_CLASS),
            ],
            row_selectors: vec!["tr[data-ri]".to_string(), "tr".to_string()],
            table_hints: vec![
                markers::RESULT_TABLE_HINT.to_string(),
                markers::DATA_TABLE_BODY_CLASS.to_string(),
            ],
            empty_marker: markers::EMPTY_TABLE_MESSAGE.to_string(),
            columns: ColumnLayout::default(),
        }
    }
}

/// Zero-based column offsets of the phonetic search table.
///
/// Registry order: #, sign type, mark type (unused), holder, case number,
/// registration number, name, class, logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub sign_type: usize,
    pub holder: usize,
    pub case_number: usize,
    pub registration_number: usize,
    pub name: usize,
    pub nice_class: usize,

    /// Rows with fewer cells are header/footer noise
    pub min_cells: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            sign_type: 1,
            holder: 3,
            case_number: 4,
            registration_number: 5,
            name: 6,
            nice_class: 7,
            min_cells: 8,
        }
    }
}
