//! Search request and aggregate result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::nice_class::NiceClass;
use super::record::RegistryRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSearchInput {
    #[error("search term is empty")]
    EmptyTerm,

    #[error("category filter {0} is outside 1-45")]
    ClassOutOfRange(i64),
}

/// Normalized, immutable query against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    term: String,
    category_filter: Option<NiceClass>,
}

impl SearchRequest {
    /// Uppercases the term and collapses inner whitespace.
    pub fn new(term: &str, category_filter: Option<i64>) -> Result<Self, InvalidSearchInput> {
        let term = normalize_term(term);
        if term.is_empty() {
            return Err(InvalidSearchInput::EmptyTerm);
        }

        let category_filter = category_filter
            .map(|number| {
                NiceClass::new(number).map_err(|_| InvalidSearchInput::ClassOutOfRange(number))
            })
            .transpose()?;

        Ok(Self {
            term,
            category_filter,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub const fn category_filter(&self) -> Option<NiceClass> {
        self.category_filter
    }
}

pub fn normalize_term(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Records accepted from one page response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    pub page_index: u32,
    pub records: Vec<RegistryRecord>,
    pub raw_byte_length: usize,
    pub is_last_page: bool,
}

impl ResultPage {
    pub fn summary(&self) -> PageSummary {
        PageSummary {
            page_index: self.page_index,
            record_count: self.records.len(),
            raw_byte_length: self.raw_byte_length,
            is_last_page: self.is_last_page,
        }
    }
}

/// What is left of a page once its records were folded into the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_index: u32,
    pub record_count: usize,
    pub raw_byte_length: usize,
    pub is_last_page: bool,
}

/// Aggregate outcome of one query.
///
/// Records may repeat across pages when a retry restarted pagination; use
/// [`SearchResult::deduplicated_by_case_number`] when a unique list is needed.
/// A failed result never carries records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query_id: Uuid,
    /// `None` when the input was rejected before a request was built.
    pub query: Option<SearchRequest>,
    pub requested_term: String,
    pub records: Vec<RegistryRecord>,
    pub total_reported: usize,
    pub elapsed: Duration,
    pub searched_at: DateTime<Utc>,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    pub pages: Vec<PageSummary>,
    /// Pagination stopped at the page ceiling.
    pub truncated: bool,
    pub attempts: u32,
}

impl SearchResult {
    pub fn success(
        query_id: Uuid,
        query: SearchRequest,
        records: Vec<RegistryRecord>,
        reported_total: Option<usize>,
        pages: Vec<PageSummary>,
        truncated: bool,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        let total_reported = reported_total.unwrap_or(records.len()).max(records.len());
        Self {
            query_id,
            requested_term: query.term().to_string(),
            query: Some(query),
            records,
            total_reported,
            elapsed,
            searched_at: Utc::now(),
            succeeded: true,
            error_detail: None,
            pages,
            truncated,
            attempts,
        }
    }

    pub fn failure(
        query_id: Uuid,
        query: Option<SearchRequest>,
        requested_term: &str,
        error_detail: String,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            query_id,
            query,
            requested_term: requested_term.to_string(),
            records: Vec::new(),
            total_reported: 0,
            elapsed,
            searched_at: Utc::now(),
            succeeded: false,
            error_detail: Some(error_detail),
            pages: Vec::new(),
            truncated: false,
            attempts,
        }
    }

    /// First occurrence of every case number, original order kept.
    pub fn deduplicated_by_case_number(&self) -> Vec<RegistryRecord> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|record| seen.insert(record.case_number.as_str()))
            .cloned()
            .collect()
    }

    pub fn group_by_class(&self) -> BTreeMap<NiceClass, Vec<&RegistryRecord>> {
        let mut groups: BTreeMap<NiceClass, Vec<&RegistryRecord>> = BTreeMap::new();
        for record in &self.records {
            if let Some(class) = record.nice_class_number() {
                groups.entry(class).or_default().push(record);
            }
        }
        groups
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
