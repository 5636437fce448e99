//! IMPI Search - trademark registry search engine
//!
//! Drives the registry's stateful JSF partial-update protocol (continuation
//! token, paginated result table), maps the embedded table into typed records,
//! and recovers structured viability analyses from free-text service replies.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    AvailabilityStatus, BusinessKind, ClassSuggestion, DenominationChecker, RegistrySearchClient,
    parse_class_suggestion,
};
pub use domain::{
    NiceClass, RegistryRecord, RepairedAnalysis, SearchRequest, SearchResult, ViabilityCategory,
};
pub use infrastructure::{AppConfig, RegistryError};

/// One query on a fresh client with default configuration.
///
/// Each call owns its own HTTP session and continuation token. Failures are
/// reported through `SearchResult::error_detail`; only a client that cannot be
/// built at all is an error.
pub async fn search(term: &str, category_filter: Option<i64>) -> anyhow::Result<SearchResult> {
    search_with_config(&AppConfig::default(), term, category_filter).await
}

pub async fn search_with_config(
    config: &AppConfig,
    term: &str,
    category_filter: Option<i64>,
) -> anyhow::Result<SearchResult> {
    let mut client = RegistrySearchClient::from_config(config)?;
    Ok(client.search_term(term, category_filter).await)
}

/// Best-effort structured analysis; never fails.
pub fn repair_analysis(raw: &str) -> RepairedAnalysis {
    infrastructure::parsing::repair_analysis(raw)
}
