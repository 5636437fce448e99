//! Registry response parsing
//!
//! Envelope extraction, positional row mapping and record validation for the
//! search results, plus lenient recovery of analysis-service JSON.

pub mod analysis_parser;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod json_repair;
pub mod page_parser;
pub mod table_mapper;
pub mod validator;

// Re-export public types
pub use analysis_parser::repair_analysis;
pub use config::{ColumnLayout, ParsingConfig};
pub use context::PageContext;
pub use envelope::{FragmentExtractor, ReportedTotal, is_partial_response};
pub use error::{ParsingError, ParsingResult};
pub use page_parser::{PageParser, ParsedPage};
pub use table_mapper::TableRecordMapper;
pub use validator::RecordValidator;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse a raw response body with contextual information
    fn parse_with_context(&self, body: &str, context: &Self::Context) -> ParsingResult<Self::Output>;
}

/// Validation trait for parsed results
pub trait Validator<T> {
    /// Validate parsed data for completeness and correctness
    fn validate(&self, data: &T) -> ParsingResult<()>;
}
