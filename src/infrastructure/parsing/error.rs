//! Parsing error re-export
//!
//! Keeps `parsing::error::*` paths stable for callers inside the parsing tree.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
