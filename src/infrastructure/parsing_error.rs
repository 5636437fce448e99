//! Parsing error types for registry responses
//!
//! Distinguishes responses that cannot be interpreted at all (which end the
//! current attempt) from row-level rejections (which are only logged).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Response body is empty")]
    EmptyBody,

    #[error("Registry returned a server-side error: {message}")]
    ServerError { message: String },

    #[error("Partial response contains no markup fragments")]
    NoFragments,

    #[error("Result markup not recognized: {reason}")]
    UnrecognizedMarkup { reason: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Record rejected ({field}): {reason}")]
    RecordRejected { field: &'static str, reason: String },
}

impl ParsingError {
    pub fn unrecognized(reason: impl Into<String>) -> Self {
        Self::UnrecognizedMarkup {
            reason: reason.into(),
        }
    }

    pub fn rejected(field: &'static str, reason: impl Into<String>) -> Self {
        Self::RecordRejected {
            field,
            reason: reason.into(),
        }
    }

    /// Errors worth a fresh session and a new attempt
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyBody | Self::ServerError { .. } | Self::NoFragments | Self::UnrecognizedMarkup { .. }
        )
    }
}

/// Result type for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;
