//! Whole-query error taxonomy for registry access
//!
//! Row and field problems never show up here; they are absorbed by the
//! mapper and validator. These variants describe why a query (or one attempt
//! of it) could not complete.

use std::time::Duration;
use thiserror::Error;

use crate::domain::InvalidSearchInput;
use crate::infrastructure::config::defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    Timeout,
    Connection,
    HttpStatus(u16),
}

impl std::fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connection => write!(f, "connection error"),
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidSearchInput),

    #[error("Registry unavailable while bootstrapping session: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Transport failure ({kind}) on page {page_index}: {message}")]
    TransportError {
        kind: TransportFailureKind,
        page_index: u32,
        message: String,
    },

    #[error("Unrecognized registry response on page {page_index}: {reason}")]
    UnparsableResponse { page_index: u32, reason: String },

    #[error("Gave up after {attempts} attempts; last error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("Search cancelled by caller")]
    Cancelled,
}

impl RegistryError {
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    pub fn transport(kind: TransportFailureKind, page_index: u32, message: impl Into<String>) -> Self {
        Self::TransportError {
            kind,
            page_index,
            message: message.into(),
        }
    }

    pub fn unparsable(page_index: u32, reason: impl Into<String>) -> Self {
        Self::UnparsableResponse {
            page_index,
            reason: reason.into(),
        }
    }

    /// Whether a fresh attempt (new token, page 0) may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. }
                | Self::TransportError { .. }
                | Self::UnparsableResponse { .. }
        )
    }

    /// Whether the session's continuation token should be discarded
    pub const fn invalidates_session(&self) -> bool {
        self.is_retryable()
    }

    /// Suggested delay before the next attempt
    pub const fn retry_delay(&self) -> Option<Duration> {
        if self.is_retryable() {
            Some(Duration::from_millis(defaults::RETRY_DELAY_MS))
        } else {
            None
        }
    }
}
