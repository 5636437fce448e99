//! Continuation token (JSF view state) management
//!
//! One `SessionManager` belongs to one client instance. The token is opaque:
//! it is captured, echoed back and discarded, never interpreted.

use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::marcanet::faces;
use super::http_client::{RegistryTransport, TransportFailure};
use super::parsing_error::{ParsingError, ParsingResult};
use super::registry_error::RegistryError;

/// Opaque view-state value; empty when the landing page did not carry one.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Token values are session credentials; keep them out of logs
impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContinuationToken(<{} chars>)", self.0.len())
    }
}

/// Finds the view state in full pages and in partial-response updates
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    input_selector: Selector,
    update_pattern: Regex,
}

impl TokenExtractor {
    pub fn new() -> ParsingResult<Self> {
        let selector_str = format!("input[name=\"{}\"]", faces::VIEW_STATE);
        let input_selector =
            Selector::parse(&selector_str).map_err(|e| ParsingError::InvalidSelector {
                selector: selector_str.clone(),
                reason: e.to_string(),
            })?;

        let pattern = format!(
            r#"(?s)<update\s+id="[^"]*{}[^"]*">\s*<!\[CDATA\[(.*?)\]\]>"#,
            regex::escape(faces::VIEW_STATE)
        );
        let update_pattern = Regex::new(&pattern).map_err(|e| ParsingError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            input_selector,
            update_pattern,
        })
    }

    /// Token from a hidden input or a `ViewState` update element; empty if absent.
    pub fn extract(&self, body: &str) -> ContinuationToken {
        if let Some(token) = self.from_partial_update(body) {
            return token;
        }

        let document = Html::parse_document(body);
        document
            .select(&self.input_selector)
            .filter_map(|input| input.value().attr("value"))
            .map(ContinuationToken::new)
            .find(|token| !token.is_empty())
            .unwrap_or_default()
    }

    fn from_partial_update(&self, body: &str) -> Option<ContinuationToken> {
        self.update_pattern
            .captures(body)
            .and_then(|captures| captures.get(1))
            .map(|value| ContinuationToken::new(value.as_str()))
            .filter(|token| !token.is_empty())
    }
}

/// Owns the token for one client instance
#[derive(Debug)]
pub struct SessionManager {
    landing_url: String,
    extractor: TokenExtractor,
    token: Option<ContinuationToken>,
}

impl SessionManager {
    pub fn new(landing_url: impl Into<String>) -> ParsingResult<Self> {
        Ok(Self {
            landing_url: landing_url.into(),
            extractor: TokenExtractor::new()?,
            token: None,
        })
    }

    pub const fn current(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    /// One GET of the landing page. An absent marker yields an empty token,
    /// which is not cached. No retry here.
    pub async fn acquire<T>(
        &mut self,
        transport: &T,
        cancellation_token: &CancellationToken,
    ) -> Result<ContinuationToken, RegistryError>
    where
        T: RegistryTransport + ?Sized,
    {
        let response = transport
            .bootstrap(&self.landing_url, cancellation_token)
            .await
            .map_err(|failure| match failure {
                TransportFailure::Cancelled => RegistryError::Cancelled,
                TransportFailure::Failed { .. } => RegistryError::upstream_unavailable(failure.to_string()),
            })?;

        let token = self.extractor.extract(&response.body);
        if token.is_empty() {
            warn!("⚠️ Landing page carries no continuation token; continuing without one");
            self.token = None;
        } else {
            info!("🔑 Continuation token acquired ({} chars)", token.as_str().len());
            self.token = Some(token.clone());
        }
        Ok(token)
    }

    /// Cached token, or a fresh one from the landing page.
    pub async fn ensure<T>(
        &mut self,
        transport: &T,
        cancellation_token: &CancellationToken,
    ) -> Result<ContinuationToken, RegistryError>
    where
        T: RegistryTransport + ?Sized,
    {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => self.acquire(transport, cancellation_token).await,
        }
    }

    /// Adopts a renewed token carried by a partial response, if any.
    pub fn refresh_from_response(&mut self, body: &str) {
        if let Some(renewed) = self.extractor.from_partial_update(body) {
            if self.token.as_ref() != Some(&renewed) {
                debug!("Continuation token renewed by partial response");
                self.token = Some(renewed);
            }
        }
    }

    pub fn invalidate(&mut self) {
        if self.token.take().is_some() {
            debug!("Continuation token invalidated");
        }
    }

    pub const fn extractor(&self) -> &TokenExtractor {
        &self.extractor
    }
}
