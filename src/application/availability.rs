//! Denomination quick check
//!
//! A single partial-update POST against the denomination form, classified
//! conservatively: anything that is not clearly "no records" asks for a full
//! analysis.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::SearchRequest;
use crate::infrastructure::config::RegistryConfig;
use crate::infrastructure::config::marcanet::{denomination, markers};
use crate::infrastructure::http_client::{RegistryTransport, TransportFailure};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use crate::infrastructure::registry_error::RegistryError;
use crate::infrastructure::request_forms::denomination_form;
use crate::infrastructure::session::TokenExtractor;

/// Responses larger than this are assumed to carry results
pub const LARGE_RESPONSE_BYTES: usize = 5000;

const TOTAL_PATTERN: &str = r"total de registros\s*=\s*(\d+)";
const DATA_ROW_MARKERS: [&str; 2] = ["ui-datatable-even", "ui-datatable-odd"];
const REGISTRATION_INDICATORS: [&str; 3] = ["registro de marca", "nominativa", "mixta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    PossiblyAvailable,
    RequiresAnalysis,
    ConnectionError,
}

impl AvailabilityStatus {
    /// Status code used by the reporting layer
    pub const fn code(self) -> &'static str {
        match self {
            Self::PossiblyAvailable => "POSIBLEMENTE_DISPONIBLE",
            Self::RequiresAnalysis => "REQUIERE_ANALISIS",
            Self::ConnectionError => "ERROR_CONEXION",
        }
    }
}

/// Body classification for denomination responses
#[derive(Debug, Clone)]
pub struct DenominationRules {
    total_pattern: Regex,
}

impl DenominationRules {
    pub fn new() -> ParsingResult<Self> {
        let total_pattern = Regex::new(TOTAL_PATTERN).map_err(|e| ParsingError::InvalidPattern {
            pattern: TOTAL_PATTERN.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { total_pattern })
    }

    pub fn classify(&self, body: &str, term: &str) -> AvailabilityStatus {
        let lowered = body.to_lowercase();

        let reported = self
            .total_pattern
            .captures(&lowered)
            .and_then(|captures| captures.get(1))
            .and_then(|total| total.as_str().parse::<u64>().ok());
        if let Some(total) = reported.filter(|total| *total > 0) {
            info!("✗ Denomination found: {} records reported", total);
            return AvailabilityStatus::RequiresAnalysis;
        }

        if body.contains(denomination::RESULT_TABLE_BODY)
            && DATA_ROW_MARKERS.iter().any(|marker| body.contains(marker))
        {
            info!("✗ Denomination found: result rows present");
            return AvailabilityStatus::RequiresAnalysis;
        }

        let indicators = REGISTRATION_INDICATORS
            .iter()
            .filter(|indicator| lowered.contains(*indicator))
            .count();
        if indicators >= 2 && lowered.contains(&term.to_lowercase()) {
            info!("✗ Denomination found: registration indicators next to the term");
            return AvailabilityStatus::RequiresAnalysis;
        }

        if body.contains(markers::EMPTY_TABLE_MESSAGE) {
            info!("✓ Denomination possibly available");
            return AvailabilityStatus::PossiblyAvailable;
        }

        if body.len() > LARGE_RESPONSE_BYTES {
            warn!("Large response ({} bytes); assuming results", body.len());
        } else {
            warn!("Indeterminate response; requiring analysis");
        }
        AvailabilityStatus::RequiresAnalysis
    }
}

/// Quick availability lookup over its own transport session
pub struct DenominationChecker<T> {
    transport: T,
    landing_url: String,
    denomination_url: String,
    extractor: TokenExtractor,
    rules: DenominationRules,
}

impl<T: RegistryTransport> DenominationChecker<T> {
    pub fn new(transport: T, config: &RegistryConfig) -> ParsingResult<Self> {
        Ok(Self {
            transport,
            landing_url: config.landing_url.clone(),
            denomination_url: config.denomination_url.clone(),
            extractor: TokenExtractor::new()?,
            rules: DenominationRules::new()?,
        })
    }

    pub async fn check(&self, term: &str) -> Result<AvailabilityStatus, RegistryError> {
        self.check_with_cancellation(term, &CancellationToken::new()).await
    }

    /// Only invalid input and cancellation are errors; every registry
    /// problem maps to `ConnectionError`.
    pub async fn check_with_cancellation(
        &self,
        term: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<AvailabilityStatus, RegistryError> {
        let request = SearchRequest::new(term, None)?;
        info!("🔎 Denomination check for {:?}", request.term());

        let landing = match self.transport.bootstrap(&self.landing_url, cancellation_token).await {
            Ok(response) => response,
            Err(failure) => return connection_error(failure),
        };

        let token = self.extractor.extract(&landing.body);
        if token.is_empty() {
            warn!("❌ Landing page carries no continuation token");
            return Ok(AvailabilityStatus::ConnectionError);
        }

        let form = denomination_form(request.term(), &token);
        let response = match self
            .transport
            .submit_partial(&self.denomination_url, &form, cancellation_token)
            .await
        {
            Ok(response) => response,
            Err(failure) => return connection_error(failure),
        };

        Ok(self.rules.classify(&response.body, request.term()))
    }
}

fn connection_error(failure: TransportFailure) -> Result<AvailabilityStatus, RegistryError> {
    match failure {
        TransportFailure::Cancelled => Err(RegistryError::Cancelled),
        TransportFailure::Failed { .. } => {
            warn!("❌ Denomination check failed: {}", failure);
            Ok(AvailabilityStatus::ConnectionError)
        }
    }
}
