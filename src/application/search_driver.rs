//! Paginated query driver for the phonetic search
//!
//! One `RegistrySearchClient` owns one transport session and one continuation
//! token. Queries on the same client run one at a time (`&mut self`); callers
//! that need parallel queries create independent clients.
//!
//! Each attempt walks pages 0, 1, 2, ... until a termination rule fires. Any
//! retryable failure discards the token and restarts the attempt from page 0,
//! so a failed query never returns a partial record set.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::domain::{PageSummary, RegistryRecord, ResultPage, SearchRequest, SearchResult};
use crate::infrastructure::config::{AppConfig, RegistryConfig};
use crate::infrastructure::http_client::{RegistryHttpClient, RegistryTransport, TransportFailure};
use crate::infrastructure::parsing::{ContextualParser, PageContext, PageParser};
use crate::infrastructure::registry_error::RegistryError;
use crate::infrastructure::request_forms::{PageAction, PageRequestForm};
use crate::infrastructure::retry_manager::{RetryDecision, RetryManager, RetryPolicy};
use crate::infrastructure::session::{ContinuationToken, SessionManager};

/// Why pagination stopped after a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page after the first returned no valid records
    EmptyPage,
    /// Fewer valid records than a full page
    ShortPage,
    /// Accumulated records reached the server-reported total
    ReportedTotalReached,
    /// No continuation token, so only the first page is reachable
    NoContinuation,
    /// Page ceiling hit; the result is marked truncated
    PageCeiling,
}

/// Termination rules, checked in order after each page.
pub fn stop_reason(
    page_index: u32,
    accepted_on_page: usize,
    accumulated: usize,
    reported_total: Option<usize>,
    token: &ContinuationToken,
    page_size: u32,
    max_pages: u32,
) -> Option<StopReason> {
    if page_index > 0 && accepted_on_page == 0 {
        Some(StopReason::EmptyPage)
    } else if accepted_on_page < page_size as usize {
        Some(StopReason::ShortPage)
    } else if reported_total.is_some_and(|total| accumulated >= total) {
        Some(StopReason::ReportedTotalReached)
    } else if token.is_empty() {
        Some(StopReason::NoContinuation)
    } else if page_index + 1 >= max_pages {
        Some(StopReason::PageCeiling)
    } else {
        None
    }
}

/// Records and bookkeeping from one successful attempt
#[derive(Debug, Default)]
struct PaginationOutcome {
    records: Vec<RegistryRecord>,
    reported_total: Option<usize>,
    pages: Vec<PageSummary>,
    truncated: bool,
}

/// Search client bound to one registry session
pub struct RegistrySearchClient<T = RegistryHttpClient> {
    transport: T,
    session: SessionManager,
    parser: PageParser,
    registry: RegistryConfig,
    retry_policy: RetryPolicy,
}

impl RegistrySearchClient<RegistryHttpClient> {
    /// Client with its own reqwest session
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let transport = RegistryHttpClient::new(&config.registry)?;
        Self::new(transport, config)
    }
}

impl<T: RegistryTransport> RegistrySearchClient<T> {
    pub fn new(transport: T, config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            transport,
            session: SessionManager::new(config.registry.landing_url.clone())?,
            parser: PageParser::new()?,
            registry: config.registry.clone(),
            retry_policy: RetryPolicy::from_settings(&config.retry),
        })
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Validates raw input, then searches. Invalid input fails without any
    /// network call or retry.
    pub async fn search_term(&mut self, term: &str, category_filter: Option<i64>) -> SearchResult {
        self.search_term_with_cancellation(term, category_filter, &CancellationToken::new())
            .await
    }

    pub async fn search_term_with_cancellation(
        &mut self,
        term: &str,
        category_filter: Option<i64>,
        cancellation_token: &CancellationToken,
    ) -> SearchResult {
        let started = Instant::now();
        match SearchRequest::new(term, category_filter) {
            Ok(request) => self.search_with_cancellation(&request, cancellation_token).await,
            Err(invalid) => {
                let error = RegistryError::from(invalid);
                warn!("❌ Rejected search input {:?}: {}", term, error);
                SearchResult::failure(Uuid::new_v4(), None, term, error.to_string(), 0, started.elapsed())
            }
        }
    }

    pub async fn search(&mut self, request: &SearchRequest) -> SearchResult {
        self.search_with_cancellation(request, &CancellationToken::new()).await
    }

    /// Cancellation is checked before every page request and during retry
    /// delays; a cancelled query returns a failed result with no records.
    pub async fn search_with_cancellation(
        &mut self,
        request: &SearchRequest,
        cancellation_token: &CancellationToken,
    ) -> SearchResult {
        let query_id = Uuid::new_v4();
        let span = info_span!(
            "registry_search",
            %query_id,
            term = request.term(),
            class = request.category_filter().map(|c| c.number())
        );
        self.run_query(query_id, request, cancellation_token)
            .instrument(span)
            .await
    }

    async fn run_query(
        &mut self,
        query_id: Uuid,
        request: &SearchRequest,
        cancellation_token: &CancellationToken,
    ) -> SearchResult {
        let started = Instant::now();
        let mut retry = RetryManager::new(self.retry_policy);
        info!("🔍 Searching registry for {:?}", request.term());

        loop {
            let error = match self.attempt(request, cancellation_token).await {
                Ok(outcome) => {
                    retry.record_success();
                    info!(
                        "✅ {} records from {} pages in {:?} (attempt {})",
                        outcome.records.len(),
                        outcome.pages.len(),
                        started.elapsed(),
                        retry.attempts()
                    );
                    return SearchResult::success(
                        query_id,
                        request.clone(),
                        outcome.records,
                        outcome.reported_total,
                        outcome.pages,
                        outcome.truncated,
                        retry.attempts(),
                        started.elapsed(),
                    );
                }
                Err(error) => error,
            };

            if error.invalidates_session() {
                self.session.invalidate();
            }

            let delay = match retry.record_failure(error) {
                RetryDecision::RetryAfter(delay) => delay,
                RetryDecision::GiveUp(error) => {
                    return self.failed(query_id, request, &error, &retry, started);
                }
            };

            if let Err(error) = retry.wait(delay, cancellation_token).await {
                return self.failed(query_id, request, &error, &retry, started);
            }
        }
    }

    fn failed(
        &self,
        query_id: Uuid,
        request: &SearchRequest,
        error: &RegistryError,
        retry: &RetryManager,
        started: Instant,
    ) -> SearchResult {
        warn!("❌ Search for {:?} failed: {}", request.term(), error);
        SearchResult::failure(
            query_id,
            Some(request.clone()),
            request.term(),
            error.to_string(),
            retry.attempts(),
            started.elapsed(),
        )
    }

    /// One full pagination pass from page 0.
    async fn attempt(
        &mut self,
        request: &SearchRequest,
        cancellation_token: &CancellationToken,
    ) -> Result<PaginationOutcome, RegistryError> {
        if cancellation_token.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }

        let mut token = self.session.ensure(&self.transport, cancellation_token).await?;
        if token.is_empty() {
            debug!("Proceeding without continuation; only the first page is reachable");
        }

        let page_size = self.registry.page_size;
        let max_pages = self.registry.max_pages;
        let mut outcome = PaginationOutcome::default();

        for page_index in 0..max_pages {
            if cancellation_token.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }

            let form = PageRequestForm::new(request, PageAction::for_page(page_index, page_size), &token);
            let response = self
                .transport
                .submit_partial(&self.registry.search_url, form.fields(), cancellation_token)
                .await
                .map_err(|failure| page_failure(failure, page_index))?;

            let context = PageContext::new(page_index).with_page_size(page_size);
            let parsed = self
                .parser
                .parse_with_context(&response.body, &context)
                .map_err(|e| RegistryError::unparsable(page_index, e.to_string()))?;

            self.session.refresh_from_response(&response.body);
            if let Some(renewed) = self.session.current() {
                token = renewed.clone();
            }

            let accepted_on_page = parsed.records.len();
            let accumulated = outcome.records.len() + accepted_on_page;
            if let Some(hint) = parsed.reported_total {
                outcome.reported_total = Some(hint.resolve(accepted_on_page));
            }

            let stop = stop_reason(
                page_index,
                accepted_on_page,
                accumulated,
                outcome.reported_total,
                &token,
                page_size,
                max_pages,
            );

            let page = ResultPage {
                page_index,
                records: parsed.records,
                raw_byte_length: parsed.raw_byte_length,
                is_last_page: stop.is_some(),
            };
            debug!(
                "📄 Page {}: {} records ({} bytes){}",
                page_index,
                accepted_on_page,
                page.raw_byte_length,
                if page.is_last_page { ", last page" } else { "" }
            );
            outcome.pages.push(page.summary());
            outcome.records.extend(page.records);

            if let Some(reason) = stop {
                if reason == StopReason::PageCeiling {
                    warn!("⚠️ Page ceiling of {} reached; result truncated", max_pages);
                    outcome.truncated = true;
                } else {
                    debug!("Pagination stopped: {:?}", reason);
                }
                break;
            }
        }

        Ok(outcome)
    }
}

fn page_failure(failure: TransportFailure, page_index: u32) -> RegistryError {
    match failure {
        TransportFailure::Cancelled => RegistryError::Cancelled,
        TransportFailure::Failed { kind, message } => RegistryError::transport(kind, page_index, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn token() -> ContinuationToken {
        ContinuationToken::new("-1:1")
    }

    #[rstest]
    #[case(1, 0, 15, None, Some(StopReason::EmptyPage))]
    #[case(0, 0, 0, None, Some(StopReason::ShortPage))]
    #[case(2, 9, 39, None, Some(StopReason::ShortPage))]
    #[case(0, 15, 15, Some(15), Some(StopReason::ReportedTotalReached))]
    #[case(1, 15, 30, Some(40), None)]
    #[case(19, 15, 300, None, Some(StopReason::PageCeiling))]
    fn termination_rules(
        #[case] page_index: u32,
        #[case] accepted: usize,
        #[case] accumulated: usize,
        #[case] reported: Option<usize>,
        #[case] expected: Option<StopReason>,
    ) {
        assert_eq!(
            stop_reason(page_index, accepted, accumulated, reported, &token(), 15, 20),
            expected
        );
    }

    #[test]
    fn empty_token_stops_after_full_first_page() {
        assert_eq!(
            stop_reason(0, 15, 15, None, &ContinuationToken::empty(), 15, 20),
            Some(StopReason::NoContinuation)
        );
    }

    #[test]
    fn short_page_wins_over_ceiling() {
        assert_eq!(
            stop_reason(19, 3, 288, None, &token(), 15, 20),
            Some(StopReason::ShortPage)
        );
    }
}
