//! Retry manager for registry queries
//!
//! The registry ties pagination state to the continuation token, so a failed
//! page is never retried in isolation: the whole query restarts from page 0
//! with a fresh token after a fixed delay. This module decides whether that
//! restart happens and keeps the per-query attempt history.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::RetrySettings;
use super::registry_error::{RegistryError, TransportFailureKind};

/// Retry policy: capped attempts with a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub const fn from_settings(settings: &RetrySettings) -> Self {
        Self::fixed(settings.max_attempts, settings.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

/// Error classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClassification {
    Retryable {
        retry_after: Duration,
        category: RetryableCategory,
    },
    NonRetryable {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableCategory {
    SessionBootstrap,
    Network(TransportFailureKind),
    UnparsableResponse,
}

/// Failure classifier trait
pub trait FailureClassifier: Send + Sync {
    fn classify_error(&self, error: &RegistryError) -> ErrorClassification;
}

/// Maps the registry error taxonomy onto retry decisions
#[derive(Debug, Clone)]
pub struct StandardFailureClassifier {
    delay: Duration,
}

impl StandardFailureClassifier {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl FailureClassifier for StandardFailureClassifier {
    fn classify_error(&self, error: &RegistryError) -> ErrorClassification {
        let category = match error {
            RegistryError::UpstreamUnavailable { .. } => RetryableCategory::SessionBootstrap,
            RegistryError::TransportError { kind, .. } => RetryableCategory::Network(*kind),
            RegistryError::UnparsableResponse { .. } => RetryableCategory::UnparsableResponse,
            RegistryError::InvalidInput(_)
            | RegistryError::Exhausted { .. }
            | RegistryError::Cancelled => {
                return ErrorClassification::NonRetryable {
                    reason: error.to_string(),
                };
            }
        };

        ErrorClassification::Retryable {
            retry_after: self.delay,
            category,
        }
    }
}

/// Retry attempt record
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    pub attempt_number: u32,
    pub attempted_at: DateTime<Utc>,
    pub classification: Option<ErrorClassification>,
    pub error: Option<String>,
    pub success: bool,
}

/// What the query loop should do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp(RegistryError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub attempts: u32,
    pub failures: u32,
    pub succeeded: bool,
    pub last_error: Option<String>,
}

/// Per-query retry bookkeeping
#[derive(Clone)]
pub struct RetryManager {
    policy: RetryPolicy,
    failure_classifier: Arc<dyn FailureClassifier>,
    history: Vec<RetryAttempt>,
}

impl RetryManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_classifier(policy, Arc::new(StandardFailureClassifier::new(policy.delay)))
    }

    pub fn with_classifier(policy: RetryPolicy, failure_classifier: Arc<dyn FailureClassifier>) -> Self {
        Self {
            policy,
            failure_classifier,
            history: Vec::new(),
        }
    }

    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Attempts made so far, failed or not
    pub fn attempts(&self) -> u32 {
        u32::try_from(self.history.len()).unwrap_or(u32::MAX)
    }

    pub fn record_success(&mut self) {
        let attempt_number = self.attempts() + 1;
        debug!("✅ Attempt {} succeeded", attempt_number);
        self.history.push(RetryAttempt {
            attempt_number,
            attempted_at: Utc::now(),
            classification: None,
            error: None,
            success: true,
        });
    }

    /// Records a failed attempt and decides whether another one follows.
    pub fn record_failure(&mut self, error: RegistryError) -> RetryDecision {
        let classification = self.failure_classifier.classify_error(&error);
        let attempt_number = self.attempts() + 1;
        self.history.push(RetryAttempt {
            attempt_number,
            attempted_at: Utc::now(),
            classification: Some(classification.clone()),
            error: Some(error.to_string()),
            success: false,
        });

        match classification {
            ErrorClassification::NonRetryable { reason } => {
                debug!("Attempt {} failed permanently: {}", attempt_number, reason);
                RetryDecision::GiveUp(error)
            }
            ErrorClassification::Retryable { .. } if attempt_number >= self.policy.max_attempts => {
                warn!(
                    "❌ Attempt {}/{} failed, retries exhausted: {}",
                    attempt_number, self.policy.max_attempts, error
                );
                RetryDecision::GiveUp(RegistryError::Exhausted {
                    attempts: attempt_number,
                    last_error: error.to_string(),
                })
            }
            ErrorClassification::Retryable {
                retry_after,
                category,
            } => {
                info!(
                    "🔄 Attempt {}/{} failed ({:?}), retrying in {:?}: {}",
                    attempt_number, self.policy.max_attempts, category, retry_after, error
                );
                RetryDecision::RetryAfter(retry_after)
            }
        }
    }

    /// Sleeps for `delay` unless the caller cancels first.
    pub async fn wait(
        &self,
        delay: Duration,
        cancellation_token: &CancellationToken,
    ) -> Result<(), RegistryError> {
        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(()),
            () = cancellation_token.cancelled() => Err(RegistryError::Cancelled),
        }
    }

    pub fn stats(&self) -> RetryStats {
        RetryStats {
            attempts: self.attempts(),
            failures: u32::try_from(self.history.iter().filter(|a| !a.success).count())
                .unwrap_or(u32::MAX),
            succeeded: self.history.last().is_some_and(|a| a.success),
            last_error: self.history.iter().rev().find_map(|a| a.error.clone()),
        }
    }

    pub fn history(&self) -> &[RetryAttempt] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InvalidSearchInput;

    fn manager(max_attempts: u32) -> RetryManager {
        RetryManager::new(RetryPolicy::fixed(max_attempts, Duration::from_millis(10)))
    }

    fn timeout() -> RegistryError {
        RegistryError::transport(TransportFailureKind::Timeout, 1, "timed out")
    }

    #[test]
    fn retries_until_budget_is_spent() {
        let mut retry = manager(3);
        assert_eq!(
            retry.record_failure(timeout()),
            RetryDecision::RetryAfter(Duration::from_millis(10))
        );
        assert_eq!(
            retry.record_failure(RegistryError::unparsable(0, "no fragments")),
            RetryDecision::RetryAfter(Duration::from_millis(10))
        );
        match retry.record_failure(timeout()) {
            RetryDecision::GiveUp(RegistryError::Exhausted { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("unexpected decision: {other:?}"),
        }
        let stats = retry.stats();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.failures, 3);
        assert!(!stats.succeeded);
    }

    #[test]
    fn non_retryable_errors_give_up_immediately() {
        let mut retry = manager(3);
        let invalid = RegistryError::InvalidInput(InvalidSearchInput::EmptyTerm);
        assert_eq!(retry.record_failure(invalid.clone()), RetryDecision::GiveUp(invalid));
        assert_eq!(
            retry.record_failure(RegistryError::Cancelled),
            RetryDecision::GiveUp(RegistryError::Cancelled)
        );
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let mut retry = manager(1);
        assert!(matches!(
            retry.record_failure(timeout()),
            RetryDecision::GiveUp(RegistryError::Exhausted { attempts: 1, .. })
        ));
    }

    #[test]
    fn success_after_failure_is_tracked() {
        let mut retry = manager(3);
        retry.record_failure(timeout());
        retry.record_success();
        let stats = retry.stats();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.failures, 1);
        assert!(stats.succeeded);
        assert_eq!(retry.history()[1].attempt_number, 2);
    }

    #[test]
    fn classifier_maps_categories() {
        let classifier = StandardFailureClassifier::new(Duration::from_secs(2));
        assert_eq!(
            classifier.classify_error(&RegistryError::upstream_unavailable("dns")),
            ErrorClassification::Retryable {
                retry_after: Duration::from_secs(2),
                category: RetryableCategory::SessionBootstrap,
            }
        );
        assert!(matches!(
            classifier.classify_error(&RegistryError::Cancelled),
            ErrorClassification::NonRetryable { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_cancellable() {
        let retry = manager(3);
        let token = CancellationToken::new();
        assert!(retry.wait(Duration::from_secs(2), &token).await.is_ok());

        token.cancel();
        assert_eq!(
            retry.wait(Duration::from_secs(60), &token).await,
            Err(RegistryError::Cancelled)
        );
    }
}
