//! HTTP transport for the registry with rate limiting and cancellation
//!
//! The registry ties its continuation token to the cookie session of the
//! client that fetched it, so every `RegistryHttpClient` owns its own cookie
//! store and must not be shared between concurrent queries.

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT},
};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::{RegistryConfig, defaults};
use super::registry_error::TransportFailureKind;

/// Raw response handed to the parsing layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn byte_length(&self) -> usize {
        self.body.len()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("{kind}: {message}")]
    Failed {
        kind: TransportFailureKind,
        message: String,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl TransportFailure {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: TransportFailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: TransportFailureKind::Connection,
            message: message.into(),
        }
    }

    fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportFailureKind::Timeout
        } else if let Some(status) = error.status() {
            TransportFailureKind::HttpStatus(status.as_u16())
        } else {
            TransportFailureKind::Connection
        };
        Self::Failed {
            kind,
            message: error.to_string(),
        }
    }
}

/// The two calls the search flow makes against the registry.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Plain GET of a landing page that embeds the continuation token.
    async fn bootstrap(
        &self,
        url: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure>;

    /// Form-encoded JSF partial-update POST.
    async fn submit_partial(
        &self,
        url: &str,
        form: &[(String, String)],
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure>;
}

/// `Origin` and `Referer` values for partial requests, taken from the landing page URL.
fn page_headers(landing_url: &str) -> anyhow::Result<(HeaderValue, HeaderValue)> {
    use anyhow::Context;

    let parsed = url::Url::parse(landing_url)
        .with_context(|| format!("Invalid landing URL: {landing_url}"))?;
    let origin = HeaderValue::from_str(&parsed.origin().ascii_serialization())
        .context("Invalid origin header")?;
    let referer = HeaderValue::from_str(parsed.as_str()).context("Invalid referer header")?;
    Ok((origin, referer))
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// reqwest-backed transport with a private cookie session
pub struct RegistryHttpClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    bootstrap_timeout: Duration,
    page_timeout: Duration,
    origin: HeaderValue,
    referer: HeaderValue,
}

impl RegistryHttpClient {
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(defaults::ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(config.bootstrap_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        let per_second = NonZeroU32::new(config.requests_per_second)
            .context("Rate limit must be greater than 0")?;
        let burst = NonZeroU32::new(config.burst_size.max(1)).unwrap_or(per_second);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst));

        let (origin, referer) = page_headers(&config.landing_url)?;

        Ok(Self {
            client,
            rate_limiter,
            bootstrap_timeout: config.bootstrap_timeout(),
            page_timeout: config.page_timeout(),
            origin,
            referer,
        })
    }

    async fn wait_for_slot(&self, cancellation_token: &CancellationToken) -> Result<(), TransportFailure> {
        tokio::select! {
            () = self.rate_limiter.until_ready() => Ok(()),
            () = cancellation_token.cancelled() => Err(TransportFailure::Cancelled),
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure> {
        if cancellation_token.is_cancelled() {
            return Err(TransportFailure::Cancelled);
        }
        self.wait_for_slot(cancellation_token).await?;

        let response = tokio::select! {
            result = request.send() => result.map_err(|e| TransportFailure::from_reqwest(&e))?,
            () = cancellation_token.cancelled() => {
                warn!("🛑 HTTP request cancelled for URL: {}", url);
                return Err(TransportFailure::Cancelled);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Failed {
                kind: TransportFailureKind::HttpStatus(status.as_u16()),
                message: format!("HTTP request failed with status {status}: {url}"),
            });
        }

        let body = tokio::select! {
            result = response.text() => result.map_err(|e| TransportFailure::from_reqwest(&e))?,
            () = cancellation_token.cancelled() => {
                warn!("🛑 Response reading cancelled for URL: {}", url);
                return Err(TransportFailure::Cancelled);
            }
        };

        debug!("Fetched {} ({} bytes, {})", url, body.len(), status);
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RegistryTransport for RegistryHttpClient {
    async fn bootstrap(
        &self,
        url: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure> {
        debug!("GET {}", url);
        let request = self.client.get(url).timeout(self.bootstrap_timeout);
        self.send(request, url, cancellation_token).await
    }

    async fn submit_partial(
        &self,
        url: &str,
        form: &[(String, String)],
        cancellation_token: &CancellationToken,
    ) -> Result<TransportResponse, TransportFailure> {
        debug!("POST {} ({} fields)", url, form.len());
        let request = self
            .client
            .post(url)
            .timeout(self.page_timeout)
            .header("Faces-Request", "partial/ajax")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ORIGIN, self.origin.clone())
            .header(REFERER, self.referer.clone())
            .form(form);
        self.send(request, url, cancellation_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_builds_from_default_config() {
        let client = RegistryHttpClient::new(&RegistryConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn page_headers_follow_configured_landing_url() {
        let (origin, referer) = page_headers("http://registry.test:8080/marcanet/").unwrap();
        assert_eq!(origin, "http://registry.test:8080");
        assert_eq!(referer, "http://registry.test:8080/marcanet/");

        let (origin, _) = page_headers(&RegistryConfig::default().landing_url).unwrap();
        assert_eq!(origin, "https://acervomarcas.impi.gob.mx:8181");

        assert!(page_headers("not a url").is_err());
    }

    #[tokio::test]
    async fn zero_rate_is_rejected() {
        let config = RegistryConfig {
            requests_per_second: 0,
            ..RegistryConfig::default()
        };
        assert!(RegistryHttpClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_before_network() {
        let client = RegistryHttpClient::new(&RegistryConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        // Unroutable address; never reached because of the cancellation
        let result = client.bootstrap("http://127.0.0.1:9/", &token).await;
        assert_eq!(result.unwrap_err(), TransportFailure::Cancelled);
    }
}
