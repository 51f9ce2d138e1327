//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the pipeline, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests with a bounded retry loop
//! - Fixed back-off on rate limiting

use crate::config::{FetchConfig, UserAgentConfig};
use crate::EtlError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// The server answered; on retry exhaustion this is the last answer received
    Response {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
        /// Number of requests it took
        attempts: u32,
    },

    /// Every attempt failed before a response was read
    Exhausted {
        /// Number of requests made
        attempts: u32,
        /// Description of the last transport failure
        last_error: String,
    },
}

impl FetchResult {
    /// Returns the HTTP status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response { status_code, .. } => Some(*status_code),
            Self::Exhausted { .. } => None,
        }
    }

    /// URL the response came from, after any redirects
    pub fn final_url(&self) -> Option<&str> {
        match self {
            Self::Response { final_url, .. } => Some(final_url.as_str()),
            Self::Exhausted { .. } => None,
        }
    }

    /// Returns the body only when the final status was 200
    pub fn ok_body(&self) -> Option<&str> {
        match self {
            Self::Response {
                status_code, body, ..
            } if *status_code == StatusCode::OK.as_u16() => Some(body.as_str()),
            _ => None,
        }
    }

    /// Number of requests spent on this fetch
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Response { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Retry policy for [`fetch_with_retry`]
///
/// All retry reasons draw from one budget: every request made counts as one attempt,
/// whatever its outcome. Each reason has its own pause before the next request.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Total number of requests allowed per URL
    pub max_attempts: u32,
    /// Pause after HTTP 429
    pub rate_limit_backoff: Duration,
    /// Pause after any other non-200 status
    pub status_retry_delay: Duration,
    /// Pause after a connection failure, timeout or body read failure
    pub network_retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_secs),
            status_retry_delay: Duration::from_millis(config.status_retry_delay_ms),
            network_retry_delay: Duration::from_millis(config.network_retry_delay_ms),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetch` - Timeout settings
///
/// # Example
///
/// ```no_run
/// use bookshelf_etl::config::{FetchConfig, UserAgentConfig};
/// use bookshelf_etl::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    // Format: Name/Version
    let user_agent = format!("{}/{}", user_agent.name, user_agent.version);

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying per `policy`
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Return immediately |
/// | HTTP 429 | Sleep `rate_limit_backoff`, retry |
/// | Other status | Sleep `status_retry_delay`, retry |
/// | Connect error / timeout / body read error | Sleep `network_retry_delay`, retry |
/// | Any other client error | Propagate |
///
/// When the budget runs out, the last response is returned if the last attempt got one,
/// otherwise [`FetchResult::Exhausted`]. No pause follows the final attempt.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    policy: &FetchPolicy,
) -> Result<FetchResult, EtlError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last: Option<FetchResult> = None;

    for attempt in 1..=max_attempts {
        let delay = match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                let final_url = response.url().to_string();

                match response.text().await {
                    Ok(body) => {
                        let result = FetchResult::Response {
                            final_url,
                            status_code: status.as_u16(),
                            body,
                            attempts: attempt,
                        };

                        if status == StatusCode::OK {
                            return Ok(result);
                        }
                        last = Some(result);

                        if status == StatusCode::TOO_MANY_REQUESTS {
                            tracing::warn!(
                                "Too many requests for {} on attempt {}/{}, backing off for {:?}",
                                url,
                                attempt,
                                max_attempts,
                                policy.rate_limit_backoff
                            );
                            policy.rate_limit_backoff
                        } else {
                            tracing::debug!(
                                "HTTP {} for {} on attempt {}/{}",
                                status.as_u16(),
                                url,
                                attempt,
                                max_attempts
                            );
                            policy.status_retry_delay
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to read body from {} on attempt {}/{}: {}",
                            url,
                            attempt,
                            max_attempts,
                            e
                        );
                        last = Some(FetchResult::Exhausted {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                        policy.network_retry_delay
                    }
                }
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                tracing::warn!(
                    "No response from {} on attempt {}/{}: {}",
                    url,
                    attempt,
                    max_attempts,
                    e
                );
                last = Some(FetchResult::Exhausted {
                    attempts: attempt,
                    last_error: e.to_string(),
                });
                policy.network_retry_delay
            }
            Err(e) => {
                return Err(EtlError::Http {
                    url: url.to_string(),
                    source: e,
                });
            }
        };

        if attempt < max_attempts && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(last.unwrap_or(FetchResult::Exhausted {
        attempts: max_attempts,
        last_error: "no attempts made".to_string(),
    }))
}
