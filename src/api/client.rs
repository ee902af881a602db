//
//  jamfpro
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Jamf Pro API Client
//!
//! [`JamfClient`] is the HTTP transport shared by every resource service.
//! It wraps a `reqwest::Client` with Jamf-specific behaviour: bearer token
//! authentication with automatic refresh, a sticky-session cookie store,
//! adaptive response-time throttling, an optional concurrency cap, and
//! structured logging via `tracing`.
//!
//! ## Creating a Client
//!
//! ```rust,no_run
//! use jamfpro::api::JamfClient;
//! use jamfpro::auth::AuthConfig;
//!
//! # fn example() -> Result<(), jamfpro::api::ApiError> {
//! let auth = AuthConfig::oauth2("https://example.jamfcloud.com", "id", "secret");
//!
//! // Defaults are fine for most use:
//! let client = JamfClient::new(auth.clone())?;
//!
//! // Or tune the transport:
//! let client = JamfClient::builder(auth)
//!     .timeout(std::time::Duration::from_secs(120))
//!     .max_concurrent_requests(4)
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry Policy
//!
//! The transport performs no automatic retries of transient failures.
//! Blind retries of non-idempotent operations can create duplicate
//! resources, so retrying is left to callers. The single exception is a
//! transparent re-authentication after a 401 response.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::error::ApiError;
use super::rsql::RsqlFilterBuilder;
use super::throttle::ResponseTimeTracker;
use super::{DEFAULT_TIMEOUT, USER_AGENT_BASE};
use crate::auth::{AuthConfig, TokenProvider};
use crate::VERSION;

/// The HTTP transport for the Jamf Pro API and Classic API.
///
/// One instance per Jamf Pro instance; cheap to share behind an
/// [`Arc`](std::sync::Arc). All operations are safe for concurrent use:
/// request state is call-local and the token cell is internally
/// synchronized.
#[derive(Debug)]
pub struct JamfClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) tokens: TokenProvider,
    pub(crate) global_headers: HashMap<String, String>,
    pub(crate) request_delay: Option<Duration>,
    pub(crate) limiter: Option<Semaphore>,
    pub(crate) tracker: ResponseTimeTracker,
}

impl JamfClient {
    /// Creates a client with default transport settings.
    ///
    /// Equivalent to `JamfClient::builder(auth).build()`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the auth configuration is
    /// incomplete or the HTTP client cannot be constructed. Credentials are
    /// not exchanged here; the first token is fetched lazily on the first
    /// request, where a bad secret surfaces as
    /// [`ApiError::AuthenticationFailed`].
    pub fn new(auth: AuthConfig) -> Result<Self, ApiError> {
        Self::builder(auth).build()
    }

    /// Returns a [`ClientBuilder`] for tuning the transport.
    pub fn builder(auth: AuthConfig) -> ClientBuilder {
        ClientBuilder {
            auth,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            global_headers: HashMap::new(),
            request_delay: None,
            max_concurrent_requests: None,
        }
    }

    /// Returns the instance base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying `reqwest::Client` for advanced use.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns a new RSQL filter expression builder. Pass the `build()`
    /// result to [`QueryParams::filter`](super::QueryParams::filter).
    pub fn rsql_builder(&self) -> RsqlFilterBuilder {
        RsqlFilterBuilder::new()
    }

    /// Revokes the current bearer token at the Jamf Pro API and clears the
    /// local cache. The next request triggers a full re-authentication.
    pub async fn invalidate_token(&self) -> Result<(), ApiError> {
        self.tokens.invalidate().await
    }

    /// Extends the current bearer token lifetime without re-authentication.
    /// Use before long-running operations to prevent mid-operation token
    /// expiry. Failure is logged, not propagated.
    pub async fn keep_alive_token(&self) {
        self.tokens.keep_alive().await
    }
}

/// Configures and constructs a [`JamfClient`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use jamfpro::api::JamfClient;
/// use jamfpro::auth::AuthConfig;
///
/// # fn example() -> Result<(), jamfpro::api::ApiError> {
/// let client = JamfClient::builder(AuthConfig::basic(
///     "https://example.jamfcloud.com",
///     "admin",
///     "hunter2",
/// ))
/// .timeout(Duration::from_secs(30))
/// .request_delay(Duration::from_millis(250))
/// .global_header("X-Request-Source", "inventory-sync")
/// .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    auth: AuthConfig,
    timeout: Duration,
    user_agent: Option<String>,
    global_headers: HashMap<String, String>,
    request_delay: Option<Duration>,
    max_concurrent_requests: Option<usize>,
}

impl ClientBuilder {
    /// Sets the default timeout for HTTP requests. Individual calls may
    /// override it via
    /// [`CallOptions::with_timeout`](super::CallOptions::with_timeout);
    /// uploads legitimately need longer timeouts than simple GETs.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a custom `User-Agent` string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a header included in every request.
    pub fn global_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_headers.insert(key.into(), value.into());
        self
    }

    /// Adds multiple headers included in every request.
    pub fn global_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.global_headers.extend(headers);
        self
    }

    /// Sets a mandatory fixed delay after every successful request.
    /// Useful for bulk operations against busy instances.
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    /// Caps the number of in-flight requests. Additional callers wait for
    /// a slot. Unset means unlimited.
    pub fn max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = Some(max);
        self
    }

    /// Validates the configuration and constructs the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] for incomplete auth settings or
    /// an unbuildable HTTP client.
    pub fn build(self) -> Result<JamfClient, ApiError> {
        self.auth.validate()?;

        let base_url = self.auth.instance_domain.trim_end_matches('/').to_string();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("{USER_AGENT_BASE}/{VERSION}"));

        // Cookie store enables sticky sessions automatically. Jamf Cloud
        // sets jpro-ingress / APBALANCEID / JSESSIONID in Set-Cookie
        // headers; reqwest resends them on subsequent requests.
        let http = reqwest::Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to create HTTP client: {e}")))?;

        let tokens = TokenProvider::new(http.clone(), base_url.clone(), self.auth.clone());

        tracing::info!(
            base_url = %base_url,
            auth_method = self.auth.credential.method_name(),
            "Jamf Pro API client created"
        );

        Ok(JamfClient {
            http,
            base_url,
            tokens,
            global_headers: self.global_headers,
            request_delay: self.request_delay,
            limiter: self.max_concurrent_requests.map(Semaphore::new),
            tracker: ResponseTimeTracker::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_trims_trailing_slash() {
        let client =
            JamfClient::new(AuthConfig::basic("https://x.jamfcloud.com/", "u", "p")).unwrap();
        assert_eq!(client.base_url(), "https://x.jamfcloud.com");
    }

    #[test]
    fn test_build_rejects_invalid_auth() {
        let err = JamfClient::new(AuthConfig::basic("", "u", "p")).unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn test_builder_options() {
        let client = JamfClient::builder(AuthConfig::oauth2("https://x.jamfcloud.com", "i", "s"))
            .timeout(Duration::from_secs(5))
            .request_delay(Duration::from_millis(10))
            .max_concurrent_requests(2)
            .global_header("X-Test", "1")
            .build()
            .unwrap();

        assert_eq!(client.request_delay, Some(Duration::from_millis(10)));
        assert!(client.limiter.is_some());
        assert_eq!(client.global_headers.get("X-Test").map(String::as_str), Some("1"));
    }
}
