//
//  jamfpro
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Jamf Pro accepts two authentication flows, both of which ultimately
//! yield a short-lived bearer token:
//!
//! - **OAuth2 client credentials** (recommended): `POST /api/oauth/token`
//! - **Basic auth to bearer token exchange**: `POST /api/v1/auth/token`
//!
//! The flow is a configuration-time decision. [`Credential`] captures the
//! choice as a closed enum, [`AuthConfig`] bundles it with the instance
//! domain and refresh tuning, and [`TokenProvider`] owns the token
//! lifecycle: lazy fetch, expiry-buffered refresh with single-flight
//! coalescing, invalidation, and keep-alive.
//!
//! ## Example
//!
//! ```rust
//! use jamfpro::auth::AuthConfig;
//!
//! let auth = AuthConfig::basic("https://example.jamfcloud.com", "admin", "hunter2");
//! assert!(auth.validate().is_ok());
//! ```

mod provider;

pub use provider::{Token, TokenProvider};

use std::time::Duration;

use crate::api::error::ApiError;

/// Token exchange endpoint for the basic auth flow.
pub(crate) const BEARER_TOKEN_ENDPOINT: &str = "/api/v1/auth/token";

/// Token endpoint for the OAuth2 client-credentials flow.
pub(crate) const OAUTH_TOKEN_ENDPOINT: &str = "/api/oauth/token";

/// Endpoint that revokes the current bearer token.
pub(crate) const INVALIDATE_TOKEN_ENDPOINT: &str = "/api/v1/auth/invalidate-token";

/// Endpoint that extends the current bearer token's lifetime.
pub(crate) const KEEP_ALIVE_ENDPOINT: &str = "/api/v1/auth/keep-alive";

/// How far before expiry the provider proactively refreshes the token,
/// unless overridden via [`AuthConfig::with_token_refresh_buffer`].
pub const DEFAULT_TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// The caller's identity, fixed at client construction.
///
/// # Variants
///
/// - `Basic`: username and password, exchanged for a bearer token.
/// - `OAuth2`: an API client's ID and secret, exchanged via the
///   client-credentials grant. Recommended for automation.
///
/// # Notes
///
/// - The credential itself is immutable once configured; only the derived
///   bearer token is refreshed over the client's lifetime.
/// - Secrets are not logged. Token values appearing in logs are redacted
///   when [`AuthConfig::hide_sensitive_data`] is set.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Username/password pair for the basic auth token exchange.
    Basic {
        /// The Jamf Pro username.
        username: String,
        /// The account password.
        password: String,
    },
    /// OAuth2 client-credentials pair for an API client.
    OAuth2 {
        /// The API client ID.
        client_id: String,
        /// The API client secret.
        client_secret: String,
    },
}

impl Credential {
    /// Returns the configuration-file name of this flow
    /// (`"basic"` or `"oauth2"`).
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::OAuth2 { .. } => "oauth2",
        }
    }
}

/// Authentication configuration for a [`JamfClient`](crate::api::JamfClient).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use jamfpro::auth::AuthConfig;
///
/// let auth = AuthConfig::oauth2("https://example.jamfcloud.com", "id", "secret")
///     .with_token_refresh_buffer(Duration::from_secs(60))
///     .with_hidden_sensitive_data(true);
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The Jamf Pro instance base URL
    /// (e.g. `https://example.jamfcloud.com`).
    pub instance_domain: String,

    /// The credential used to obtain bearer tokens.
    pub credential: Credential,

    /// How far before expiry to proactively refresh the token.
    pub token_refresh_buffer: Duration,

    /// Suppresses bearer token values in log output. Enable in production
    /// to keep tokens out of log files.
    pub hide_sensitive_data: bool,
}

impl AuthConfig {
    /// Creates a configuration using the basic auth flow.
    pub fn basic(
        instance_domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            instance_domain: instance_domain.into(),
            credential: Credential::Basic {
                username: username.into(),
                password: password.into(),
            },
            token_refresh_buffer: DEFAULT_TOKEN_REFRESH_BUFFER,
            hide_sensitive_data: false,
        }
    }

    /// Creates a configuration using the OAuth2 client-credentials flow.
    pub fn oauth2(
        instance_domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            instance_domain: instance_domain.into(),
            credential: Credential::OAuth2 {
                client_id: client_id.into(),
                client_secret: client_secret.into(),
            },
            token_refresh_buffer: DEFAULT_TOKEN_REFRESH_BUFFER,
            hide_sensitive_data: false,
        }
    }

    /// Overrides how far before expiry the token is proactively refreshed.
    pub fn with_token_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.token_refresh_buffer = buffer;
        self
    }

    /// Controls redaction of token values in log output.
    pub fn with_hidden_sensitive_data(mut self, hide: bool) -> Self {
        self.hide_sensitive_data = hide;
        self
    }

    /// Checks the configuration for required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the instance domain or any
    /// credential field is empty.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.instance_domain.trim().is_empty() {
            return Err(ApiError::Configuration(
                "instance domain is required".to_string(),
            ));
        }
        match &self.credential {
            Credential::Basic { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Err(ApiError::Configuration(
                        "username and password are required for basic auth".to_string(),
                    ));
                }
            }
            Credential::OAuth2 {
                client_id,
                client_secret,
            } => {
                if client_id.is_empty() || client_secret.is_empty() {
                    return Err(ApiError::Configuration(
                        "client_id and client_secret are required for oauth2".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
