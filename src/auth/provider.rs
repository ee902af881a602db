//
//  jamfpro
//  auth/provider.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! Bearer Token Lifecycle
//!
//! [`TokenProvider`] owns the one piece of shared mutable state in the
//! client: the current bearer token. The token cell is guarded by an async
//! mutex that is held across the refresh call, so concurrent requests that
//! find the token expired coalesce onto a single in-flight refresh rather
//! than each re-authenticating (single-flight). Callers that arrive while a
//! refresh is running simply wait for it and reuse its result.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{
    AuthConfig, Credential, BEARER_TOKEN_ENDPOINT, INVALIDATE_TOKEN_ENDPOINT, KEEP_ALIVE_ENDPOINT,
    OAUTH_TOKEN_ENDPOINT,
};
use crate::api::error::ApiError;

/// A bearer token and its expiry.
///
/// Replaced wholesale on refresh, never partially updated.
#[derive(Debug, Clone)]
pub struct Token {
    /// The opaque bearer token value.
    pub value: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Reports whether the token is still usable, given the proactive
    /// refresh buffer: a token within `buffer` of expiry is treated as
    /// expired so no request is ever sent with a token that lapses
    /// mid-flight.
    pub fn is_valid(&self, buffer: std::time::Duration) -> bool {
        let buffer = chrono::Duration::from_std(buffer).unwrap_or_else(|_| chrono::Duration::zero());
        Utc::now() + buffer < self.expires_at
    }
}

/// Response shape of `POST /api/v1/auth/token`.
#[derive(Deserialize)]
struct BearerTokenResponse {
    token: String,
    expires: DateTime<Utc>,
}

/// Response shape of `POST /api/oauth/token`.
#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Response shape of `POST /api/v1/auth/keep-alive`.
#[derive(Deserialize)]
struct KeepAliveResponse {
    token: String,
    expires: DateTime<Utc>,
}

/// Resolves and refreshes the client's bearer token.
///
/// All methods are safe for concurrent use. The provider performs at most
/// one refresh at a time; a refresh failure surfaces as
/// [`ApiError::AuthenticationFailed`] and is not retried, to avoid
/// credential-lockout amplification.
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    base_url: String,
    config: AuthConfig,
    state: Mutex<Option<Token>>,
}

impl TokenProvider {
    /// Creates a provider sharing the client's HTTP connection pool.
    /// The first token is fetched lazily, on the first request.
    pub(crate) fn new(http: reqwest::Client, base_url: String, config: AuthConfig) -> Self {
        Self {
            http,
            base_url,
            config,
            state: Mutex::new(None),
        }
    }

    /// Returns the token value for logging, redacted when the
    /// configuration asks for it.
    fn log_token<'a>(&self, token: &'a str) -> &'a str {
        if self.config.hide_sensitive_data {
            "[REDACTED]"
        } else {
            token
        }
    }

    /// Returns a valid bearer token, transparently refreshing it when
    /// absent, expired, or within the refresh buffer of expiry.
    ///
    /// The token cell's lock is held across the refresh, which is what
    /// makes concurrent callers coalesce onto one refresh: the first
    /// caller fetches, the rest wait on the lock and then find a fresh
    /// token already in place.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthenticationFailed`] when the credential
    /// exchange is rejected or the token response cannot be decoded.
    pub async fn current_token(&self) -> Result<Token, ApiError> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.as_ref() {
            if token.is_valid(self.config.token_refresh_buffer) {
                return Ok(token.clone());
            }
        }

        let token = self.fetch().await?;
        *state = Some(token.clone());
        Ok(token)
    }

    /// Drops the cached token without contacting the server. The next
    /// [`current_token`](Self::current_token) performs a full refresh.
    /// Used by the transport after an authentication-rejected response.
    pub(crate) async fn clear(&self) {
        *self.state.lock().await = None;
    }

    /// Revokes the current bearer token at the Jamf Pro API and clears the
    /// local cache, forcing the next request to re-authenticate. Use before
    /// shutdown or credential rotation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthenticationFailed`] when the revocation call
    /// is rejected. A missing cached token is not an error.
    pub async fn invalidate(&self) -> Result<(), ApiError> {
        let current = {
            let state = self.state.lock().await;
            state.as_ref().map(|t| t.value.clone())
        };
        let Some(current) = current else {
            return Ok(());
        };

        let url = format!("{}{}", self.base_url, INVALIDATE_TOKEN_ENDPOINT);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&current)
            .send()
            .await
            .map_err(|e| ApiError::AuthenticationFailed {
                message: format!("invalidate token: request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::AuthenticationFailed {
                message: format!("invalidate token: unexpected status {status}: {body}"),
            });
        }

        self.clear().await;
        tracing::info!("Bearer token invalidated");
        Ok(())
    }

    /// Extends the current token's lifetime without a full
    /// re-authentication. Use before long-running operations to prevent
    /// mid-operation token expiry.
    ///
    /// Failure is non-fatal: it is logged at warn level and the cached
    /// token is left untouched, so the next request falls back to a
    /// normal refresh.
    pub async fn keep_alive(&self) {
        let current = {
            let state = self.state.lock().await;
            state.as_ref().map(|t| t.value.clone())
        };
        let Some(current) = current else {
            tracing::warn!("keep-alive skipped: no active token");
            return;
        };

        let url = format!("{}{}", self.base_url, KEEP_ALIVE_ENDPOINT);
        let outcome: Result<KeepAliveResponse, String> = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&current)
                .send()
                .await
                .map_err(|e| format!("request failed: {e}"))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| format!("read response: {e}"))?;
            if !status.is_success() {
                return Err(format!("unexpected status {status}: {body}"));
            }
            serde_json::from_str(&body).map_err(|e| format!("decode response: {e}"))
        }
        .await;

        match outcome {
            Ok(renewed) => {
                let mut state = self.state.lock().await;
                *state = Some(Token {
                    value: renewed.token,
                    expires_at: renewed.expires,
                });
                tracing::info!(new_expiry = %renewed.expires, "Bearer token keep-alive successful");
            }
            Err(reason) => {
                tracing::warn!(%reason, "Bearer token keep-alive failed");
            }
        }
    }

    /// Fetches a fresh token using the configured flow.
    async fn fetch(&self) -> Result<Token, ApiError> {
        match &self.config.credential {
            Credential::Basic { username, password } => {
                self.fetch_basic(username, password).await
            }
            Credential::OAuth2 {
                client_id,
                client_secret,
            } => self.fetch_oauth2(client_id, client_secret).await,
        }
    }

    /// Basic auth to bearer token exchange: `POST /api/v1/auth/token`.
    async fn fetch_basic(&self, username: &str, password: &str) -> Result<Token, ApiError> {
        let url = format!("{}{}", self.base_url, BEARER_TOKEN_ENDPOINT);
        let response = self
            .http
            .post(&url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| ApiError::AuthenticationFailed {
                message: format!("basic auth token request failed: {e}"),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::AuthenticationFailed {
                message: format!("basic auth token request failed: read response: {e}"),
            })?;

        if status != reqwest::StatusCode::OK {
            return Err(ApiError::AuthenticationFailed {
                message: format!("basic auth token request failed: {status} {body}"),
            });
        }

        let parsed: BearerTokenResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::AuthenticationFailed {
                message: format!("decode basic auth response: {e}"),
            })?;
        if parsed.token.is_empty() {
            return Err(ApiError::AuthenticationFailed {
                message: "empty token in basic auth response".to_string(),
            });
        }

        tracing::info!(
            expiry = %parsed.expires,
            token = self.log_token(&parsed.token),
            "Basic auth bearer token obtained"
        );
        Ok(Token {
            value: parsed.token,
            expires_at: parsed.expires,
        })
    }

    /// OAuth2 client-credentials grant: `POST /api/oauth/token`.
    async fn fetch_oauth2(&self, client_id: &str, client_secret: &str) -> Result<Token, ApiError> {
        let url = format!("{}{}", self.base_url, OAUTH_TOKEN_ENDPOINT);
        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::AuthenticationFailed {
                message: format!("oauth2 token request failed: {e}"),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::AuthenticationFailed {
                message: format!("oauth2 token request failed: read response: {e}"),
            })?;

        if !status.is_success() {
            return Err(ApiError::AuthenticationFailed {
                message: format!("oauth2 token request failed: {status} {body}"),
            });
        }

        let parsed: OAuthTokenResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::AuthenticationFailed {
                message: format!("decode oauth2 response: {e}"),
            })?;
        if parsed.access_token.is_empty() {
            return Err(ApiError::AuthenticationFailed {
                message: "empty access_token in oauth2 response".to_string(),
            });
        }

        let expires_at = Utc::now() + chrono::Duration::seconds(parsed.expires_in);
        tracing::info!(
            expiry = %expires_at,
            token = self.log_token(&parsed.access_token),
            "OAuth2 bearer token obtained"
        );
        Ok(Token {
            value: parsed.access_token,
            expires_at,
        })
    }
}
