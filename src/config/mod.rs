//
//  jamfpro
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Configuration Loading
//!
//! Builds an [`AuthConfig`] from the two places automation keeps
//! credentials: a JSON file or environment variables.
//!
//! ## File format
//!
//! ```json
//! {
//!   "instance_domain": "https://example.jamfcloud.com",
//!   "auth_method": "oauth2",
//!   "client_id": "...",
//!   "client_secret": "...",
//!   "token_refresh_buffer_period_seconds": 300,
//!   "hide_sensitive_data": true
//! }
//! ```
//!
//! For `"auth_method": "basic"`, supply `basic_auth_username` and
//! `basic_auth_password` instead of the client pair.
//!
//! ## Environment variables
//!
//! `INSTANCE_DOMAIN`, `AUTH_METHOD`, `CLIENT_ID`, `CLIENT_SECRET`,
//! `BASIC_AUTH_USERNAME`, `BASIC_AUTH_PASSWORD`,
//! `TOKEN_REFRESH_BUFFER_SECONDS`, `HIDE_SENSITIVE_DATA`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::api::error::ApiError;
use crate::auth::{AuthConfig, Credential, DEFAULT_TOKEN_REFRESH_BUFFER};

/// JSON shape of the auth configuration file.
#[derive(Debug, Default, Deserialize)]
struct AuthConfigFile {
    #[serde(default)]
    instance_domain: String,
    #[serde(default)]
    auth_method: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    basic_auth_username: String,
    #[serde(default)]
    basic_auth_password: String,
    #[serde(default)]
    token_refresh_buffer_period_seconds: Option<u64>,
    #[serde(default)]
    hide_sensitive_data: bool,
}

fn build(
    instance_domain: String,
    auth_method: &str,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    buffer_seconds: Option<u64>,
    hide_sensitive_data: bool,
) -> Result<AuthConfig, ApiError> {
    let credential = match auth_method {
        "oauth2" => Credential::OAuth2 {
            client_id,
            client_secret,
        },
        "basic" => Credential::Basic { username, password },
        other => {
            return Err(ApiError::Configuration(format!(
                "auth method must be \"oauth2\" or \"basic\", got {other:?}"
            )))
        }
    };

    let token_refresh_buffer = match buffer_seconds {
        Some(0) | None => DEFAULT_TOKEN_REFRESH_BUFFER,
        Some(seconds) => Duration::from_secs(seconds),
    };

    let config = AuthConfig {
        instance_domain,
        credential,
        token_refresh_buffer,
        hide_sensitive_data,
    };
    config.validate()?;
    Ok(config)
}

/// Loads an [`AuthConfig`] from a JSON file.
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] when the file cannot be read or
/// parsed, or when required fields for the selected auth method are
/// missing.
///
/// # Example
///
/// ```rust,no_run
/// use jamfpro::config::load_auth_config_from_file;
///
/// let auth = load_auth_config_from_file("/etc/jamfpro/client.json")?;
/// # Ok::<(), jamfpro::api::ApiError>(())
/// ```
pub fn load_auth_config_from_file(path: impl AsRef<Path>) -> Result<AuthConfig, ApiError> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .map_err(|e| ApiError::Configuration(format!("open config file {}: {e}", path.display())))?;
    let parsed: AuthConfigFile = serde_json::from_str(&data)
        .map_err(|e| ApiError::Configuration(format!("parse config file {}: {e}", path.display())))?;

    build(
        parsed.instance_domain,
        &parsed.auth_method,
        parsed.client_id,
        parsed.client_secret,
        parsed.basic_auth_username,
        parsed.basic_auth_password,
        parsed.token_refresh_buffer_period_seconds,
        parsed.hide_sensitive_data,
    )
}

/// Builds an [`AuthConfig`] from environment variables.
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] when `INSTANCE_DOMAIN` or
/// `AUTH_METHOD` is unset, or when the selected method's credential
/// variables are missing.
pub fn auth_config_from_env() -> Result<AuthConfig, ApiError> {
    let var = |name: &str| std::env::var(name).unwrap_or_default();

    let buffer_seconds = std::env::var("TOKEN_REFRESH_BUFFER_SECONDS")
        .ok()
        .and_then(|raw| raw.parse().ok());
    let hide_sensitive_data = matches!(
        var("HIDE_SENSITIVE_DATA").to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    );

    build(
        var("INSTANCE_DOMAIN"),
        &var("AUTH_METHOD"),
        var("CLIENT_ID"),
        var("CLIENT_SECRET"),
        var("BASIC_AUTH_USERNAME"),
        var("BASIC_AUTH_PASSWORD"),
        buffer_seconds,
        hide_sensitive_data,
    )
}
