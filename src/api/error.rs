//
//  jamfpro
//  api/error.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Error Taxonomy and Error-Response Classification
//!
//! This module defines [`ApiError`], the single error type surfaced by every
//! transport operation, and the classifier that normalizes non-2xx payloads
//! from both API generations into a [`VendorError`].
//!
//! ## Overview
//!
//! The two generations fail differently on the wire:
//!
//! - The Jamf Pro API returns structured JSON: `{"code": "...", "message": "..."}`
//! - The Classic API returns an HTML fragment of `<br>`-delimited text
//!   containing the phrase "An error has occurred." followed by the actual
//!   message. It is not well-formed XML, so it is parsed by splitting.
//!
//! The `<br>` splitting is inherently fragile and is deliberately isolated
//! here: if Jamf ever returns structured Classic error payloads, only this
//! module changes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jamfpro::api::ApiError;
//!
//! fn report(err: &ApiError) {
//!     if err.is_not_found() {
//!         eprintln!("no such resource");
//!     } else if let Some(envelope) = err.envelope() {
//!         eprintln!("API failure, status {}", envelope.status);
//!     } else {
//!         eprintln!("network failure: {err}");
//!     }
//! }
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::response::ResponseEnvelope;
use super::WireFormat;

/// A classified non-2xx response from either API generation.
///
/// Carries the HTTP status, the vendor error code when one was present in
/// the payload, the extracted human-readable message, the request that
/// failed, and the full [`ResponseEnvelope`] for logging.
#[derive(Debug, Clone)]
pub struct VendorError {
    /// HTTP status code of the failed response.
    pub status: u16,
    /// Canonical reason phrase for the status code.
    pub status_text: String,
    /// Vendor error code (e.g. `"NOT-FOUND"`), when the payload carried one.
    pub code: Option<String>,
    /// Human-readable message extracted from the payload.
    pub message: String,
    /// HTTP method of the failed request.
    pub method: String,
    /// API path of the failed request.
    pub path: String,
    /// Full response metadata, including the raw body.
    pub envelope: ResponseEnvelope,
}

impl fmt::Display for VendorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(
                f,
                "Jamf Pro API error ({} {}) [{}] at {} {}: {}",
                self.status, self.status_text, code, self.method, self.path, self.message
            ),
            None => write!(
                f,
                "Jamf Pro API error ({} {}) at {} {}: {}",
                self.status, self.status_text, self.method, self.path, self.message
            ),
        }
    }
}

impl std::error::Error for VendorError {}

/// Unified error type for all transport operations.
///
/// # Variants
///
/// | Variant | Meaning |
/// |---------|---------|
/// | `AuthenticationFailed` | Credential or token refresh rejected |
/// | `Configuration` | Invalid client or call configuration |
/// | `Vendor` | Classified non-2xx response from either wire format |
/// | `ResponseDecodeFailed` | 2xx response whose body did not match the expected shape |
/// | `RequestEncodeFailed` | Request body could not be serialized |
/// | `Transport` | Network-level failure: timeout, connection reset, cancellation |
/// | `PageMerge` | A pagination merge callback returned an error |
///
/// # Notes
///
/// - None of these are retried inside the transport, except that a single
///   transparent re-authentication is attempted after a 401.
/// - Every variant produced from a received response exposes the response
///   metadata via [`envelope`](Self::envelope).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credential exchange or token refresh was rejected.
    ///
    /// Not retried beyond the single refresh attempt, to avoid
    /// credential-lockout amplification.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Why the token could not be obtained.
        message: String,
    },

    /// The client or a call was misconfigured (missing credential fields,
    /// empty resource identifiers, unbuildable HTTP client).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A non-2xx response, classified from either wire format.
    #[error(transparent)]
    Vendor(#[from] VendorError),

    /// A 2xx response whose body could not be decoded into the expected
    /// type. Usually indicates an API contract change; the envelope keeps
    /// the raw body for inspection.
    #[error("response decode failed: {detail}")]
    ResponseDecodeFailed {
        /// Decoder error description.
        detail: String,
        /// The response that failed to decode.
        envelope: ResponseEnvelope,
    },

    /// The request body could not be serialized in the selected wire format.
    #[error("request body encoding failed: {0}")]
    RequestEncodeFailed(String),

    /// Network-level failure: timeout, connection reset, DNS failure, or
    /// cancellation of the in-flight request.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A caller-supplied pagination merge callback failed. Pages merged
    /// before the failure are not rolled back.
    #[error("merge page: {source}")]
    PageMerge {
        /// The callback's error.
        #[source]
        source: anyhow::Error,
        /// The page response whose merge failed.
        envelope: ResponseEnvelope,
    },
}

impl ApiError {
    /// Returns the HTTP status code, when this error was produced from a
    /// received response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Vendor(e) => Some(e.status),
            Self::ResponseDecodeFailed { envelope, .. } | Self::PageMerge { envelope, .. } => {
                Some(envelope.status)
            }
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the response metadata, when this error was produced from a
    /// received response. `None` for failures where no response arrived
    /// (connect errors, timeouts, cancellation) and for configuration and
    /// authentication errors.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Vendor(e) => Some(&e.envelope),
            Self::ResponseDecodeFailed { envelope, .. } | Self::PageMerge { envelope, .. } => {
                Some(envelope)
            }
            _ => None,
        }
    }

    /// Returns the vendor error code, when the failure payload carried one.
    pub fn vendor_code(&self) -> Option<&str> {
        match self {
            Self::Vendor(e) => e.code.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` for a 401 response or a rejected credential exchange.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. }) || self.status() == Some(401)
    }

    /// Returns `true` for a 400 response.
    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400)
    }

    /// Returns `true` for a 5xx response.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if (500..600).contains(&s))
    }

    /// Returns `true` when the underlying failure was a network timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

/// Common shape of Jamf Pro API (JSON) error payloads.
#[derive(Debug, Default, Deserialize)]
struct JsonErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Matches `<br>` and `<br/>` (with optional whitespace) in Classic API
/// error fragments.
static BR_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("invalid <br> pattern"));

/// Marker phrase preceding the actual message in Classic API error bodies.
const CLASSIC_ERROR_MARKER: &str = "An error has occurred.";

/// Classifies a non-2xx response into a [`VendorError`].
///
/// Pure function of (envelope, wire format, method, path):
///
/// - JSON: parses `{"code": ..., "message": ...}` and surfaces both.
/// - XML/Classic: the body is an HTML fragment, not well-formed XML. The
///   text is split on `<br>` tags and the segment after
///   "An error has occurred." becomes the message.
/// - If parsing fails either way, the raw body becomes the message, or a
///   default message for the status code when the body is empty. The
///   failure is never silently dropped.
pub(crate) fn parse_error_response(
    envelope: ResponseEnvelope,
    format: WireFormat,
    method: &str,
    path: &str,
) -> ApiError {
    let (code, message) = match format {
        WireFormat::Json => classify_json(&envelope.body),
        WireFormat::Xml => (None, classify_classic(&envelope.body)),
    };

    let message = message.unwrap_or_else(|| {
        let raw = String::from_utf8_lossy(&envelope.body).trim().to_string();
        if raw.is_empty() {
            default_message_for_status(envelope.status).to_string()
        } else {
            raw
        }
    });

    tracing::error!(
        status = envelope.status,
        method,
        path,
        message = %message,
        "API error response"
    );

    ApiError::Vendor(VendorError {
        status: envelope.status,
        status_text: envelope.status_text.clone(),
        code,
        message,
        method: method.to_string(),
        path: path.to_string(),
        envelope,
    })
}

/// Extracts `(code, message)` from a Jamf Pro API JSON error body.
fn classify_json(body: &[u8]) -> (Option<String>, Option<String>) {
    match serde_json::from_slice::<JsonErrorBody>(body) {
        Ok(parsed) if !parsed.code.is_empty() || !parsed.message.is_empty() => {
            let code = (!parsed.code.is_empty()).then_some(parsed.code);
            let message = (!parsed.message.is_empty()).then_some(parsed.message);
            (code, message)
        }
        _ => (None, None),
    }
}

/// Extracts the message from a Classic API error fragment.
///
/// The Classic API returns bodies like:
///
/// ```text
/// <br>An error has occurred.<br>Resource not found<br><br>
/// ```
///
/// The segment following the marker phrase is the message.
fn classify_classic(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let segments: Vec<&str> = BR_TAG.split(text).map(str::trim).collect();

    let marker_index = segments
        .iter()
        .position(|s| s.contains(CLASSIC_ERROR_MARKER))?;

    segments[marker_index + 1..]
        .iter()
        .find(|s| !s.is_empty())
        .map(|s| unescape_html(s))
}

/// Decodes the handful of HTML entities the Classic API emits in error text.
fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Default messages for status codes when the error payload is empty.
fn default_message_for_status(status: u16) -> &'static str {
    match status {
        400 => "The request could not be understood by the server due to malformed syntax.",
        401 => "The request has not been applied because it lacks valid authentication credentials for the target resource.",
        403 => "Authentication required or token invalid. The server understood the request but refuses to authorize it.",
        404 => "The server has not found anything matching the Request-URI.",
        409 => "The request could not be completed due to a conflict with the current state of the resource.",
        412 => "One or more conditions given in the request header fields evaluated to false when tested on the server.",
        422 => "The request has correct syntax, but has a field with a bad value, such as an ID which does not exist, an illegal enum value, or a field is missing entirely.",
        429 => "The user has sent too many requests in a given amount of time (rate limiting).",
        500 => "The server encountered an unexpected condition which prevented it from fulfilling the request.",
        503 => "The server is currently unable to handle the request due to a temporary overloading or maintenance of the server.",
        _ => "Unknown error",
    }
}
