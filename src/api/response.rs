//
//  jamfpro
//  api/response.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! Response Envelope Types
//!
//! Every transport operation returns HTTP response metadata alongside the
//! decoded result, and every error derived from a received response carries
//! the same metadata. Callers can therefore always log the status code and
//! inspect headers, even when decoding failed. This matters when debugging
//! vendor API changes: the raw status and body are the only evidence.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

use super::error::ApiError;
use super::mime;

/// HTTP response metadata captured for every request, success or failure.
///
/// The envelope is populated from the wire before any decoding happens, so
/// it is available both on the success path (inside [`Reply`]) and on error
/// variants produced from a received response
/// ([`ApiError::Vendor`](super::ApiError), `ResponseDecodeFailed`,
/// `PageMerge`).
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `status` | HTTP status code (e.g. `200`, `404`) |
/// | `status_text` | Canonical reason phrase (e.g. `"Not Found"`) |
/// | `headers` | All response headers |
/// | `body` | The full raw response body |
/// | `duration` | Wall-clock time from send to fully-read body |
/// | `received_at` | Timestamp the response finished arriving |
///
/// # Example
///
/// ```rust,no_run
/// use jamfpro::api::ResponseEnvelope;
///
/// fn log_outcome(envelope: &ResponseEnvelope) {
///     println!(
///         "{} {} ({} bytes in {:?})",
///         envelope.status,
///         envelope.status_text,
///         envelope.body.len(),
///         envelope.duration,
///     );
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for the status code, empty if non-standard.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Time from sending the request to reading the full body.
    pub duration: Duration,
    /// When the response body finished arriving.
    pub received_at: DateTime<Utc>,
}

impl ResponseEnvelope {
    /// Consumes a `reqwest::Response`, reading the full body into memory.
    ///
    /// Body read failures (connection reset mid-body, timeout) surface as
    /// [`ApiError::Transport`].
    pub(crate) async fn read(
        response: reqwest::Response,
        started: Instant,
    ) -> Result<Self, ApiError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(ApiError::Transport)?.to_vec();

        Ok(Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            duration: started.elapsed(),
            received_at: Utc::now(),
        })
    }

    /// Returns `true` if the status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` if the status code is 4xx or 5xx.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Returns a response header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body interpreted as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Sanity-checks the response before decoding.
    ///
    /// An empty body is always acceptable (e.g. 204 No Content). A 2xx body
    /// whose `Content-Type` is neither JSON nor XML is logged at warn level
    /// since it usually signals a proxy page or an API contract change.
    pub(crate) fn validate(&self, method: &str, path: &str) {
        if self.body.is_empty() {
            tracing::debug!(method, path, status = self.status, "Empty response received");
            return;
        }
        if !self.is_error() {
            if let Some(content_type) = self.header("Content-Type") {
                if !content_type.starts_with(mime::APPLICATION_JSON)
                    && !content_type.starts_with(mime::APPLICATION_XML)
                {
                    tracing::warn!(
                        method,
                        path,
                        content_type,
                        "Unexpected Content-Type in response"
                    );
                }
            }
        }
    }
}

/// A decoded result paired with its [`ResponseEnvelope`].
///
/// `data` is `None` when the server returned a 2xx status with an empty
/// body (e.g. 204 No Content). This is distinct from a decode failure,
/// which is reported as [`ApiError::ResponseDecodeFailed`](super::ApiError).
///
/// # Example
///
/// ```rust,no_run
/// use jamfpro::api::Reply;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Building { id: String, name: String }
///
/// fn handle(reply: Reply<Building>) {
///     match reply.data {
///         Some(building) => println!("found {}", building.name),
///         None => println!("no body ({})", reply.envelope.status),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Reply<T> {
    /// The decoded response body, `None` if the body was empty.
    pub data: Option<T>,
    /// The response metadata.
    pub envelope: ResponseEnvelope,
}
