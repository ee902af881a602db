//
//  jamfpro
//  api/request.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Request Execution
//!
//! One method per wire verb: GET, GET-as-raw-bytes, POST, POST-with-query,
//! POST-as-form, POST-multipart-with-progress, PUT, PATCH, DELETE, and
//! DELETE-with-body. Every operation:
//!
//! 1. Resolves a bearer token from the token provider.
//! 2. Builds the full URL from base URL, path, and query parameters.
//! 3. Serializes the body in the wire format selected by [`CallOptions`].
//! 4. Sends the request, reads the full response, and captures a
//!    [`ResponseEnvelope`](super::ResponseEnvelope) before any decoding.
//! 5. Classifies non-2xx responses into
//!    [`ApiError::Vendor`](super::ApiError); a 401 triggers one transparent
//!    re-authentication and retry with a freshly built request.
//! 6. Decodes 2xx bodies into the caller's type; an empty body yields
//!    `data: None` and a mismatched body yields `ResponseDecodeFailed`.
//!
//! Cancellation is Rust-native: dropping the returned future aborts the
//! in-flight request. Per-call deadlines are set with
//! [`CallOptions::with_timeout`] and surface as
//! [`ApiError::Transport`](super::ApiError).

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use super::client::JamfClient;
use super::error::{parse_error_response, ApiError};
use super::mime;
use super::response::{Reply, ResponseEnvelope};
use super::rsql::QueryParams;
use super::WireFormat;

/// Progress callback for multipart uploads, invoked with
/// `(cumulative_bytes_sent, declared_total_bytes)` as the file part
/// streams out. Cumulative counts are monotonically non-decreasing and end
/// at the declared size.
pub type MultipartProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Per-call options: wire format, extra headers, and an optional timeout
/// override.
///
/// Resource services construct one of these at creation time, fixing the
/// wire format for every call they make. The format drives the default
/// `Accept`/`Content-Type` headers, body serialization, and error payload
/// parsing.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use jamfpro::api::CallOptions;
///
/// // Classic API service, with a longer deadline for slow endpoints:
/// let opts = CallOptions::xml().with_timeout(Duration::from_secs(120));
///
/// // Jamf Pro API service, requesting a specific source header:
/// let opts = CallOptions::json().with_header("X-Sync-Run", "nightly");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Wire format for request bodies, response decoding, and error
    /// payload classification.
    pub format: WireFormat,
    /// Extra headers applied after the format defaults and the client's
    /// global headers; empty values are skipped.
    pub headers: Vec<(String, String)>,
    /// Overrides the client's default timeout for this call.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// Options for the current Jamf Pro API generation (JSON).
    pub fn json() -> Self {
        Self {
            format: WireFormat::Json,
            ..Self::default()
        }
    }

    /// Options for the legacy Classic API generation (XML).
    pub fn xml() -> Self {
        Self {
            format: WireFormat::Xml,
            ..Self::default()
        }
    }

    /// Adds an extra header to every call made with these options.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Overrides the client's default timeout for calls made with these
    /// options.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A serialized request body, rebuilt from these parts on the
/// re-authentication retry so the original request descriptor is never
/// reused with a stale token.
enum RequestBody {
    Empty,
    Raw {
        content_type: &'static str,
        bytes: Vec<u8>,
    },
    Form(String),
}

impl JamfClient {
    // -------------------------------------------------------------------------
    // Verb surface
    // -------------------------------------------------------------------------

    /// Executes a GET request and decodes the response body.
    ///
    /// `query` carries RSQL filter, sort, and pagination parameters;
    /// entries with empty values are not sent.
    ///
    /// # Errors
    ///
    /// [`ApiError::Vendor`] for non-2xx responses,
    /// [`ApiError::ResponseDecodeFailed`] when a 2xx body does not match
    /// `T`, [`ApiError::Transport`] for network failures.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let envelope = self
            .execute_raw(Method::GET, path, query, RequestBody::Empty, opts, true)
            .await?;
        decode_reply(envelope, opts.format)
    }

    /// Executes a GET request and returns the raw response without
    /// decoding. Use for non-JSON/XML payloads such as binary files, CSV
    /// exports, or raw exports; the bytes are in
    /// [`ResponseEnvelope::body`].
    pub async fn get_bytes(
        &self,
        path: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.execute_raw(Method::GET, path, query, RequestBody::Empty, opts, true)
            .await
    }

    /// Executes a POST request with a body serialized in the selected wire
    /// format. Pass `None::<&()>` for an empty body.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let payload = serialize_body(body, opts.format)?;
        let envelope = self
            .execute_raw(Method::POST, path, None, payload, opts, true)
            .await?;
        decode_reply(envelope, opts.format)
    }

    /// Executes a POST request with both query parameters and a body.
    pub async fn post_with_query<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&QueryParams>,
        body: Option<&B>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let payload = serialize_body(body, opts.format)?;
        let envelope = self
            .execute_raw(Method::POST, path, query, payload, opts, true)
            .await?;
        decode_reply(envelope, opts.format)
    }

    /// Executes a POST request with `application/x-www-form-urlencoded`
    /// data.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in form {
            serializer.append_pair(key, value);
        }
        let envelope = self
            .execute_raw(
                Method::POST,
                path,
                None,
                RequestBody::Form(serializer.finish()),
                opts,
                true,
            )
            .await?;
        decode_reply(envelope, opts.format)
    }

    /// Executes a streaming multipart POST, typically a file upload.
    ///
    /// The `source` is streamed through the request body without buffering
    /// the whole file in memory. `file_size` is the declared size sent in
    /// the part's `Content-Length`; `progress`, when supplied, receives
    /// `(cumulative_bytes_sent, file_size)` per chunk.
    ///
    /// A 401 is NOT transparently retried here: the source stream has been
    /// consumed and cannot be replayed.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use jamfpro::api::{CallOptions, JamfClient, Reply};
    ///
    /// # async fn example(client: &JamfClient) -> Result<(), jamfpro::api::ApiError> {
    /// let file = tokio::fs::File::open("icon.png").await.map_err(|e| {
    ///     jamfpro::api::ApiError::Configuration(e.to_string())
    /// })?;
    /// let size = file.metadata().await.unwrap().len();
    ///
    /// let reply: Reply<serde_json::Value> = client
    ///     .post_multipart(
    ///         "/api/v1/icon",
    ///         "file",
    ///         "icon.png",
    ///         file,
    ///         size,
    ///         &[],
    ///         Some(Arc::new(|sent, total| eprintln!("{sent}/{total}"))),
    ///         &CallOptions::json(),
    ///     )
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub async fn post_multipart<R, T>(
        &self,
        path: &str,
        file_field: &str,
        file_name: &str,
        source: R,
        file_size: u64,
        form_fields: &[(&str, &str)],
        progress: Option<MultipartProgressCallback>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError>
    where
        R: AsyncRead + Send + 'static,
        T: DeserializeOwned,
    {
        let _permit = self.acquire_slot().await;
        let token = self.tokens.current_token().await?;

        let mut sent: u64 = 0;
        let stream = ReaderStream::new(source).map(move |chunk| {
            if let (Ok(bytes), Some(callback)) = (&chunk, &progress) {
                sent += bytes.len() as u64;
                callback(sent, file_size);
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), file_size)
            .file_name(file_name.to_string())
            .mime_str(mime::APPLICATION_OCTET_STREAM)
            .map_err(ApiError::Transport)?;
        let mut form = Form::new().part(file_field.to_string(), part);
        for (key, value) in form_fields {
            form = form.text(key.to_string(), value.to_string());
        }

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).bearer_auth(&token.value);
        if let Some(timeout) = opts.timeout {
            request = request.timeout(timeout);
        }
        // Content-Type is owned by the multipart encoder (boundary included);
        // only Accept and caller headers are applied.
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, ACCEPT.as_str(), opts.format.mime_type());
        self.apply_custom_headers(&mut headers, opts, true);
        request = request.headers(headers).multipart(form);

        tracing::debug!(method = "POST", path, "Executing multipart request");
        let envelope = self.dispatch(request, "POST", path).await?;

        if envelope.is_error() {
            return Err(parse_error_response(envelope, opts.format, "POST", path));
        }
        self.after_success(&envelope).await;
        decode_reply(envelope, opts.format)
    }

    /// Executes a PUT request with a body serialized in the selected wire
    /// format.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let payload = serialize_body(body, opts.format)?;
        let envelope = self
            .execute_raw(Method::PUT, path, None, payload, opts, true)
            .await?;
        decode_reply(envelope, opts.format)
    }

    /// Executes a PATCH request with a body serialized in the selected
    /// wire format.
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let payload = serialize_body(body, opts.format)?;
        let envelope = self
            .execute_raw(Method::PATCH, path, None, payload, opts, true)
            .await?;
        decode_reply(envelope, opts.format)
    }

    /// Executes a DELETE request. Most delete endpoints return no body, so
    /// this returns the envelope alone; use
    /// [`delete_with_body`](Self::delete_with_body) for bulk endpoints
    /// that take and return payloads.
    pub async fn delete(
        &self,
        path: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.execute_raw(Method::DELETE, path, query, RequestBody::Empty, opts, true)
            .await
    }

    /// Executes a DELETE request with a body (bulk delete operations).
    pub async fn delete_with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: &CallOptions,
    ) -> Result<Reply<T>, ApiError> {
        let payload = serialize_body(body, opts.format)?;
        let envelope = self
            .execute_raw(Method::DELETE, path, None, payload, opts, true)
            .await?;
        decode_reply(envelope, opts.format)
    }

    // -------------------------------------------------------------------------
    // Central executor
    // -------------------------------------------------------------------------

    async fn acquire_slot(&self) -> Option<tokio::sync::SemaphorePermit<'_>> {
        match &self.limiter {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        }
    }

    /// Applies the client's global headers and the call's extra headers.
    /// Empty values are skipped; `Content-Type` is skipped when the body
    /// encoding owns it (form and multipart).
    fn apply_custom_headers(
        &self,
        headers: &mut HeaderMap,
        opts: &CallOptions,
        skip_content_type: bool,
    ) {
        for (key, value) in self
            .global_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(opts.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        {
            if value.is_empty() {
                continue;
            }
            if skip_content_type && key.eq_ignore_ascii_case("content-type") {
                continue;
            }
            insert_header(headers, key, value);
        }
    }

    /// Sends a fully built request and captures the response envelope,
    /// logging deprecation warnings and Content-Type surprises.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<ResponseEnvelope, ApiError> {
        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(method, path, error = %e, "Request failed");
                return Err(ApiError::Transport(e));
            }
        };

        let envelope = ResponseEnvelope::read(response, started).await?;
        envelope.validate(method, path);

        if let Some(deprecation) = envelope.header("Deprecation") {
            tracing::warn!(
                endpoint = path,
                deprecation,
                sunset = envelope.header("Sunset").unwrap_or_default(),
                "Jamf Pro API endpoint is deprecated"
            );
        }
        Ok(envelope)
    }

    /// The central request executor behind every verb except multipart.
    ///
    /// Builds the request from its parts, so the re-authentication retry
    /// constructs a fresh descriptor with a newly resolved token instead
    /// of replaying the old one.
    async fn execute_raw(
        &self,
        method: Method,
        path: &str,
        query: Option<&QueryParams>,
        body: RequestBody,
        opts: &CallOptions,
        allow_reauth: bool,
    ) -> Result<ResponseEnvelope, ApiError> {
        let _permit = self.acquire_slot().await;
        let url = format!("{}{}", self.base_url, path);
        let mut attempted_reauth = false;

        loop {
            let token = self.tokens.current_token().await?;

            let mut request = self.http.request(method.clone(), &url);
            if let Some(timeout) = opts.timeout {
                request = request.timeout(timeout);
            }
            if let Some(query) = query {
                let pairs: Vec<(&str, &str)> = query.iter().collect();
                if !pairs.is_empty() {
                    request = request.query(&pairs);
                }
            }

            let mut headers = HeaderMap::new();
            insert_header(&mut headers, ACCEPT.as_str(), opts.format.mime_type());
            match &body {
                RequestBody::Empty => {
                    self.apply_custom_headers(&mut headers, opts, false);
                }
                RequestBody::Raw {
                    content_type,
                    bytes,
                } => {
                    insert_header(&mut headers, CONTENT_TYPE.as_str(), content_type);
                    self.apply_custom_headers(&mut headers, opts, false);
                    request = request.body(bytes.clone());
                }
                RequestBody::Form(encoded) => {
                    insert_header(&mut headers, CONTENT_TYPE.as_str(), mime::APPLICATION_FORM);
                    self.apply_custom_headers(&mut headers, opts, true);
                    request = request.body(encoded.clone());
                }
            }
            request = request.headers(headers).bearer_auth(&token.value);

            tracing::debug!(method = %method, path, "Executing API request");
            let envelope = self.dispatch(request, method.as_str(), path).await?;

            if envelope.is_error() {
                // One transparent re-authentication after a rejected token,
                // then the failure is surfaced to the caller.
                if envelope.status == 401 && allow_reauth && !attempted_reauth {
                    attempted_reauth = true;
                    tracing::warn!(
                        method = %method,
                        path,
                        "Bearer token rejected, re-authenticating"
                    );
                    self.tokens.clear().await;
                    continue;
                }
                return Err(parse_error_response(
                    envelope,
                    opts.format,
                    method.as_str(),
                    path,
                ));
            }

            tracing::debug!(
                method = %method,
                path,
                status = envelope.status,
                duration_ms = envelope.duration.as_millis() as u64,
                "Request completed"
            );
            self.after_success(&envelope).await;
            return Ok(envelope);
        }
    }

    /// Post-success pacing: the configured fixed delay, then the adaptive
    /// delay when the server is responding above its latency baseline.
    async fn after_success(&self, envelope: &ResponseEnvelope) {
        if let Some(delay) = self.request_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(adaptive) = self.tracker.record(envelope.duration) {
            tracing::debug!(
                response_time_ms = envelope.duration.as_millis() as u64,
                adaptive_delay_ms = adaptive.as_millis() as u64,
                "Adaptive delay applied due to elevated response time"
            );
            tokio::time::sleep(adaptive).await;
        }
    }
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::try_from(key.to_string()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, value);
    }
}

/// Serializes a request body in the given wire format.
fn serialize_body<B: Serialize>(
    body: Option<&B>,
    format: WireFormat,
) -> Result<RequestBody, ApiError> {
    let Some(body) = body else {
        return Ok(RequestBody::Empty);
    };
    match format {
        WireFormat::Json => {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ApiError::RequestEncodeFailed(e.to_string()))?;
            Ok(RequestBody::Raw {
                content_type: mime::APPLICATION_JSON,
                bytes,
            })
        }
        WireFormat::Xml => {
            let text = quick_xml::se::to_string(body)
                .map_err(|e| ApiError::RequestEncodeFailed(e.to_string()))?;
            Ok(RequestBody::Raw {
                content_type: mime::APPLICATION_XML,
                bytes: text.into_bytes(),
            })
        }
    }
}

/// Decodes a success envelope into `Reply<T>`. An empty body is valid
/// (e.g. 204) and yields `data: None`; a body that does not match `T` is
/// reported as [`ApiError::ResponseDecodeFailed`] with the envelope
/// attached, since it usually indicates an API contract change.
fn decode_reply<T: DeserializeOwned>(
    envelope: ResponseEnvelope,
    format: WireFormat,
) -> Result<Reply<T>, ApiError> {
    if envelope.body.is_empty() {
        return Ok(Reply {
            data: None,
            envelope,
        });
    }

    let decoded = match format {
        WireFormat::Json => serde_json::from_slice::<T>(&envelope.body).map_err(|e| e.to_string()),
        WireFormat::Xml => std::str::from_utf8(&envelope.body)
            .map_err(|e| e.to_string())
            .and_then(|text| quick_xml::de::from_str::<T>(text).map_err(|e| e.to_string())),
    };

    match decoded {
        Ok(data) => Ok(Reply {
            data: Some(data),
            envelope,
        }),
        Err(detail) => Err(ApiError::ResponseDecodeFailed { detail, envelope }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        id: u32,
        name: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename = "widget")]
    struct XmlWidget {
        id: u32,
        name: String,
    }

    async fn client_for(server: &mockito::ServerGuard) -> JamfClient {
        init_logging();
        JamfClient::new(AuthConfig::basic(server.url(), "admin", "hunter2")).unwrap()
    }

    /// Debug request/response logs for failing tests: RUST_LOG=debug.
    fn init_logging() {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(filter)
            .try_init();
    }

    async fn mock_token(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/api/v1/auth/token")
            .with_status(200)
            .with_body(r#"{"token":"tok","expires":"2099-01-01T00:00:00Z"}"#)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/api/v1/widgets/1")
            .match_header("authorization", "Bearer tok")
            .match_header("accept", mime::APPLICATION_JSON)
            .with_status(200)
            .with_body(r#"{"id":1,"name":"w"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let reply: Reply<Widget> = client
            .get("/api/v1/widgets/1", None, &CallOptions::json())
            .await
            .unwrap();

        assert_eq!(
            reply.data,
            Some(Widget {
                id: 1,
                name: "w".to_string()
            })
        );
        assert_eq!(reply.envelope.status, 200);
    }

    #[tokio::test]
    async fn test_get_decodes_xml() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/JSSResource/widgets/id/1")
            .match_header("accept", mime::APPLICATION_XML)
            .with_status(200)
            .with_body("<widget><id>1</id><name>w</name></widget>")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let reply: Reply<XmlWidget> = client
            .get("/JSSResource/widgets/id/1", None, &CallOptions::xml())
            .await
            .unwrap();

        assert_eq!(
            reply.data,
            Some(XmlWidget {
                id: 1,
                name: "w".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_empty_body_yields_none() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("DELETE", "/api/v1/widgets/1")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let envelope = client
            .delete("/api/v1/widgets/1", None, &CallOptions::json())
            .await
            .unwrap();

        assert_eq!(envelope.status, 204);
        assert!(envelope.body.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_envelope() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/api/v1/widgets/1")
            .with_status(200)
            .with_body(r#"{"unexpected":"shape"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .get::<Widget>("/api/v1/widgets/1", None, &CallOptions::json())
            .await
            .unwrap_err();

        match &err {
            ApiError::ResponseDecodeFailed { envelope, .. } => {
                assert_eq!(envelope.status, 200);
                assert!(!envelope.body.is_empty());
            }
            other => panic!("expected ResponseDecodeFailed, got {other:?}"),
        }
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn test_vendor_error_classified_from_json() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/api/v1/widgets/9")
            .with_status(404)
            .with_body(r#"{"code":"NOT-FOUND","message":"x"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .get::<Widget>("/api/v1/widgets/9", None, &CallOptions::json())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.vendor_code(), Some("NOT-FOUND"));
        assert_eq!(err.envelope().unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_401_triggers_single_reauth_then_retry() {
        let mut server = mockito::Server::new_async().await;
        // Token endpoint is hit twice: initial fetch and the reauth.
        let token_mock = server
            .mock("POST", "/api/v1/auth/token")
            .with_status(200)
            .with_body(r#"{"token":"tok","expires":"2099-01-01T00:00:00Z"}"#)
            .expect(2)
            .create_async()
            .await;
        let rejected = server
            .mock("GET", "/api/v1/widgets/1")
            .with_status(401)
            .with_body(r#"{"httpStatus":401}"#)
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/api/v1/widgets/1")
            .with_status(200)
            .with_body(r#"{"id":1,"name":"w"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let reply: Reply<Widget> = client
            .get("/api/v1/widgets/1", None, &CallOptions::json())
            .await
            .unwrap();

        assert!(reply.data.is_some());
        token_mock.assert_async().await;
        rejected.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_401_surfaces_as_vendor_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/token")
            .with_status(200)
            .with_body(r#"{"token":"tok","expires":"2099-01-01T00:00:00Z"}"#)
            .expect(2)
            .create_async()
            .await;
        let rejected = server
            .mock("GET", "/api/v1/widgets/1")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .get::<Widget>("/api/v1/widgets/1", None, &CallOptions::json())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_serializes_json_body() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let mock = server
            .mock("POST", "/api/v1/widgets")
            .match_header("content-type", mime::APPLICATION_JSON)
            .match_body(mockito::Matcher::JsonString(
                r#"{"name":"new"}"#.to_string(),
            ))
            .with_status(201)
            .with_body(r#"{"id":7,"name":"new"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let body = serde_json::json!({"name": "new"});
        let reply: Reply<Widget> = client
            .post("/api/v1/widgets", Some(&body), &CallOptions::json())
            .await
            .unwrap();

        assert_eq!(reply.data.unwrap().id, 7);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_with_query_sends_both() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let mock = server
            .mock("POST", "/api/v1/widgets/7/clone")
            .match_query(mockito::Matcher::UrlEncoded("site".into(), "main".into()))
            .match_body(mockito::Matcher::JsonString(
                r#"{"name":"copy"}"#.to_string(),
            ))
            .with_status(201)
            .with_body(r#"{"id":8,"name":"copy"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let query = QueryParams::new().set("site", "main");
        let body = serde_json::json!({"name": "copy"});
        let reply: Reply<Widget> = client
            .post_with_query(
                "/api/v1/widgets/7/clone",
                Some(&query),
                Some(&body),
                &CallOptions::json(),
            )
            .await
            .unwrap();

        assert_eq!(reply.data.unwrap().id, 8);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_and_patch_serialize_bodies() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let put_mock = server
            .mock("PUT", "/api/v1/widgets/1")
            .match_header("content-type", mime::APPLICATION_JSON)
            .with_status(200)
            .with_body(r#"{"id":1,"name":"renamed"}"#)
            .create_async()
            .await;
        let patch_mock = server
            .mock("PATCH", "/api/v1/widgets/1")
            .match_body(mockito::Matcher::JsonString(
                r#"{"name":"patched"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"id":1,"name":"patched"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let put_body = serde_json::json!({"name": "renamed"});
        let updated: Reply<Widget> = client
            .put("/api/v1/widgets/1", Some(&put_body), &CallOptions::json())
            .await
            .unwrap();
        assert_eq!(updated.data.unwrap().name, "renamed");

        let patch_body = serde_json::json!({"name": "patched"});
        let patched: Reply<Widget> = client
            .patch("/api/v1/widgets/1", Some(&patch_body), &CallOptions::json())
            .await
            .unwrap();
        assert_eq!(patched.data.unwrap().name, "patched");

        put_mock.assert_async().await;
        patch_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_form_encodes_pairs() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let mock = server
            .mock("POST", "/api/v1/widgets/import")
            .match_header("content-type", mime::APPLICATION_FORM)
            .match_body(mockito::Matcher::UrlEncoded("a".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"id":1,"name":"w"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let reply: Reply<Widget> = client
            .post_form("/api/v1/widgets/import", &[("a", "1")], &CallOptions::json())
            .await
            .unwrap();

        assert!(reply.data.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_with_body_sends_payload() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let mock = server
            .mock("DELETE", "/api/v1/widgets/delete-multiple")
            .match_body(mockito::Matcher::JsonString(
                r#"{"ids":["1","2"]}"#.to_string(),
            ))
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let body = serde_json::json!({"ids": ["1", "2"]});
        let reply: Reply<serde_json::Value> = client
            .delete_with_body(
                "/api/v1/widgets/delete-multiple",
                Some(&body),
                &CallOptions::json(),
            )
            .await
            .unwrap();

        assert!(reply.data.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_parameters_are_sent() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let mock = server
            .mock("GET", "/api/v1/widgets")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("filter".into(), r#"name=="x""#.into()),
                mockito::Matcher::UrlEncoded("page".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":1,"name":"x"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let query = QueryParams::new().filter(r#"name=="x""#).page(0);
        let reply: Reply<Widget> = client
            .get("/api/v1/widgets", Some(&query), &CallOptions::json())
            .await
            .unwrap();

        assert!(reply.data.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_multipart_reports_monotonic_progress() {
        use std::sync::Mutex;

        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("POST", "/api/v1/icon")
            .with_status(201)
            .with_body(r#"{"id":3,"name":"icon.png"}"#)
            .create_async()
            .await;

        let payload = vec![7u8; 256 * 1024];
        let declared = payload.len() as u64;
        let observed: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);

        let client = client_for(&server).await;
        let reply: Reply<Widget> = client
            .post_multipart(
                "/api/v1/icon",
                "file",
                "icon.png",
                std::io::Cursor::new(payload),
                declared,
                &[],
                Some(Arc::new(move |sent, total| {
                    assert_eq!(total, declared);
                    sink.lock().unwrap().push(sent);
                })),
                &CallOptions::json(),
            )
            .await
            .unwrap();

        assert!(reply.data.is_some());
        let counts = observed.lock().unwrap();
        assert!(!counts.is_empty());
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*counts.last().unwrap(), declared);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_transport_failure() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // A server that answers the token exchange, then goes silent: every
        // later request is read but never answered.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    loop {
                        let Ok(n) = socket.read(&mut buf).await else {
                            return;
                        };
                        if n == 0 {
                            return;
                        }
                        let request = String::from_utf8_lossy(&buf[..n]);
                        if request.starts_with("POST /api/v1/auth/token") {
                            let body = r#"{"token":"tok","expires":"2099-01-01T00:00:00Z"}"#;
                            let response = format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                                body.len(),
                                body
                            );
                            if socket.write_all(response.as_bytes()).await.is_err() {
                                return;
                            }
                        }
                        // Any other request: keep the connection open, say nothing.
                    }
                });
            }
        });

        let client =
            JamfClient::new(AuthConfig::basic(format!("http://{addr}"), "u", "p")).unwrap();
        let opts = CallOptions::json().with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let err = client
            .get::<Widget>("/api/v1/widgets/1", None, &opts)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }
}
