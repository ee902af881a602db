//
//  jamfpro
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # HTTP Transport Layer for the Jamf Pro API
//!
//! This module provides the shared transport every resource service is built
//! on. It handles bearer-token authentication with transparent refresh,
//! request execution in both of Jamf Pro's wire formats (JSON for the Jamf
//! Pro API, XML for the Classic API), cursor-style pagination, RSQL query
//! construction, and normalization of both failure payload shapes into a
//! single error type.
//!
//! ## Module Structure
//!
//! - [`client`]: [`JamfClient`] and its builder
//! - [`request`]: per-verb operations and [`CallOptions`]
//! - [`pagination`]: push-callback pagination and the lazy page stream
//! - [`rsql`]: RSQL filter expressions and query parameters
//! - [`error`]: the [`ApiError`] taxonomy and error-response classifier
//! - [`response`]: [`ResponseEnvelope`] and [`Reply`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use jamfpro::api::{CallOptions, JamfClient, QueryParams, Reply};
//! use jamfpro::auth::AuthConfig;
//!
//! # async fn example() -> Result<(), jamfpro::api::ApiError> {
//! let auth = AuthConfig::oauth2(
//!     "https://example.jamfcloud.com",
//!     "client-id",
//!     "client-secret",
//! );
//! let client = JamfClient::new(auth)?;
//!
//! let query = QueryParams::new().filter(r#"name=="Head Office""#);
//! let reply: Reply<serde_json::Value> = client
//!     .get("/api/v1/buildings", Some(&query), &CallOptions::json())
//!     .await?;
//! println!("status: {}", reply.envelope.status);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod client;
pub mod error;
pub mod pagination;
pub mod request;
pub mod response;
pub mod rsql;

pub(crate) mod throttle;

pub use client::{ClientBuilder, JamfClient};
pub use error::{ApiError, VendorError};
pub use pagination::Page;
pub use request::{CallOptions, MultipartProgressCallback};
pub use response::{Reply, ResponseEnvelope};
pub use rsql::{QueryParams, RsqlFilterBuilder, SortDirection};

/// Default page size used by paginated endpoints when the caller does not
/// supply a `page-size` query parameter.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Default timeout applied to every request unless overridden on the
/// builder or per call via [`CallOptions::with_timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Base component of the `User-Agent` header sent with every request.
pub(crate) const USER_AGENT_BASE: &str = "jamfpro-rs";

/// MIME type constants shared by the transport and the resource services.
pub mod mime {
    /// `application/json` (Jamf Pro API requests and responses).
    pub const APPLICATION_JSON: &str = "application/json";
    /// `application/xml` (Classic API requests and responses).
    pub const APPLICATION_XML: &str = "application/xml";
    /// `application/x-www-form-urlencoded` (OAuth2 token exchange).
    pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
    /// `application/octet-stream` (multipart file parts).
    pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
}

/// The wire format of one of Jamf Pro's two parallel API generations.
///
/// Every resource service targets exactly one generation and selects its
/// format once, at construction time. The transport uses the format to pick
/// `Accept`/`Content-Type` headers, to serialize request bodies, and to
/// decode success and error payloads.
///
/// # Variants
///
/// * `Json` - The current Jamf Pro API (`/api/...`)
/// * `Xml` - The legacy Classic API (`/JSSResource/...`)
///
/// # Example
///
/// ```rust
/// use jamfpro::api::WireFormat;
///
/// assert_eq!(WireFormat::Json.mime_type(), "application/json");
/// assert_eq!(WireFormat::Xml.mime_type(), "application/xml");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// JSON, used by the current Jamf Pro API generation.
    #[default]
    Json,
    /// XML, used by the legacy Classic API generation.
    Xml,
}

impl WireFormat {
    /// Returns the MIME type for this wire format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => mime::APPLICATION_JSON,
            Self::Xml => mime::APPLICATION_XML,
        }
    }
}
