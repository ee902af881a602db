//
//  jamfpro
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Jamf Pro SDK for Rust
//!
//! A client library for the Jamf Pro device management REST API, covering
//! both of its wire-format generations: the current JSON Jamf Pro API and
//! the legacy XML Classic API.
//!
//! ## Overview
//!
//! The heart of the crate is the shared HTTP transport,
//! [`JamfClient`](api::JamfClient), which every resource service delegates
//! to. It uniformly handles:
//!
//! - **Authentication**: basic auth or OAuth2 client credentials exchanged
//!   for a bearer token, refreshed transparently before expiry, with
//!   concurrent refreshes coalesced into one (single-flight)
//! - **Request execution**: one operation per wire verb, JSON and XML
//!   serialization, response metadata captured for every call
//! - **Pagination**: push-callback and lazy-stream consumption of
//!   `totalCount`/`results` listings
//! - **RSQL**: fluent filter expression building and query parameters
//! - **Errors**: one taxonomy spanning both generations' failure payloads
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jamfpro::api::JamfClient;
//! use jamfpro::auth::AuthConfig;
//! use jamfpro::services::buildings::BuildingsService;
//!
//! # async fn example() -> Result<(), jamfpro::api::ApiError> {
//! let auth = AuthConfig::oauth2(
//!     "https://example.jamfcloud.com",
//!     "client-id",
//!     "client-secret",
//! );
//! let client = Arc::new(JamfClient::new(auth)?);
//!
//! let buildings = BuildingsService::new(Arc::clone(&client));
//! for building in buildings.list_all(None).await? {
//!     println!("{} ({})", building.name, building.id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry Policy
//!
//! The transport never retries transient failures on its own; blind
//! retries of non-idempotent operations can create duplicate resources.
//! The single transparent recovery is one re-authentication after a 401.

/// HTTP transport: client, request execution, pagination, RSQL, and the
/// error taxonomy.
pub mod api;

/// Authentication: credentials, configuration, and the bearer token
/// lifecycle.
pub mod auth;

/// Configuration loading from JSON files and environment variables.
pub mod config;

/// Per-resource CRUD services built on the transport.
pub mod services;

pub use api::{
    ApiError, CallOptions, ClientBuilder, JamfClient, MultipartProgressCallback, Page,
    QueryParams, Reply, ResponseEnvelope, RsqlFilterBuilder, SortDirection, VendorError,
    WireFormat,
};
pub use auth::{AuthConfig, Credential, Token};

/// Crate version, derived from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
