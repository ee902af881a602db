//
//  jamfpro
//  services/printers.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Printers (Classic API)
//!
//! CRUD operations for printer resources via the legacy Classic API.
//! Everything here speaks XML: the service is constructed with
//! [`CallOptions::xml`], which drives serialization, decoding, and the
//! legacy error-fragment classification.
//!
//! Classic API docs: <https://developer.jamf.com/jamf-pro/reference/printers>

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, CallOptions, JamfClient, Reply, ResponseEnvelope};

const ENDPOINT: &str = "/JSSResource/printers";

/// A Classic API printer resource.
///
/// Field names mirror the Classic API's XML element names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename = "printer", default)]
pub struct Printer {
    /// Assigned resource ID; absent in create/update request bodies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "CUPS_name", skip_serializing_if = "Option::is_none")]
    pub cups_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub make_default: bool,
    pub use_generic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppd_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppd_contents: Option<String>,
}

/// Slim representation returned in list responses.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrinterListItem {
    pub id: u32,
    pub name: String,
}

/// Response for [`PrintersService::list`]
/// (`GET /JSSResource/printers`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "printers", default)]
pub struct PrinterList {
    pub size: u32,
    #[serde(rename = "printer")]
    pub printers: Vec<PrinterListItem>,
}

/// Response for create and update operations, which return only the
/// assigned resource ID.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "printer")]
pub struct PrinterId {
    pub id: u32,
}

/// Handles communication with the printer-related Classic API endpoints.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use jamfpro::api::JamfClient;
/// use jamfpro::auth::AuthConfig;
/// use jamfpro::services::printers::PrintersService;
///
/// # async fn example() -> Result<(), jamfpro::api::ApiError> {
/// let client = Arc::new(JamfClient::new(AuthConfig::basic(
///     "https://example.jamfcloud.com",
///     "admin",
///     "hunter2",
/// ))?);
/// let printers = PrintersService::new(client);
///
/// let reply = printers.list().await?;
/// if let Some(list) = reply.data {
///     println!("{} printers", list.size);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PrintersService {
    client: Arc<JamfClient>,
    opts: CallOptions,
}

impl PrintersService {
    /// Returns a new printers service backed by the provided client.
    pub fn new(client: Arc<JamfClient>) -> Self {
        Self {
            client,
            opts: CallOptions::xml(),
        }
    }

    /// Returns all printers.
    ///
    /// URL: `GET /JSSResource/printers`
    pub async fn list(&self) -> Result<Reply<PrinterList>, ApiError> {
        self.client.get(ENDPOINT, None, &self.opts).await
    }

    /// Returns the specified printer by ID.
    ///
    /// URL: `GET /JSSResource/printers/id/{id}`
    pub async fn get_by_id(&self, id: u32) -> Result<Reply<Printer>, ApiError> {
        self.client
            .get(&format!("{ENDPOINT}/id/{id}"), None, &self.opts)
            .await
    }

    /// Returns the specified printer by name.
    ///
    /// URL: `GET /JSSResource/printers/name/{name}`
    pub async fn get_by_name(&self, name: &str) -> Result<Reply<Printer>, ApiError> {
        require_name(name)?;
        self.client
            .get(&format!("{ENDPOINT}/name/{name}"), None, &self.opts)
            .await
    }

    /// Creates a new printer and returns the assigned resource ID.
    ///
    /// URL: `POST /JSSResource/printers/id/0`
    pub async fn create(&self, printer: &Printer) -> Result<Reply<PrinterId>, ApiError> {
        require_name(&printer.name)?;
        self.client
            .post(&format!("{ENDPOINT}/id/0"), Some(printer), &self.opts)
            .await
    }

    /// Updates the specified printer by ID.
    ///
    /// URL: `PUT /JSSResource/printers/id/{id}`
    pub async fn update_by_id(
        &self,
        id: u32,
        printer: &Printer,
    ) -> Result<Reply<PrinterId>, ApiError> {
        self.client
            .put(&format!("{ENDPOINT}/id/{id}"), Some(printer), &self.opts)
            .await
    }

    /// Updates the specified printer by name.
    ///
    /// URL: `PUT /JSSResource/printers/name/{name}`
    pub async fn update_by_name(
        &self,
        name: &str,
        printer: &Printer,
    ) -> Result<Reply<PrinterId>, ApiError> {
        require_name(name)?;
        self.client
            .put(&format!("{ENDPOINT}/name/{name}"), Some(printer), &self.opts)
            .await
    }

    /// Removes the specified printer by ID.
    ///
    /// URL: `DELETE /JSSResource/printers/id/{id}`
    pub async fn delete_by_id(&self, id: u32) -> Result<ResponseEnvelope, ApiError> {
        self.client
            .delete(&format!("{ENDPOINT}/id/{id}"), None, &self.opts)
            .await
    }

    /// Removes the specified printer by name.
    ///
    /// URL: `DELETE /JSSResource/printers/name/{name}`
    pub async fn delete_by_name(&self, name: &str) -> Result<ResponseEnvelope, ApiError> {
        require_name(name)?;
        self.client
            .delete(&format!("{ENDPOINT}/name/{name}"), None, &self.opts)
            .await
    }
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Configuration(
            "printer name is required".to_string(),
        ));
    }
    Ok(())
}
