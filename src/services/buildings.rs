//
//  jamfpro
//  services/buildings.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Buildings (Jamf Pro API)
//!
//! CRUD operations for building resources via the current Jamf Pro API,
//! including RSQL-filtered paginated listing and multi-delete.
//!
//! Jamf Pro API docs:
//! <https://developer.jamf.com/jamf-pro/reference/get_v1-buildings>

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{
    ApiError, CallOptions, JamfClient, Page, QueryParams, Reply, ResponseEnvelope,
};

const ENDPOINT: &str = "/api/v1/buildings";

/// A building resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub street_address1: String,
    pub street_address2: String,
    pub city: String,
    pub state_province: String,
    pub zip_postal_code: String,
    pub country: String,
}

/// Body for creating and updating buildings. The target is addressed via
/// the URL path, so no ID is carried.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRequest {
    pub name: String,
    pub street_address1: String,
    pub street_address2: String,
    pub city: String,
    pub state_province: String,
    pub zip_postal_code: String,
    pub country: String,
}

/// Response for [`BuildingsService::create`].
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingCreated {
    pub id: String,
    pub href: String,
}

/// Body for [`BuildingsService::delete_multiple`].
#[derive(Debug, Serialize)]
struct DeleteMultipleRequest<'a> {
    ids: &'a [&'a str],
}

/// Handles communication with the buildings-related Jamf Pro API
/// endpoints.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use jamfpro::api::{JamfClient, QueryParams};
/// use jamfpro::auth::AuthConfig;
/// use jamfpro::services::buildings::BuildingsService;
///
/// # async fn example() -> Result<(), jamfpro::api::ApiError> {
/// let client = Arc::new(JamfClient::new(AuthConfig::oauth2(
///     "https://example.jamfcloud.com",
///     "id",
///     "secret",
/// ))?);
/// let buildings = BuildingsService::new(client);
///
/// let query = QueryParams::new().filter(r#"city=="Harare""#);
/// let all = buildings.list_all(Some(&query)).await?;
/// println!("{} buildings", all.len());
/// # Ok(())
/// # }
/// ```
pub struct BuildingsService {
    client: Arc<JamfClient>,
    opts: CallOptions,
}

impl BuildingsService {
    /// Returns a new buildings service backed by the provided client.
    pub fn new(client: Arc<JamfClient>) -> Self {
        Self {
            client,
            opts: CallOptions::json(),
        }
    }

    /// Returns one page of building objects. Optional query parameters
    /// support RSQL filtering, sorting, and paging.
    ///
    /// URL: `GET /api/v1/buildings`
    pub async fn list(
        &self,
        query: Option<&QueryParams>,
    ) -> Result<Reply<Page<Building>>, ApiError> {
        self.client.get(ENDPOINT, query, &self.opts).await
    }

    /// Returns all buildings, transparently walking every page of the
    /// listing. `query` may carry `filter` and `sort`; paging is managed
    /// internally.
    pub async fn list_all(&self, query: Option<&QueryParams>) -> Result<Vec<Building>, ApiError> {
        let mut buildings: Vec<Building> = Vec::new();
        self.client
            .get_paginated(ENDPOINT, query, &self.opts, |page| {
                buildings.extend(serde_json::from_slice::<Vec<Building>>(page)?);
                Ok(())
            })
            .await?;
        Ok(buildings)
    }

    /// Returns the specified building by ID.
    ///
    /// URL: `GET /api/v1/buildings/{id}`
    pub async fn get_by_id(&self, id: &str) -> Result<Reply<Building>, ApiError> {
        require_id(id)?;
        self.client
            .get(&format!("{ENDPOINT}/{id}"), None, &self.opts)
            .await
    }

    /// Creates a new building record and returns its ID and href.
    ///
    /// URL: `POST /api/v1/buildings`
    pub async fn create(
        &self,
        building: &BuildingRequest,
    ) -> Result<Reply<BuildingCreated>, ApiError> {
        self.client.post(ENDPOINT, Some(building), &self.opts).await
    }

    /// Updates the specified building by ID and returns the full updated
    /// resource.
    ///
    /// URL: `PUT /api/v1/buildings/{id}`
    pub async fn update_by_id(
        &self,
        id: &str,
        building: &BuildingRequest,
    ) -> Result<Reply<Building>, ApiError> {
        require_id(id)?;
        self.client
            .put(&format!("{ENDPOINT}/{id}"), Some(building), &self.opts)
            .await
    }

    /// Removes the specified building by ID.
    ///
    /// URL: `DELETE /api/v1/buildings/{id}`
    pub async fn delete_by_id(&self, id: &str) -> Result<ResponseEnvelope, ApiError> {
        require_id(id)?;
        self.client
            .delete(&format!("{ENDPOINT}/{id}"), None, &self.opts)
            .await
    }

    /// Deletes multiple buildings by their IDs.
    ///
    /// URL: `POST /api/v1/buildings/delete-multiple`
    pub async fn delete_multiple(&self, ids: &[&str]) -> Result<ResponseEnvelope, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::Configuration(
                "building ids are required".to_string(),
            ));
        }
        let reply: Reply<serde_json::Value> = self
            .client
            .post(
                &format!("{ENDPOINT}/delete-multiple"),
                Some(&DeleteMultipleRequest { ids }),
                &self.opts,
            )
            .await?;
        Ok(reply.envelope)
    }
}

fn require_id(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::Configuration(
            "building ID is required".to_string(),
        ));
    }
    Ok(())
}
