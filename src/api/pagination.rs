//
//  jamfpro
//  api/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Pagination over Jamf Pro API List Endpoints
//!
//! Paginated Jamf Pro API endpoints return a JSON envelope with
//! `totalCount` and `results`. Page numbering is zero-based; the page size
//! defaults to [`DEFAULT_PAGE_SIZE`](super::DEFAULT_PAGE_SIZE).
//!
//! Two consumption styles are offered:
//!
//! - [`JamfClient::get_paginated`]: push-based. A callback receives each
//!   page's raw `results` bytes, so memory stays bounded for very large
//!   listings and the caller controls accumulation.
//! - [`JamfClient::pages`]: a lazy [`Stream`] of decoded page vectors, for
//!   callers who prefer pull-style iteration.
//!
//! Pages are fetched strictly sequentially; the server-side cursor is not
//! safely parallelizable.

use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;

use super::client::JamfClient;
use super::error::ApiError;
use super::request::CallOptions;
use super::response::{Reply, ResponseEnvelope};
use super::rsql::QueryParams;
use super::DEFAULT_PAGE_SIZE;

/// The common paginated response envelope, with `results` left undecoded.
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(rename = "totalCount", default)]
    total_count: u64,
    #[serde(default)]
    results: Option<Box<RawValue>>,
}

/// A decoded page of a paginated listing.
///
/// # Example
///
/// ```rust
/// use jamfpro::api::Page;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Building { id: String, name: String }
///
/// let json = r#"{"totalCount": 120, "results": [{"id": "1", "name": "HQ"}]}"#;
/// let page: Page<Building> = serde_json::from_str(json).unwrap();
/// assert_eq!(page.total_count, 120);
/// assert_eq!(page.results.len(), 1);
/// ```
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    /// Total number of results across all pages.
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
    /// The results in this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

fn page_number(params: &QueryParams) -> u64 {
    params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0)
}

fn page_size(params: &QueryParams) -> u64 {
    match params.get("page-size").and_then(|p| p.parse().ok()) {
        Some(size) if size > 0 => size,
        _ => u64::from(DEFAULT_PAGE_SIZE),
    }
}

/// Seeds `page` and `page-size` defaults without disturbing caller-supplied
/// values.
fn seed_paging(query: Option<&QueryParams>) -> QueryParams {
    let mut params = query.cloned().unwrap_or_default();
    if params.get("page").is_none() {
        params.insert("page", "0");
    }
    if params.get("page-size").is_none() {
        params.insert("page-size", DEFAULT_PAGE_SIZE.to_string());
    }
    params
}

impl JamfClient {
    /// Fetches every page of a paginated listing, passing each page's raw
    /// `results` bytes to `merge_page`.
    ///
    /// `query` may carry `filter` (RSQL), `sort`, and overrides for `page`
    /// (the starting page) and `page-size`. Pagination stops when the math
    /// says the listing is exhausted: `(page + 1) * page_size >=
    /// totalCount`, or when a page comes back without results.
    ///
    /// A `merge_page` failure aborts pagination immediately and surfaces
    /// as [`ApiError::PageMerge`]. Pages merged before the failure are not
    /// rolled back; accumulators are expected to be append-only.
    ///
    /// Only available on endpoints that explicitly support pagination,
    /// e.g. `GET /api/v3/computers-inventory`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use jamfpro::api::{CallOptions, JamfClient};
    ///
    /// # async fn example(client: &JamfClient) -> Result<(), jamfpro::api::ApiError> {
    /// let mut computers: Vec<serde_json::Value> = Vec::new();
    /// client
    ///     .get_paginated(
    ///         "/api/v3/computers-inventory",
    ///         None,
    ///         &CallOptions::json(),
    ///         |page| {
    ///             computers.extend(serde_json::from_slice::<Vec<serde_json::Value>>(page)?);
    ///             Ok(())
    ///         },
    ///     )
    ///     .await?;
    /// println!("{} computers", computers.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_paginated(
        &self,
        path: &str,
        query: Option<&QueryParams>,
        opts: &CallOptions,
        mut merge_page: impl FnMut(&[u8]) -> anyhow::Result<()>,
    ) -> Result<ResponseEnvelope, ApiError> {
        let mut params = seed_paging(query);

        loop {
            let reply: Reply<RawPage> = self.get(path, Some(&params), opts).await?;
            let envelope = reply.envelope;

            let Some(page) = reply.data else {
                // Empty body: nothing to merge, nothing more to fetch.
                return Ok(envelope);
            };
            let Some(results) = page.results else {
                return Ok(envelope);
            };

            if let Err(source) = merge_page(results.get().as_bytes()) {
                return Err(ApiError::PageMerge { source, envelope });
            }

            let current = page_number(&params);
            let size = page_size(&params);
            if (current + 1) * size >= page.total_count {
                return Ok(envelope);
            }
            params.insert("page", (current + 1).to_string());
        }
    }

    /// Returns a lazy stream of decoded pages from a paginated listing.
    ///
    /// Pull-style adapter over the same paging rules as
    /// [`get_paginated`](Self::get_paginated): each item is one page's
    /// decoded `results` vector, fetched on demand as the stream is
    /// polled.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use futures::TryStreamExt;
    /// use jamfpro::api::{CallOptions, JamfClient};
    ///
    /// # async fn example(client: &JamfClient) -> Result<(), jamfpro::api::ApiError> {
    /// let opts = CallOptions::json();
    /// let mut pages = std::pin::pin!(client.pages::<serde_json::Value>(
    ///     "/api/v1/buildings",
    ///     None,
    ///     &opts,
    /// ));
    /// while let Some(page) = pages.try_next().await? {
    ///     println!("fetched {} buildings", page.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn pages<'a, T>(
        &'a self,
        path: &'a str,
        query: Option<&QueryParams>,
        opts: &'a CallOptions,
    ) -> impl Stream<Item = Result<Vec<T>, ApiError>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        let params = seed_paging(query);

        futures::stream::try_unfold((params, false), move |(mut params, done)| async move {
            if done {
                return Ok(None);
            }

            let reply: Reply<Page<T>> = self.get(path, Some(&params), opts).await?;
            let page = match reply.data {
                Some(page) => page,
                None => return Ok(None),
            };

            let current = page_number(&params);
            let size = page_size(&params);
            let exhausted =
                page.results.is_empty() || (current + 1) * size >= page.total_count;
            params.insert("page", (current + 1).to_string());

            Ok(Some((page.results, (params, exhausted))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use futures::TryStreamExt;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    async fn client_for(server: &mockito::ServerGuard) -> JamfClient {
        JamfClient::new(AuthConfig::basic(server.url(), "admin", "hunter2")).unwrap()
    }

    async fn mock_token(server: &mut mockito::ServerGuard) {
        server
            .mock("POST", "/api/v1/auth/token")
            .with_status(200)
            .with_body(r#"{"token":"tok","expires":"2099-01-01T00:00:00Z"}"#)
            .create_async()
            .await;
    }

    fn page_body(ids: &[u32], total: u32) -> String {
        let results: Vec<String> = ids.iter().map(|id| format!(r#"{{"id":{id}}}"#)).collect();
        format!(
            r#"{{"totalCount":{},"results":[{}]}}"#,
            total,
            results.join(",")
        )
    }

    async fn mock_page(
        server: &mut mockito::ServerGuard,
        page: u32,
        body: String,
    ) -> mockito::Mock {
        server
            .mock("GET", "/api/v1/things")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("page".into(), page.to_string()),
                mockito::Matcher::UrlEncoded("page-size".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_merges_every_page_then_stops() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        // 5 items, page size 2: three pages, the last one short.
        let p0 = mock_page(&mut server, 0, page_body(&[1, 2], 5)).await;
        let p1 = mock_page(&mut server, 1, page_body(&[3, 4], 5)).await;
        let p2 = mock_page(&mut server, 2, page_body(&[5], 5)).await;

        let client = client_for(&server).await;
        let query = QueryParams::new().page_size(2);
        let mut merged: Vec<Item> = Vec::new();
        let mut calls = 0;

        let envelope = client
            .get_paginated("/api/v1/things", Some(&query), &CallOptions::json(), |page| {
                calls += 1;
                merged.extend(serde_json::from_slice::<Vec<Item>>(page)?);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(merged.len(), 5);
        assert_eq!(envelope.status, 200);
        p0.assert_async().await;
        p1.assert_async().await;
        p2.assert_async().await;
    }

    #[tokio::test]
    async fn test_single_full_page_listing_stops_after_one_fetch() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let p0 = mock_page(&mut server, 0, page_body(&[1, 2], 2)).await;

        let client = client_for(&server).await;
        let query = QueryParams::new().page_size(2);
        let mut calls = 0;

        client
            .get_paginated("/api/v1/things", Some(&query), &CallOptions::json(), |_| {
                calls += 1;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(calls, 1);
        p0.assert_async().await;
    }

    #[tokio::test]
    async fn test_merge_failure_aborts_pagination() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        mock_page(&mut server, 0, page_body(&[1, 2], 5)).await;

        let client = client_for(&server).await;
        let query = QueryParams::new().page_size(2);
        let mut calls = 0;

        let err = client
            .get_paginated("/api/v1/things", Some(&query), &CallOptions::json(), |_| {
                calls += 1;
                anyhow::bail!("accumulator full")
            })
            .await
            .unwrap_err();

        assert_eq!(calls, 1);
        match err {
            ApiError::PageMerge { envelope, .. } => assert_eq!(envelope.status, 200),
            other => panic!("expected PageMerge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_mid_listing_propagates() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        mock_page(&mut server, 0, page_body(&[1, 2], 5)).await;
        server
            .mock("GET", "/api/v1/things")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let query = QueryParams::new().page_size(2);

        let err = client
            .get_paginated("/api/v1/things", Some(&query), &CallOptions::json(), |_| Ok(()))
            .await
            .unwrap_err();

        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_pages_stream_yields_each_page_lazily() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        mock_page(&mut server, 0, page_body(&[1, 2], 3)).await;
        mock_page(&mut server, 1, page_body(&[3], 3)).await;

        let client = client_for(&server).await;
        let query = QueryParams::new().page_size(2);
        let opts = CallOptions::json();

        let pages: Vec<Vec<Item>> = client
            .pages::<Item>("/api/v1/things", Some(&query), &opts)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], vec![Item { id: 1 }, Item { id: 2 }]);
        assert_eq!(pages[1], vec![Item { id: 3 }]);
    }

    #[tokio::test]
    async fn test_pages_stream_handles_empty_listing() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        mock_page(&mut server, 0, page_body(&[], 0)).await;

        let client = client_for(&server).await;
        let query = QueryParams::new().page_size(2);
        let opts = CallOptions::json();

        let pages: Vec<Vec<Item>> = client
            .pages::<Item>("/api/v1/things", Some(&query), &opts)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }
}
