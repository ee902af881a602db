//
//  jamfpro
//  services/icons.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Icons (Jamf Pro API)
//!
//! Icon upload and download. Uploads stream the image through a multipart
//! request with optional progress reporting; downloads return the raw
//! image bytes untouched.
//!
//! Jamf Pro API docs:
//! <https://developer.jamf.com/jamf-pro/reference/post_v1-icon>

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tokio::io::AsyncRead;

use crate::api::{
    ApiError, CallOptions, JamfClient, MultipartProgressCallback, QueryParams, Reply,
    ResponseEnvelope,
};

const ENDPOINT: &str = "/api/v1/icon";
const DOWNLOAD_ENDPOINT: &str = "/api/v1/icon/download";

/// Icon metadata returned by upload and lookup operations.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Icon {
    pub id: u32,
    pub name: String,
    pub url: String,
}

/// Handles communication with the icon-related Jamf Pro API endpoints.
pub struct IconsService {
    client: Arc<JamfClient>,
    opts: CallOptions,
}

impl IconsService {
    /// Returns a new icons service backed by the provided client.
    pub fn new(client: Arc<JamfClient>) -> Self {
        Self {
            client,
            opts: CallOptions::json(),
        }
    }

    /// Returns icon metadata by ID.
    ///
    /// URL: `GET /api/v1/icon/{id}`
    pub async fn get_by_id(&self, id: u32) -> Result<Reply<Icon>, ApiError> {
        self.client
            .get(&format!("{ENDPOINT}/{id}"), None, &self.opts)
            .await
    }

    /// Uploads an icon image, streaming `source` through a multipart
    /// request (form field `file`). `progress`, when supplied, receives
    /// `(cumulative_bytes_sent, file_size)` as the upload proceeds.
    ///
    /// URL: `POST /api/v1/icon`
    pub async fn upload<R>(
        &self,
        source: R,
        file_size: u64,
        file_name: &str,
        progress: Option<MultipartProgressCallback>,
    ) -> Result<Reply<Icon>, ApiError>
    where
        R: AsyncRead + Send + 'static,
    {
        let file_name = if file_name.is_empty() {
            "icon.png"
        } else {
            file_name
        };
        self.client
            .post_multipart(
                ENDPOINT,
                "file",
                file_name,
                source,
                file_size,
                &[],
                progress,
                &self.opts,
            )
            .await
    }

    /// Opens the file at `path` and uploads it via
    /// [`upload`](Self::upload).
    pub async fn upload_from_file(
        &self,
        path: impl AsRef<Path>,
        progress: Option<MultipartProgressCallback>,
    ) -> Result<Reply<Icon>, ApiError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ApiError::Configuration(format!("open icon file {}: {e}", path.display())))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| ApiError::Configuration(format!("stat icon file {}: {e}", path.display())))?
            .len();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("icon.png")
            .to_string();

        self.upload(file, size, &file_name, progress).await
    }

    /// Downloads the icon image bytes. `res` selects the resolution
    /// (`original`, `300`, or `512`; defaults to `original`); a non-zero
    /// `scale` asks the server to scale the image to 300.
    ///
    /// The bytes are in the returned envelope's `body`.
    ///
    /// URL: `GET /api/v1/icon/download/{id}?res=...&scale=...`
    pub async fn download(
        &self,
        id: u32,
        res: Option<&str>,
        scale: Option<&str>,
    ) -> Result<ResponseEnvelope, ApiError> {
        let query = QueryParams::new()
            .set("res", res.unwrap_or("original"))
            .set("scale", scale.unwrap_or("0"));
        let opts = self.opts.clone().with_header("Accept", "image/*");

        self.client
            .get_bytes(&format!("{DOWNLOAD_ENDPOINT}/{id}"), Some(&query), &opts)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use std::io::Write;
    use std::sync::Mutex;

    async fn service_for(server: &mockito::ServerGuard) -> IconsService {
        let client =
            Arc::new(JamfClient::new(AuthConfig::oauth2(server.url(), "cid", "secret")).unwrap());
        IconsService::new(client)
    }

    async fn mock_token(server: &mut mockito::ServerGuard) {
        server
            .mock("POST", "/api/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":1200}"#)
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn test_upload_from_file_streams_and_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("POST", "/api/v1/icon")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("^multipart/form-data".to_string()),
            )
            .with_status(201)
            .with_body(r#"{"id":3,"name":"icon.png","url":"https://cdn/icon.png"}"#)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![9u8; 64 * 1024]).unwrap();
        file.flush().unwrap();

        let observed: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);

        let service = service_for(&server).await;
        let icon = service
            .upload_from_file(
                file.path(),
                Some(Arc::new(move |sent, _total| {
                    sink.lock().unwrap().push(sent);
                })),
            )
            .await
            .unwrap()
            .data
            .unwrap();

        assert_eq!(icon.id, 3);
        let counts = observed.lock().unwrap();
        assert_eq!(*counts.last().unwrap(), 64 * 1024);
    }

    #[tokio::test]
    async fn test_download_returns_raw_bytes() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        let png = [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
        server
            .mock("GET", "/api/v1/icon/download/3")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("res".into(), "original".into()),
                mockito::Matcher::UrlEncoded("scale".into(), "0".into()),
            ]))
            .match_header("accept", "image/*")
            .with_status(200)
            .with_header("Content-Type", "image/png")
            .with_body(png.to_vec())
            .create_async()
            .await;

        let service = service_for(&server).await;
        let envelope = service.download(3, None, None).await.unwrap();

        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.body, png);
    }

    #[tokio::test]
    async fn test_upload_from_missing_file_is_configuration_error() {
        let server = mockito::Server::new_async().await;
        let service = service_for(&server).await;
        let err = service
            .upload_from_file("/nonexistent/icon.png", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }
}
