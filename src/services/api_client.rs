//! Typed HTTP client for the CloudBox metadata service.
//!
//! Every operation is one request; there is no retry policy anywhere. A
//! failed call is surfaced and left to the caller (ultimately the user) to
//! re-initiate. Non-2xx responses carry a JSON envelope
//! `{ "status": "error", "message": ... }` which is mapped to
//! [`ApiError::Backend`].

use crate::models::image::ImageRecord;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Timeout for the `/health` probe only; all other calls use the client's
/// defaults.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of `POST /generate-upload-url`.
///
/// The bare form (filename + content type) only mints an upload
/// authorization; supplying `user_id` switches the service to its unified
/// flow, which also persists the metadata record in the same call.
#[derive(Debug, Clone, Serialize, Default)]
pub struct UploadUrlRequest {
    pub filename: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A minted write authorization: where to PUT the bytes, and the
/// server-chosen object name (also the future `image_id`).
#[derive(Debug, Clone, Deserialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub object_name: String,
}

/// Body of `POST /save-metadata`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveMetadataRequest {
    pub user_id: String,
    pub image_id: String,
    pub tag: String,
    pub tags: Vec<String>,
    pub description: String,
    pub content_type: String,
    /// Defaults server-side to `image_id` when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    pub original_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

/// Per-user storage aggregate from `GET /usage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUsage {
    pub user_id: String,
    pub total_bytes: i64,
    pub total_kb: f64,
    pub total_mb: f64,
    pub file_count: u64,
}

/// Result of a delete: the service removes blob and metadata
/// independently and reports a partial outcome (HTTP 207) when one side
/// fails. Retrying a partial delete is safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Partial(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct SaveMetadataResponse {
    data: ImageRecord,
}

#[derive(Debug, Deserialize)]
struct ListImagesResponse {
    #[serde(default)]
    images: Vec<ImageRecord>,
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    download_url: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /generate-upload-url` — mint a write authorization (and, in
    /// the unified flow, persist metadata).
    pub async fn generate_upload_url(
        &self,
        request: &UploadUrlRequest,
    ) -> ApiResult<UploadUrlResponse> {
        let response = self
            .http
            .post(self.url("/generate-upload-url"))
            .json(request)
            .send()
            .await?;
        expect_json(response).await
    }

    /// PUT the content bytes directly to the blob store using a minted
    /// upload URL.
    pub async fn put_object(
        &self,
        upload_url: &str,
        content_type: &str,
        body: Bytes,
    ) -> ApiResult<()> {
        let response = self
            .http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(take_error(response).await)
        }
    }

    /// `POST /save-metadata` — persist the descriptive record for an
    /// already-transmitted object.
    pub async fn save_metadata(&self, request: &SaveMetadataRequest) -> ApiResult<ImageRecord> {
        let response = self
            .http
            .post(self.url("/save-metadata"))
            .json(request)
            .send()
            .await?;
        let saved: SaveMetadataResponse = expect_json(response).await?;
        Ok(saved.data)
    }

    /// `GET /images?user_id=&tag=` — list records owned by `user_id`.
    pub async fn list_images(
        &self,
        user_id: &str,
        tag: Option<&str>,
    ) -> ApiResult<Vec<ImageRecord>> {
        let mut query: Vec<(&str, &str)> = vec![("user_id", user_id)];
        if let Some(tag) = tag {
            query.push(("tag", tag));
        }
        let response = self
            .http
            .get(self.url("/images"))
            .query(&query)
            .send()
            .await?;
        let listed: ListImagesResponse = expect_json(response).await?;
        Ok(listed.images)
    }

    /// `GET /generate-download-url?id=` — mint a short-lived read URL for
    /// one record.
    pub async fn generate_download_url(&self, image_id: &str) -> ApiResult<String> {
        let response = self
            .http
            .get(self.url("/generate-download-url"))
            .query(&[("id", image_id)])
            .send()
            .await?;
        let resolved: DownloadUrlResponse = expect_json(response).await?;
        Ok(resolved.download_url)
    }

    /// `DELETE /delete?id=&user_id=` — remove blob and metadata.
    pub async fn delete_image(&self, user_id: &str, image_id: &str) -> ApiResult<DeleteOutcome> {
        let response = self
            .http
            .delete(self.url("/delete"))
            .query(&[("id", image_id), ("user_id", user_id)])
            .send()
            .await?;
        if response.status() == StatusCode::MULTI_STATUS {
            let partial: DeleteResponse = response.json().await?;
            return Ok(DeleteOutcome::Partial(partial.errors));
        }
        if response.status().is_success() {
            Ok(DeleteOutcome::Deleted)
        } else {
            Err(take_error(response).await)
        }
    }

    /// `GET /usage?user_id=` — per-user storage totals.
    pub async fn storage_usage(&self, user_id: &str) -> ApiResult<StorageUsage> {
        let response = self
            .http
            .get(self.url("/usage"))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        expect_json(response).await
    }

    /// `GET /health` — liveness probe with its own 2-second timeout.
    pub async fn health(&self) -> ApiResult<()> {
        let response = self
            .http
            .get(self.url("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(take_error(response).await)
        }
    }
}

async fn expect_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    if response.status().is_success() {
        Ok(response.json::<T>().await?)
    } else {
        Err(take_error(response).await)
    }
}

/// Decode the service's error envelope, falling back to a generic message
/// when the body is not the expected shape.
async fn take_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) if !body.message.is_empty() => body.message,
        _ => "unexpected backend response".to_string(),
    };
    ApiError::Backend { status, message }
}
