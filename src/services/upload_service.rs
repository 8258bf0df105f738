//! Batch upload orchestration: authorize → transmit → persist, one file at
//! a time.
//!
//! Files are processed strictly sequentially: each file's full three-step
//! sequence completes (or fails) before the next begins, and there is no
//! cancellation once a batch starts. One file's failure never aborts the
//! rest; the batch ends with a per-file report and tally.

use crate::models::image::UNTAGGED;
use crate::services::api_client::{ApiClient, ApiResult, SaveMetadataRequest, UploadUrlRequest};
use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

/// One local file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A file that made it through all three steps.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    /// Server-assigned object name; doubles as the record's `image_id`.
    pub object_name: String,
}

/// A file that failed at any step, with the error it failed on.
#[derive(Debug, Clone)]
pub struct FailedUpload {
    pub filename: String,
    pub error: String,
}

/// Per-batch outcome report.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<UploadedImage>,
    pub failed: Vec<FailedUpload>,
}

impl BatchReport {
    /// `(succeeded, failed)` counts.
    pub fn tally(&self) -> (usize, usize) {
        (self.succeeded.len(), self.failed.len())
    }
}

pub struct UploadService {
    client: ApiClient,
}

impl UploadService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload a batch of files for `user_id`, tagging each with `tags`
    /// (first tag becomes the primary; untagged uploads fall back to
    /// [`UNTAGGED`]).
    pub async fn upload_batch(
        &self,
        user_id: &str,
        tags: &[String],
        sources: Vec<UploadSource>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for source in sources {
            let filename = source.filename.clone();
            match self.upload_one(user_id, tags, source).await {
                Ok(object_name) => {
                    info!("uploaded {} as {}", filename, object_name);
                    report.succeeded.push(UploadedImage { filename, object_name });
                }
                Err(err) => {
                    warn!("upload of {} failed: {}", filename, err);
                    report.failed.push(FailedUpload { filename, error: err.to_string() });
                }
            }
        }

        let (ok, failed) = report.tally();
        info!("upload batch finished: {} succeeded, {} failed", ok, failed);
        report
    }

    async fn upload_one(
        &self,
        user_id: &str,
        tags: &[String],
        source: UploadSource,
    ) -> ApiResult<String> {
        let file_size = Some(source.bytes.len() as i64);

        let authorization = self
            .client
            .generate_upload_url(&UploadUrlRequest {
                filename: source.filename.clone(),
                content_type: source.content_type.clone(),
                file_size,
                ..Default::default()
            })
            .await?;

        self.client
            .put_object(&authorization.upload_url, &source.content_type, source.bytes)
            .await?;

        let primary_tag = tags
            .first()
            .cloned()
            .unwrap_or_else(|| UNTAGGED.to_string());
        self.client
            .save_metadata(&SaveMetadataRequest {
                user_id: user_id.to_string(),
                image_id: authorization.object_name.clone(),
                tag: primary_tag,
                tags: tags.to_vec(),
                description: format!("Uploaded via CloudBox on {}", Utc::now().format("%Y-%m-%d")),
                content_type: source.content_type,
                s3_key: None,
                original_filename: source.filename,
                file_size,
            })
            .await?;

        Ok(authorization.object_name)
    }
}
