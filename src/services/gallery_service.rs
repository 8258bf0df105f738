//! Gallery data flow: list a user's records, resolve their display URLs
//! in one batched step, and delete on request.

use crate::models::image::ImageRecord;
use crate::services::api_client::{ApiClient, ApiResult, DeleteOutcome};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::warn;

pub struct GalleryService {
    client: ApiClient,
}

impl GalleryService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the records owned by `user_id`, optionally narrowed to one
    /// tag server-side.
    pub async fn list(&self, user_id: &str, tag: Option<&str>) -> ApiResult<Vec<ImageRecord>> {
        self.client.list_images(user_id, tag).await
    }

    /// Resolve short-lived display URLs for a set of records in one
    /// concurrent batch, returning an `image_id → url` map.
    ///
    /// A record whose resolution fails is logged and left out of the map:
    /// its tile degrades to a placeholder while the rest of the gallery
    /// renders normally.
    pub async fn resolve_display_urls(
        &self,
        records: &[ImageRecord],
    ) -> HashMap<String, String> {
        let lookups = records.iter().map(|record| {
            let client = self.client.clone();
            let image_id = record.image_id.clone();
            async move {
                let resolved = client.generate_download_url(&image_id).await;
                (image_id, resolved)
            }
        });

        let mut urls = HashMap::new();
        for (image_id, resolved) in join_all(lookups).await {
            match resolved {
                Ok(url) => {
                    urls.insert(image_id, url);
                }
                Err(err) => warn!("could not resolve display URL for {}: {}", image_id, err),
            }
        }
        urls
    }

    /// Delete one record. Partial outcomes (blob or metadata failed
    /// independently) are surfaced, not hidden; retrying is safe.
    pub async fn delete(&self, user_id: &str, image_id: &str) -> ApiResult<DeleteOutcome> {
        self.client.delete_image(user_id, image_id).await
    }
}

/// Rename a record in an in-memory snapshot only. The change is purely
/// cosmetic: nothing is persisted and a refetch restores the original
/// name. Returns whether the id was found.
pub fn rename_local(records: &mut [ImageRecord], image_id: &str, new_name: &str) -> bool {
    match records.iter_mut().find(|record| record.image_id == image_id) {
        Some(record) => {
            record.original_filename = new_name.to_string();
            true
        }
        None => false,
    }
}
