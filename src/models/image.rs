//! Represents one uploaded image as described by the metadata service.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used wherever a record carries no primary tag.
pub const UNTAGGED: &str = "uncategorized";

/// Metadata describing a single uploaded file.
///
/// This is the only persistent entity in CloudBox. Records are owned by
/// exactly one user, created when an upload completes, and deleted by
/// explicit user action; the content bytes themselves live in the blob
/// store and are reached through short-lived download URLs.
///
/// Field names follow the service's wire format. Everything except the two
/// identifiers is defaulted so older records with sparse attributes still
/// deserialize.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageRecord {
    /// Server-generated identifier. ISO-timestamp prefixed, so ids sort
    /// chronologically and support range queries.
    pub image_id: String,

    /// Identifier of the owning user.
    pub user_id: String,

    /// Key of the content bytes in the blob store. Defaults to `image_id`.
    #[serde(default)]
    pub s3_key: String,

    /// Filename as it was uploaded.
    #[serde(default)]
    pub original_filename: String,

    /// MIME type reported at upload time.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Size in bytes, when the uploader reported one.
    #[serde(default)]
    pub file_size: Option<i64>,

    /// Primary tag, used for grouping and indexing.
    #[serde(default)]
    pub tag: Option<String>,

    /// Full tag list (may repeat the primary tag, may be empty).
    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Upload timestamp as an ISO-8601 string. The service emits naive
    /// UTC timestamps, so the raw string is kept and parsed leniently.
    #[serde(default)]
    pub upload_time: Option<String>,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl ImageRecord {
    /// Upload instant for ordering purposes. Missing or unparseable
    /// timestamps sort as epoch zero.
    pub fn upload_timestamp(&self) -> DateTime<Utc> {
        self.upload_time
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Primary tag, or [`UNTAGGED`] when the record has none.
    pub fn primary_tag(&self) -> &str {
        match self.tag.as_deref() {
            Some(tag) if !tag.is_empty() => tag,
            _ => UNTAGGED,
        }
    }
}

/// Accepts RFC 3339 as well as the service's zone-less
/// `2024-03-01T12:00:00.000000` form.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
