//! In-process double of the CloudBox metadata service and blob store.
//!
//! Speaks the same wire shapes as the real service: presigned-style
//! upload/download URLs pointing back at its own `/blob/{name}` routes,
//! the `{status, message}` error envelope, and the unified upload flow.
//! Filenames prefixed `fail-` and image ids prefixed `stuck-` are test
//! hooks for authorization failures and partial deletes.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Json;
use chrono::Utc;
use cloudbox::models::image::ImageRecord;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
pub struct MockState {
    pub base_url: String,
    pub records: Vec<ImageRecord>,
    pub blobs: HashMap<String, Vec<u8>>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockApi {
    pub base_url: String,
    pub state: Shared,
}

impl MockApi {
    /// Insert a bare record with no backing blob, so its download URL can
    /// never be minted.
    pub fn seed_record(&self, user_id: &str, image_id: &str, filename: &str) {
        self.state.lock().unwrap().records.push(ImageRecord {
            image_id: image_id.into(),
            user_id: user_id.into(),
            s3_key: image_id.into(),
            original_filename: filename.into(),
            content_type: "image/jpeg".into(),
            file_size: None,
            tag: None,
            tags: Vec::new(),
            description: String::new(),
            upload_time: Some(now_iso()),
        });
    }
}

/// Bind to an ephemeral port and serve the double until the test ends.
pub async fn spawn() -> MockApi {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/generate-upload-url", post(generate_upload_url))
        .route("/save-metadata", post(save_metadata))
        .route("/images", get(list_images))
        .route("/generate-download-url", get(generate_download_url))
        .route("/delete", delete(delete_image))
        .route("/usage", get(usage))
        .route("/health", get(health))
        .route("/blob/{name}", put(put_blob).get(get_blob))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    state.lock().unwrap().base_url = base_url.clone();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockApi { base_url, state }
}

fn now_iso() -> String {
    // The real service emits zone-less UTC timestamps.
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

async fn generate_upload_url(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let filename = body["filename"].as_str().unwrap_or_default().to_string();
    if filename.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Missing filename");
    }
    if filename.starts_with("fail-") {
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate upload URL",
        );
    }

    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.6f");
    let object_name = format!("{}_{}-{}", stamp, Uuid::new_v4(), filename);

    let mut state = state.lock().unwrap();
    if let Some(user_id) = body["user_id"].as_str() {
        // Unified flow: metadata is persisted in the same call.
        let tags: Vec<String> = body["tags"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let primary = tags
            .first()
            .cloned()
            .or_else(|| body["tag"].as_str().map(str::to_string))
            .unwrap_or_else(|| "uncategorized".into());
        state.records.push(ImageRecord {
            image_id: object_name.clone(),
            user_id: user_id.into(),
            s3_key: object_name.clone(),
            original_filename: filename.clone(),
            content_type: body["content_type"]
                .as_str()
                .unwrap_or("application/octet-stream")
                .into(),
            file_size: body["file_size"].as_i64(),
            tag: Some(primary),
            tags,
            description: body["description"].as_str().unwrap_or_default().into(),
            upload_time: Some(now_iso()),
        });
    }

    let upload_url = format!("{}/blob/{}", state.base_url, object_name);
    Json(json!({ "upload_url": upload_url, "object_name": object_name })).into_response()
}

async fn save_metadata(State(state): State<Shared>, Json(mut record): Json<ImageRecord>) -> Response {
    if record.user_id.is_empty() || record.image_id.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Missing required fields");
    }
    if record.s3_key.is_empty() {
        record.s3_key = record.image_id.clone();
    }
    if record.upload_time.is_none() {
        record.upload_time = Some(now_iso());
    }
    state.lock().unwrap().records.push(record.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": record })),
    )
        .into_response()
}

async fn list_images(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock().unwrap();
    let user_id = params.get("user_id").cloned().unwrap_or_default();
    let tag = params.get("tag");
    let images: Vec<&ImageRecord> = state
        .records
        .iter()
        .filter(|record| record.user_id == user_id)
        .filter(|record| {
            tag.is_none_or(|t| {
                record.tag.as_deref() == Some(t.as_str()) || record.tags.iter().any(|x| x == t)
            })
        })
        .collect();
    Json(json!({ "images": images })).into_response()
}

async fn generate_download_url(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(id) = params.get("id") else {
        return error_body(StatusCode::BAD_REQUEST, "Missing image id");
    };
    let state = state.lock().unwrap();
    if !state.blobs.contains_key(id) {
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate download URL",
        );
    }
    Json(json!({ "download_url": format!("{}/blob/{}", state.base_url, id) })).into_response()
}

async fn delete_image(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (Some(id), Some(user_id)) = (params.get("id"), params.get("user_id")) else {
        return error_body(StatusCode::BAD_REQUEST, "Missing id or user_id");
    };
    if id.starts_with("stuck-") {
        return (
            StatusCode::MULTI_STATUS,
            Json(json!({ "status": "partial_success", "errors": ["S3 delete failed"] })),
        )
            .into_response();
    }
    let mut state = state.lock().unwrap();
    state
        .records
        .retain(|record| !(record.user_id == *user_id && record.image_id == *id));
    state.blobs.remove(id);
    Json(json!({ "status": "deleted", "id": id })).into_response()
}

async fn usage(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(user_id) = params.get("user_id") else {
        return error_body(StatusCode::BAD_REQUEST, "Missing user_id");
    };
    let state = state.lock().unwrap();
    let mine: Vec<&ImageRecord> = state
        .records
        .iter()
        .filter(|record| record.user_id == *user_id)
        .collect();
    let total_bytes: i64 = mine.iter().map(|record| record.file_size.unwrap_or(0)).sum();
    Json(json!({
        "user_id": user_id,
        "total_bytes": total_bytes,
        "total_kb": (total_bytes as f64 / 1024.0 * 100.0).round() / 100.0,
        "total_mb": (total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        "file_count": mine.len(),
    }))
    .into_response()
}

async fn health() -> Response {
    Json(json!({ "status": "healthy" })).into_response()
}

async fn put_blob(State(state): State<Shared>, Path(name): Path<String>, body: Bytes) -> StatusCode {
    state.lock().unwrap().blobs.insert(name, body.to_vec());
    StatusCode::OK
}

async fn get_blob(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    match state.lock().unwrap().blobs.get(&name) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
