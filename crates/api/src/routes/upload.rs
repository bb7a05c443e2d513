//! Image upload.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    routing::post,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::{ApiError, ApiResult, bad_request};
use folio_core::storage::{MAX_IMAGE_BYTES, StorageKind, StoredAsset, UploadResult};
use folio_shared::AppError;

const FIELD_NAME: &str = "image";

/// Room for multipart framing on top of the largest accepted image.
#[allow(clippy::cast_possible_truncation)]
const BODY_LIMIT: usize = MAX_IMAGE_BYTES as usize + 1024 * 1024;

/// Creates the upload router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// Upload response; the shape depends on where the image went.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UploadResponse {
    /// Stored as an object.
    #[serde(rename_all = "camelCase")]
    Object {
        /// Public object URL.
        url: String,
        /// Object name.
        filename: String,
        /// Bucket name.
        bucket: String,
    },
    /// Embedded as a data URL.
    #[serde(rename_all = "camelCase")]
    Inline {
        /// Data URL.
        url: String,
        /// MIME type.
        mime_type: String,
        /// Size in bytes.
        size: u64,
        /// Always `base64`.
        storage: &'static str,
    },
}

impl From<UploadResult> for UploadResponse {
    fn from(result: UploadResult) -> Self {
        match result.storage_kind {
            StorageKind::ObjectStore => Self::Object {
                url: result.url,
                filename: result.object_name.unwrap_or_default(),
                bucket: result.bucket.unwrap_or_default(),
            },
            StorageKind::Inline => Self::Inline {
                url: result.url,
                mime_type: result.mime_type,
                size: result.size_bytes,
                storage: "base64",
            },
        }
    }
}

fn multipart_error(err: &MultipartError) -> ApiError {
    warn!(error = %err, "malformed multipart upload");
    if err.status().as_u16() == 413 {
        return bad_request("Image size must be less than 5MB");
    }
    bad_request(err.body_text())
}

/// POST /upload
async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }

        let filename = field.file_name().map(ToString::to_string);
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        debug!(?filename, %mime_type, size = bytes.len(), "image received");

        let mut asset = StoredAsset::new(bytes, mime_type);
        if let Some(name) = filename {
            asset = asset.with_filename(name);
        }

        let result = state.storage.store(asset).await.map_err(AppError::from)?;
        return Ok(Json(result.into()));
    }

    Err(bad_request("No file uploaded"))
}
