//! Product image upload handler.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::services::uploads::{FIELD_NAME, UploadError, UploadedFile, check_count};
use crate::state::AppState;

/// Largest accepted upload body.
pub const UPLOAD_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Store up to ten images sent in the `product` field.
///
/// POST /upload
///
/// Other multipart fields are ignored. A body that is not multipart counts
/// as an upload with no files.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let Ok(mut multipart) = multipart else {
        return Err(UploadError::NoFiles.into());
    };

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.body_text()))?
    {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        check_count(files.len() + 1)?;

        let original_name = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadError::Multipart(e.body_text()))?;
        files.push(UploadedFile {
            original_name,
            data,
        });
    }

    let image_urls = state.images().save(files).await?;

    Ok(Json(json!({ "success": 1, "image_urls": image_urls })))
}
