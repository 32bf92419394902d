use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::storage::StorageClient;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const PRESIGN_TTL_SECS: u64 = 30 * 60;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Pulls the first multipart field named `field` and checks it is a supported image.
pub async fn read_image_field(mp: &mut Multipart, field: &str) -> AppResult<UploadItem> {
    while let Some(part) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("invalid multipart body: {e}")))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let content_type = part
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        if ext_from_mime(&content_type).is_none() {
            return Err(AppError::validation(format!(
                "unsupported image type: {content_type}"
            )));
        }
        let body = part
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("invalid multipart body: {e}")))?;
        if body.is_empty() {
            return Err(AppError::validation(format!("{field} is empty")));
        }
        return Ok(UploadItem { body, content_type });
    }
    Err(AppError::validation(format!("{field} is required")))
}

/// Uploads under `<folder>/<user_id>/<uuid>.<ext>` and returns the key.
pub async fn store_image(
    storage: &dyn StorageClient,
    folder: &str,
    user_id: Uuid,
    item: UploadItem,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
    let key = format!("{}/{}/{}.{}", folder, user_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Best effort: a failed presign drops the URL instead of failing the response.
pub async fn presign_optional(storage: &dyn StorageClient, key: Option<&str>) -> Option<String> {
    let key = key?;
    match storage.presign_get(key, PRESIGN_TTL_SECS).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, %key, "presign failed");
            None
        }
    }
}

/// Removes a replaced or orphaned object; failures are only logged.
pub async fn discard(storage: &dyn StorageClient, key: Option<&str>) {
    if let Some(key) = key {
        if let Err(e) = storage.delete_object(key).await {
            warn!(error = %e, %key, "delete_object failed");
        }
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
