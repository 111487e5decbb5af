use axum::{Json, extract::State};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{ApiResponse, PresignedUrlRequest, PresignedUrlResponse, UploadPurpose},
    storage::{MAX_UPLOAD_BYTES, sanitize_key},
};

/// get_presigned_url
///
/// [Authenticated Route] Issues a short-lived URL for uploading an image straight to the
/// bucket. Only `image/*` types up to 3 MB are accepted, and book covers can only be uploaded by admins.
/// The returned `resourceKey` is what book and profile updates expect.
#[utoipa::path(
    post,
    path = "/api/v1/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Upload URL", body = PresignedUrlResponse),
        (status = 400, description = "Not an image, or larger than 3 MB"),
        (status = 403, description = "Book images are admin-only")
    )
)]
pub async fn get_presigned_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<ApiResponse<PresignedUrlResponse>>, ApiError> {
    let file_type = payload.file_type.trim().to_ascii_lowercase();
    let Some(subtype) = file_type
        .strip_prefix("image/")
        .filter(|s| !s.is_empty())
    else {
        return Err(ApiError::BadRequest("Only image uploads are allowed".to_string()));
    };
    if payload.file_size == 0 || payload.file_size > MAX_UPLOAD_BYTES {
        return Err(ApiError::BadRequest(
            "Image must be between 1 byte and 3 MB".to_string(),
        ));
    }

    if payload.purpose == UploadPurpose::BookImage && !auth_user.is_admin() {
        return Err(ApiError::Forbidden(
            "Access denied. Admins only.".to_string(),
        ));
    }

    let object_key = object_key(payload.purpose, &payload.filename, subtype);

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &file_type, payload.file_size)
        .await?;

    tracing::debug!("Presigned {} for user {}", object_key, auth_user.id);

    Ok(Json(ApiResponse::data(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    })))
}

/// object_key
///
/// `<purpose>/<unix-millis>_<uuid>.<ext>`. The extension comes from the filename when it is
/// plain alphanumeric, otherwise from the MIME subtype.
pub fn object_key(purpose: UploadPurpose, filename: &str, mime_subtype: &str) -> String {
    let from_filename = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let extension = match from_filename {
        Some(ext) => ext.to_ascii_lowercase(),
        None => mime_subtype
            .split(['+', ';'])
            .next()
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("img")
            .to_string(),
    };

    sanitize_key(&format!(
        "{}/{}_{}.{}",
        purpose.prefix(),
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        extension
    ))
}
