use axum::{extract::{Multipart, State}, Extension};
use tracing::info;

use service::errors::ServiceError;
use service::uploads::{ImageUpload, StoredImage};

use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::routes::{ok, ApiResult};
use crate::state::ServerState;

/// Reads the `file` part; other parts are skipped.
async fn read_file_part(mut multipart: Multipart) -> Result<Option<ImageUpload>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() }));
    }
    Ok(None)
}

#[utoipa::path(post, path = "/api/uploads/image", tag = "uploads", responses((status = 200, description = "Stored image url"), (status = 400, description = "Missing or invalid file"), (status = 502, description = "Provider failure"), (status = 503, description = "Storage not configured")))]
pub async fn image(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<StoredImage> {
    let Some(upload) = read_file_part(multipart).await? else {
        return Err(ApiError::bad_request("File is required"));
    };
    let size = upload.bytes.len();
    let stored = state.images.upload(upload).await.map_err(ServiceError::from)?;
    info!(user_id = %ctx.user_id, size, public_id = %stored.public_id, "image_upload_completed");
    ok("Image uploaded successfully", stored)
}
