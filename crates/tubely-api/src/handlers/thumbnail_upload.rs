use crate::auth::models::UserContext;
use crate::constants::THUMBNAIL_FIELD;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_video_id;
use crate::state::AppState;
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tubely_core::constants::SUPPORTED_THUMBNAIL_CONTENT_TYPES;
use tubely_core::{AppError, Video};
use tubely_processing::normalize_content_type;
use uuid::Uuid;

/// Read a multipart field into memory, refusing anything above `limit` bytes.
async fn read_limited(mut field: Field<'_>, limit: u64) -> Result<Vec<u8>, HttpAppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if (data.len() + chunk.len()) as u64 > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Thumbnail exceeds the {} byte limit",
                limit
            ))
            .into());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail attached to the record", body = Video),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a JPEG or PNG image", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %user.user_id, video_id = %video_id, operation = "upload_thumbnail")
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    state
        .pipeline
        .load_owned_record(user.user_id, video_id)
        .await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = normalize_content_type(field.content_type().unwrap_or_default());
        if !SUPPORTED_THUMBNAIL_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::UnsupportedMediaType(content_type).into());
        }

        let data = read_limited(field, state.limits.max_thumbnail_size_bytes).await?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Thumbnail is empty".to_string()).into());
        }

        let video = state
            .videos
            .set_thumbnail_url(video_id, &data_url(&content_type, &data))
            .await?;

        tracing::info!(
            content_type = %content_type,
            size_bytes = data.len(),
            "Thumbnail stored"
        );

        return Ok(Json(video));
    }

    Err(AppError::BadRequest(format!("Missing multipart field '{}'", THUMBNAIL_FIELD)).into())
}
