use axum::{
    extract::{multipart::Field, Extension, Multipart},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use std::{io, sync::Arc};

use super::{error::ApiError, FILE_PART, USER_ID_PART};
use crate::filesystem::{
    file_store::{FileRecord, FileStore, StagedUpload},
    metadata::UploadMetadata,
};

/// `POST /` with a multipart body holding a `file` part and a `userid` part.
///
/// The file part is streamed straight to a staging file as it arrives, so the
/// parts may come in either order. Once the whole body has been read the
/// staged file is moved into the user's directory. Every failure is reported
/// as a `400`.
pub async fn upload_handler(
    Extension(file_store): Extension<Arc<dyn FileStore>>,
    mut multipart: Multipart,
) -> Result<Json<FileRecord>, ApiError> {
    tracing::info!("Started file upload");

    let mut user_id: Option<String> = None;
    let mut staged: Option<StagedUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request(e)
    })? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            USER_ID_PART if user_id.is_none() => {
                let text = field.text().await.map_err(|e| {
                    tracing::warn!("Failed to read user id: {}", e);
                    ApiError::bad_request(e)
                })?;
                user_id = Some(text);
            }
            FILE_PART if staged.is_none() => {
                let metadata = part_metadata(&field);
                let data = field
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
                    .boxed();

                let upload = file_store.stage(metadata, data).await.map_err(|e| {
                    tracing::warn!("Failed to stage upload: {}", e);
                    ApiError::bad_request(e)
                })?;
                staged = Some(upload);
            }
            _ => {}
        }
    }

    let user_id = user_id
        .ok_or_else(|| ApiError::bad_request(format!("missing multipart part `{USER_ID_PART}`")))?;
    let staged =
        staged.ok_or_else(|| ApiError::bad_request(format!("missing multipart part `{FILE_PART}`")))?;

    let record = file_store.commit(staged, &user_id).await.map_err(|e| {
        tracing::warn!("Failed to store upload for {}: {}", user_id, e);
        ApiError::bad_request(e)
    })?;

    tracing::info!("Stored file {} for user {}", record.file_name(), user_id);
    Ok(Json(record))
}

fn part_metadata(field: &Field<'_>) -> UploadMetadata {
    let mut metadata = UploadMetadata::new();

    if let Some(content_type) = field.content_type() {
        metadata = metadata.with_content_type(content_type);
    }

    if let Some(file_name) = field.file_name() {
        metadata = metadata.with_file_name(file_name);
    }

    metadata
}
