use axum::extract::{Extension, Path, Query};
use http::StatusCode;
use std::sync::Arc;

use super::{error::ApiError, UserQuery};
use crate::filesystem::file_store::{DeleteOutcome, FileStore, FileStoreError};

/// `DELETE /:file_id?userId=...` removes one stored file.
pub async fn delete_handler(
    Extension(file_store): Extension<Arc<dyn FileStore>>,
    Path(file_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("Started removing file {}", file_id);

    let failure = format!("Could not remove file {file_id}");

    match file_store.delete(&query.user_id, &file_id).await {
        Ok(DeleteOutcome::Deleted) => Ok(StatusCode::OK),
        Ok(DeleteOutcome::NotFound) => Err(ApiError::not_found(failure)),
        Err(e @ FileStoreError::InvalidName(_)) => Err(ApiError::bad_request(e)),
        Err(e) => {
            tracing::warn!("{}: {}", failure, e);
            Err(ApiError::bad_request(failure))
        }
    }
}
