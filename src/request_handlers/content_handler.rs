use axum::{
    body::StreamBody,
    extract::{Extension, Path, Query},
    response::IntoResponse,
};
use http::header;
use std::sync::Arc;

use super::{error::ApiError, UserQuery};
use crate::filesystem::file_store::FileStore;

/// `GET /:file_id?userId=...` streams the stored bytes back unchanged.
///
/// The file is opened before the response starts, so a missing file is a `404`
/// rather than a truncated body.
pub async fn content_handler(
    Extension(file_store): Extension<Arc<dyn FileStore>>,
    Path(file_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let content = file_store.read(&query.user_id, &file_id).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        StreamBody::new(content),
    ))
}
