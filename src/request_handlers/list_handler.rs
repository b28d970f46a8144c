use axum::{
    extract::{Extension, Query},
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;

use super::{error::ApiError, UserQuery};
use crate::filesystem::file_store::{FileRecord, FileStore};

/// `GET /?userId=...` lists every file stored for the user, in no particular order.
pub async fn list_handler(
    Extension(file_store): Extension<Arc<dyn FileStore>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<FileRecord>>, ApiError> {
    let records: Vec<FileRecord> = file_store.list(&query.user_id).await?.try_collect().await?;

    Ok(Json(records))
}
