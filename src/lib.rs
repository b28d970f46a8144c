pub mod config;
mod filesystem;
pub mod logging;
mod request_handlers;

pub use filesystem::file_id::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use filesystem::file_store::{
    validate_name, ByteStream, DeleteOutcome, FileRecord, FileStore, FileStoreError,
    LocalFileStore, RecordStream, StagedUpload, STAGING_DIR,
};
pub use filesystem::metadata::UploadMetadata;
pub use request_handlers::error::{ApiError, ErrorCode, BAD_STATUS_PREFIX};
pub use request_handlers::{FILE_PART, USER_ID_PART};

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::ServerConfig;
use request_handlers::{
    content_handler::content_handler, delete_handler::delete_handler,
    list_handler::list_handler, upload_handler::upload_handler,
};

/// Mount the file routes on `app`, served from `file_store`.
///
/// | Method | Path | |
/// |---|---|---|
/// | `POST` | `/` | multipart upload (`file`, `userid`) |
/// | `GET` | `/?userId=` | list a user's files |
/// | `GET` | `/:file_id?userId=` | file content |
/// | `DELETE` | `/:file_id?userId=` | remove a file |
pub fn setup_file_routes<T>(app: Router, file_store: T) -> Router
where
    T: FileStore + 'static,
{
    let file_store: Arc<dyn FileStore> = Arc::new(file_store);

    app.route("/", post(upload_handler).get(list_handler))
        .route("/:file_id", get(content_handler).delete(delete_handler))
        .layer(Extension(file_store))
}

/// The complete service: file routes, request body limit and request tracing.
pub fn build_router<T>(config: &ServerConfig, file_store: T) -> Router
where
    T: FileStore + 'static,
{
    let body_limit = match config.max_upload_bytes {
        0 => DefaultBodyLimit::disable(),
        max => DefaultBodyLimit::max(max),
    };

    setup_file_routes(Router::new(), file_store)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
}
