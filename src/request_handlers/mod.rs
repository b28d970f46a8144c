pub mod content_handler;
pub mod delete_handler;
pub mod error;
pub mod list_handler;
pub mod upload_handler;

use serde::Deserialize;

/// Multipart part carrying the uploaded bytes.
pub const FILE_PART: &str = "file";

/// Multipart part carrying the owning user id as text.
pub const USER_ID_PART: &str = "userid";

/// The `userId` query parameter every read and delete request is scoped by.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}
