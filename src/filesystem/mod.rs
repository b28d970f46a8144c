pub mod file_id;
pub mod file_store;
pub mod metadata;
