/// Headers of the multipart part that carried an uploaded file.
///
/// The store accepts them with every upload but does not persist them or let
/// them influence where or how the bytes are written.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    content_type: Option<String>,
    file_name: Option<String>,
}

impl UploadMetadata {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The file name the client sent, if any. Never used to name the stored file.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.content_type.is_none() && self.file_name.is_none()
    }
}
