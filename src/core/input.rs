//! Uploaded file content.

use crate::core::model::file_extension;

use std::path::Path;

/// File content submitted by a caller for upload or replace.
///
/// The content is held in memory; the size seen by validation is the
/// actual byte length.
///
/// # Examples
///
/// ```rust
/// use docbridge::core::FileUpload;
///
/// let upload = FileUpload::new(b"%PDF-1.7".to_vec(), "Plan.PDF", "application/pdf");
/// assert_eq!(upload.size(), 8);
/// assert_eq!(upload.extension().as_deref(), Some(".pdf"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    data: Vec<u8>,
    file_name: String,
    content_type: String,
}

impl FileUpload {
    /// Creates an upload from in-memory bytes.
    pub fn new(
        data: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            data,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Reads an upload from disk, using the path's file name.
    pub async fn from_path(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(data, file_name, content_type))
    }

    /// Returns the content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the filename as supplied.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the declared content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the content length in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns the lowercase extension, dot included.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_name)
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("data_len", &self.data.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_debug_hides_content() {
        let upload = FileUpload::new(vec![0u8; 1024], "a.txt", "text/plain");
        let rendered = format!("{:?}", upload);
        assert!(rendered.contains("data_len: 1024"));
        assert!(!rendered.contains("[0, 0"));
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.TXT");
        std::fs::write(&path, b"hello").unwrap();

        let upload = FileUpload::from_path(&path, "text/plain").await.unwrap();
        assert_eq!(upload.file_name(), "notes.TXT");
        assert_eq!(upload.size(), 5);
        assert_eq!(upload.extension().as_deref(), Some(".txt"));
    }
}
