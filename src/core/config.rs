//! Document policy configuration.
//!
//! The allow-lists that gate uploads and previews are loaded once at
//! startup and shared read-only with the engine.

use crate::core::error::{DocumentError, DocumentResult};
use crate::core::types::Category;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Maximum upload size: 25 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Maximum number of rows a listing returns.
pub const DEFAULT_LIST_LIMIT: usize = 500;

const DEFAULT_EXTENSIONS: [&str; 11] = [
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".jpg", ".jpeg", ".png",
];

const DEFAULT_PREVIEW_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Upload, preview and listing limits.
///
/// # Examples
///
/// ```rust
/// use docbridge::core::{Category, DocumentPolicy};
///
/// let policy = DocumentPolicy::from_json_str(r#"{ "maxFileSize": 1048576 }"#).unwrap();
/// assert_eq!(policy.max_file_size, 1024 * 1024);
/// assert!(policy.allows_category(Category::Reports));
/// assert!(policy.allows_extension(".PDF"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentPolicy {
    /// Categories accepted on upload and metadata update.
    pub allowed_categories: BTreeSet<Category>,

    /// Lowercase filename extensions accepted, dot included.
    pub allowed_extensions: BTreeSet<String>,

    /// Lowercase content types that may be previewed inline.
    pub preview_content_types: BTreeSet<String>,

    /// Largest accepted upload in bytes.
    pub max_file_size: u64,

    /// Row cap for queried and recent listings.
    pub list_limit: usize,

    /// Longest accepted title in characters.
    pub max_title_len: usize,

    /// Longest accepted description in characters.
    pub max_description_len: usize,

    /// Longest accepted tag in characters.
    pub max_tag_len: usize,
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self {
            allowed_categories: Category::ALL.into_iter().collect(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            preview_content_types: DEFAULT_PREVIEW_TYPES.iter().map(|t| t.to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            list_limit: DEFAULT_LIST_LIMIT,
            max_title_len: 200,
            max_description_len: 2000,
            max_tag_len: 64,
        }
    }
}

impl DocumentPolicy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a policy from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> DocumentResult<Self> {
        let policy: Self = serde_json::from_str(json)
            .map_err(|e| DocumentError::validation("policy", e.to_string()))?;
        policy.normalized().validate()
    }

    /// Loads a policy from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocumentError::validation("policy", format!("{}: {}", path.display(), e))
        })?;
        let policy = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.display(),
            categories = policy.allowed_categories.len(),
            extensions = policy.allowed_extensions.len(),
            max_file_size = policy.max_file_size,
            "Loaded document policy"
        );
        Ok(policy)
    }

    /// Checks internal consistency.
    pub fn validate(self) -> DocumentResult<Self> {
        if self.allowed_categories.is_empty() {
            return Err(DocumentError::validation(
                "policy",
                "at least one category must be allowed",
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(DocumentError::validation(
                "policy",
                "at least one extension must be allowed",
            ));
        }
        if self.max_file_size == 0 {
            return Err(DocumentError::validation(
                "policy",
                "max file size must be positive",
            ));
        }
        if self.list_limit == 0 {
            return Err(DocumentError::validation(
                "policy",
                "list limit must be positive",
            ));
        }
        Ok(self)
    }

    /// Lowercases extensions and content types, adding a leading dot to
    /// extensions that lack one.
    fn normalized(mut self) -> Self {
        self.allowed_extensions = self
            .allowed_extensions
            .into_iter()
            .map(|e| {
                let e = e.trim().to_ascii_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{}", e)
                }
            })
            .collect();
        self.preview_content_types = self
            .preview_content_types
            .into_iter()
            .map(|t| t.trim().to_ascii_lowercase())
            .collect();
        self
    }

    /// Restricts the accepted categories.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.allowed_categories = categories.into_iter().collect();
        self
    }

    /// Replaces the accepted extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self.normalized()
    }

    /// Replaces the previewable content types.
    pub fn with_preview_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preview_content_types = types.into_iter().map(Into::into).collect();
        self.normalized()
    }

    /// Sets the maximum upload size.
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Sets the listing cap.
    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Returns `true` if the category is accepted.
    pub fn allows_category(&self, category: Category) -> bool {
        self.allowed_categories.contains(&category)
    }

    /// Matches a category label exactly and checks it against the allow-list.
    pub fn accept_category(&self, label: &str) -> Option<Category> {
        Category::from_label(label).filter(|c| self.allows_category(*c))
    }

    /// Returns `true` if the extension is accepted (case-insensitive).
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .contains(&extension.to_ascii_lowercase())
    }

    /// Returns `true` if the content type can be previewed (case-insensitive).
    pub fn allows_preview(&self, content_type: &str) -> bool {
        self.preview_content_types
            .contains(&content_type.trim().to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = DocumentPolicy::default();
        assert_eq!(policy.allowed_categories.len(), 6);
        assert_eq!(policy.allowed_extensions.len(), 11);
        assert_eq!(policy.max_file_size, 26_214_400);
        assert_eq!(policy.list_limit, 500);
        assert!(policy.allows_extension(".DOCX"));
        assert!(!policy.allows_extension(".exe"));
        assert!(policy.allows_preview("Image/PNG"));
        assert!(!policy.allows_preview("text/plain"));
    }

    #[test]
    fn test_accept_category() {
        let policy = DocumentPolicy::default().with_categories([Category::Reports]);
        assert_eq!(policy.accept_category("Reports"), Some(Category::Reports));
        assert_eq!(policy.accept_category("Other"), None);
        assert_eq!(policy.accept_category("Bogus"), None);
        assert_eq!(policy.accept_category(" Reports"), None);
        assert_eq!(policy.accept_category("reports"), None);
    }

    #[test]
    fn test_from_json_normalizes() {
        let policy = DocumentPolicy::from_json_str(
            r#"{
                "allowedCategories": ["Reports", "Team Resources"],
                "allowedExtensions": ["PDF", ".Txt"],
                "previewContentTypes": ["Application/PDF"]
            }"#,
        )
        .unwrap();

        assert!(policy.allows_extension(".pdf"));
        assert!(policy.allows_extension(".txt"));
        assert!(!policy.allows_extension(".png"));
        assert!(policy.allows_preview("application/pdf"));
        assert!(policy.allows_category(Category::TeamResources));
        assert!(!policy.allows_category(Category::Other));
        assert_eq!(policy.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_invalid_policies_rejected() {
        assert!(DocumentPolicy::from_json_str(r#"{ "allowedCategories": [] }"#).is_err());
        assert!(DocumentPolicy::from_json_str(r#"{ "maxFileSize": 0 }"#).is_err());
        assert!(DocumentPolicy::from_json_str(r#"{ "allowedCategories": ["Nope"] }"#).is_err());
        assert!(DocumentPolicy::from_json_str("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{ "listLimit": 50 }"#).unwrap();

        let policy = DocumentPolicy::load(&path).unwrap();
        assert_eq!(policy.list_limit, 50);

        assert!(DocumentPolicy::load(dir.path().join("missing.json")).is_err());
    }
}
