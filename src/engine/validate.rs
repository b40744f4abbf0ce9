//! Input checks shared by upload, replace and metadata update.
//!
//! Every check here runs before any collaborator is touched.

use crate::core::{Category, DocumentError, DocumentPolicy, DocumentResult, FileUpload};

use std::collections::HashSet;

pub(crate) fn title(policy: &DocumentPolicy, raw: &str) -> DocumentResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DocumentError::validation("title", "title is required"));
    }
    if title.chars().count() > policy.max_title_len {
        return Err(DocumentError::validation(
            "title",
            format!("title exceeds {} characters", policy.max_title_len),
        ));
    }
    Ok(title.to_string())
}

/// Blank descriptions become `None`.
pub(crate) fn description(
    policy: &DocumentPolicy,
    raw: Option<&str>,
) -> DocumentResult<Option<String>> {
    let Some(description) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > policy.max_description_len {
        return Err(DocumentError::validation(
            "description",
            format!(
                "description exceeds {} characters",
                policy.max_description_len
            ),
        ));
    }
    Ok(Some(description.to_string()))
}

pub(crate) fn category(policy: &DocumentPolicy, label: &str) -> DocumentResult<Category> {
    policy
        .accept_category(label)
        .ok_or_else(|| DocumentError::validation("category", "valid category is required"))
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping
/// the first spelling.
pub(crate) fn tags(policy: &DocumentPolicy, raw: &[String]) -> DocumentResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > policy.max_tag_len {
            return Err(DocumentError::validation(
                "tags",
                format!("tag '{}' exceeds {} characters", tag, policy.max_tag_len),
            ));
        }
        if seen.insert(tag.to_lowercase()) {
            tags.push(tag.to_string());
        }
    }
    Ok(tags)
}

pub(crate) fn file(policy: &DocumentPolicy, upload: &FileUpload) -> DocumentResult<()> {
    let allowed = upload
        .extension()
        .is_some_and(|ext| policy.allows_extension(&ext));
    if !allowed {
        return Err(DocumentError::validation(
            "file",
            format!("unsupported file type '{}'", upload.file_name()),
        ));
    }

    let size = upload.size();
    if size == 0 {
        return Err(DocumentError::validation("file", "file is empty"));
    }
    if size > policy.max_file_size {
        return Err(DocumentError::validation(
            "file",
            format!(
                "file of {} bytes exceeds maximum of {} bytes",
                size, policy.max_file_size
            ),
        ));
    }
    Ok(())
}
