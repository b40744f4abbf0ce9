//! Operation arguments and results.

use crate::core::{ProjectId, TaskId, UserId};

use serde::{Deserialize, Serialize};

/// Metadata supplied with a new upload.
///
/// The category arrives as its user-facing label and is checked against
/// the policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadRequest {
    /// Title, required.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category label.
    pub category: String,
    /// Project to attach to.
    pub project_id: Option<ProjectId>,
    /// Task to attach to.
    pub task_id: Option<TaskId>,
    /// Tags; blanks and case-insensitive duplicates are dropped.
    pub tags: Vec<String>,
}

impl UploadRequest {
    /// Creates a request with the required fields.
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the document to a project.
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Attaches the document to a task.
    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Sets the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial metadata update. Absent fields are left alone.
///
/// - `title`: blank values are ignored.
/// - `description`: a blank value clears it.
/// - `category`: labels outside the policy are ignored.
/// - `tags`: when present, replaces the whole tag set, possibly with nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category label.
    pub category: Option<String>,
    /// New tag set.
    pub tags: Option<Vec<String>>,
}

impl MetadataUpdate {
    /// Creates an update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category label.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Replaces the tag set.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Recipients of a share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShareRequest {
    /// Users to grant read access to. Duplicates and the caller are skipped.
    pub user_ids: Vec<UserId>,
}

impl ShareRequest {
    /// Creates a request for the given users.
    pub fn new(user_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            user_ids: user_ids.into_iter().collect(),
        }
    }
}

/// What a share call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSummary {
    /// Users notified and logged, in request order.
    pub recipients: Vec<UserId>,
    /// Recipients that did not already hold a share.
    pub newly_shared: Vec<UserId>,
}

/// Content released by a download or preview.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentContent {
    /// The bytes.
    pub data: Vec<u8>,
    /// Declared content type.
    pub content_type: String,
    /// Filename to present.
    pub file_name: String,
}

impl std::fmt::Debug for DocumentContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentContent")
            .field("data_len", &self.data.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_from_json() {
        let request: UploadRequest = serde_json::from_str(
            r#"{ "title": "Budget", "category": "Reports", "projectId": 4, "tags": ["q1"] }"#,
        )
        .unwrap();
        assert_eq!(request.project_id, Some(ProjectId(4)));
        assert_eq!(request.tags, vec!["q1".to_string()]);
        assert!(request.description.is_none());
    }

    #[test]
    fn test_metadata_update_absent_vs_empty_tags() {
        let untouched: MetadataUpdate = serde_json::from_str(r#"{ "title": "x" }"#).unwrap();
        assert!(untouched.tags.is_none());

        let cleared: MetadataUpdate = serde_json::from_str(r#"{ "tags": [] }"#).unwrap();
        assert_eq!(cleared.tags, Some(vec![]));
    }
}
