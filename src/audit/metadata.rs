//! JSON detail attached to activity rows.

use crate::core::{Category, ProjectId};

use serde_json::{json, Value};

/// Detail for an Upload activity.
pub fn upload_metadata(category: Category, project_id: Option<ProjectId>) -> Value {
    json!({
        "category": category.label(),
        "projectId": project_id.map(ProjectId::get),
    })
}

/// Detail for a Replace activity: the incoming file.
pub fn replace_metadata(file_name: &str, file_size_bytes: u64) -> Value {
    json!({
        "fileName": file_name,
        "fileSizeBytes": file_size_bytes,
    })
}

/// Detail for a MetadataEdit activity: which fields changed.
pub fn metadata_edit_metadata(changed: &[&str]) -> Value {
    json!({ "changed": changed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_metadata() {
        let v = upload_metadata(Category::Reports, Some(ProjectId(7)));
        assert_eq!(v["category"], "Reports");
        assert_eq!(v["projectId"], 7);

        let v = upload_metadata(Category::PersonalFiles, None);
        assert!(v["projectId"].is_null());
    }

    #[test]
    fn test_edit_metadata_lists_fields() {
        let v = metadata_edit_metadata(&["title", "tags"]);
        assert_eq!(v["changed"], json!(["title", "tags"]));
    }
}
