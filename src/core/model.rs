//! Document records and the relations owned by them.
//!
//! These are flat value snapshots. Relations (tags, shares, activities,
//! projects, users) are fetched through separate lookups rather than
//! traversed from the document.

use crate::core::types::{
    ActivityId, ActivityKind, Category, DocumentId, ProjectId, Role, ScanStatus, TaskId, UserId,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Row identity, assigned by the repository.
    pub id: DocumentId,

    /// Display title.
    pub title: String,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Category.
    pub category: Category,

    /// Filename as uploaded.
    pub file_name: String,

    /// Opaque path handed out by the file store.
    pub file_path: String,

    /// Declared content type.
    pub content_type: String,

    /// Content size in bytes.
    pub file_size_bytes: u64,

    /// Uploader.
    pub owner_id: UserId,

    /// Project the document is attached to, if any.
    pub project_id: Option<ProjectId>,

    /// Task the document is attached to, if any.
    pub task_id: Option<TaskId>,

    /// When the document was uploaded.
    pub uploaded_at: DateTime<Utc>,

    /// Last mutation time.
    pub updated_at: DateTime<Utc>,

    /// Scan state of the current content.
    pub scan_status: ScanStatus,

    /// When the current content was handed to the scanner.
    pub scan_requested_at: DateTime<Utc>,

    /// When the scanner reported back.
    pub scan_completed_at: Option<DateTime<Utc>>,

    /// Scanner-provided reason for a rejection.
    pub scan_failure_reason: Option<String>,

    /// Soft-delete tombstone.
    pub is_deleted: bool,

    /// When the tombstone was set.
    pub deleted_at: Option<DateTime<Utc>>,

    /// Who set the tombstone.
    pub deleted_by: Option<UserId>,

    /// Optimistic concurrency token, bumped on every committed update.
    pub version: u64,
}

impl Document {
    /// Resets the scan sub-state for freshly stored content.
    pub fn reset_scan(&mut self, now: DateTime<Utc>) {
        self.scan_status = ScanStatus::Pending;
        self.scan_requested_at = now;
        self.scan_completed_at = None;
        self.scan_failure_reason = None;
    }

    /// Sets the soft-delete tombstone.
    pub fn tombstone(&mut self, by: UserId, now: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_by = Some(by);
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    /// Returns the lowercase extension of the stored filename, dot included.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_name)
    }
}

/// A new document before the repository assigns its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category.
    pub category: Category,
    /// Filename as uploaded.
    pub file_name: String,
    /// Opaque file store path.
    pub file_path: String,
    /// Declared content type.
    pub content_type: String,
    /// Content size in bytes.
    pub file_size_bytes: u64,
    /// Uploader.
    pub owner_id: UserId,
    /// Project, if any.
    pub project_id: Option<ProjectId>,
    /// Task, if any.
    pub task_id: Option<TaskId>,
    /// Creation time; also the first scan-request time.
    pub created_at: DateTime<Utc>,
}

impl NewDocument {
    /// Materialises the row with the given identity. Scan state starts Pending.
    pub fn into_document(self, id: DocumentId) -> Document {
        Document {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            file_name: self.file_name,
            file_path: self.file_path,
            content_type: self.content_type,
            file_size_bytes: self.file_size_bytes,
            owner_id: self.owner_id,
            project_id: self.project_id,
            task_id: self.task_id,
            uploaded_at: self.created_at,
            updated_at: self.created_at,
            scan_status: ScanStatus::Pending,
            scan_requested_at: self.created_at,
            scan_completed_at: None,
            scan_failure_reason: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }
}

/// A tag attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTag {
    /// Owning document.
    pub document_id: DocumentId,
    /// Tag text, trimmed.
    pub value: String,
    /// When the tag was attached.
    pub created_at: DateTime<Utc>,
}

/// A read grant from a document manager to another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentShare {
    /// Shared document.
    pub document_id: DocumentId,
    /// Recipient.
    pub shared_with: UserId,
    /// Who granted the share.
    pub shared_by: UserId,
    /// When the share was created.
    pub shared_at: DateTime<Utc>,
}

/// Append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentActivity {
    /// Row identity, assigned by the repository.
    pub id: ActivityId,
    /// Subject document.
    pub document_id: DocumentId,
    /// Acting user.
    pub actor_id: UserId,
    /// What happened.
    pub kind: ActivityKind,
    /// Recipient, for shares.
    pub target_user_id: Option<UserId>,
    /// Free-form JSON detail.
    pub metadata: Option<serde_json::Value>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// An activity before the repository assigns its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    /// Subject document.
    pub document_id: DocumentId,
    /// Acting user.
    pub actor_id: UserId,
    /// What happened.
    pub kind: ActivityKind,
    /// Recipient, for shares.
    pub target_user_id: Option<UserId>,
    /// Free-form JSON detail.
    pub metadata: Option<serde_json::Value>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl NewActivity {
    /// Creates an activity stamped with the current time.
    pub fn new(document_id: DocumentId, actor_id: UserId, kind: ActivityKind) -> Self {
        Self {
            document_id,
            actor_id,
            kind,
            target_user_id: None,
            metadata: None,
            occurred_at: Utc::now(),
        }
    }

    /// Sets the target user.
    pub fn with_target(mut self, user: UserId) -> Self {
        self.target_user_id = Some(user);
        self
    }

    /// Sets the JSON metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the timestamp.
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// Materialises the row with the given identity.
    pub fn into_activity(self, id: ActivityId) -> DocumentActivity {
        DocumentActivity {
            id,
            document_id: self.document_id,
            actor_id: self.actor_id,
            kind: self.kind,
            target_user_id: self.target_user_id,
            metadata: self.metadata,
            occurred_at: self.occurred_at,
        }
    }
}

/// Message handed to the scan queue. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJob {
    /// Document whose content must be scanned.
    pub document_id: DocumentId,
    /// File store path of the content.
    pub file_path: String,
    /// Declared content type.
    pub file_type: String,
    /// Uploader of the document.
    pub uploader_id: UserId,
    /// Project, if any.
    pub project_id: Option<ProjectId>,
    /// When the job was built.
    pub enqueued_at: DateTime<Utc>,
}

impl ScanJob {
    /// Builds a job for the document's current content.
    pub fn for_document(document: &Document) -> Self {
        Self {
            document_id: document.id,
            file_path: document.file_path.clone(),
            file_type: document.content_type.clone(),
            uploader_id: document.owner_id,
            project_id: document.project_id,
            enqueued_at: Utc::now(),
        }
    }
}

/// A project as seen by the access resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Identity.
    pub id: ProjectId,
    /// Display name, searched by listings.
    pub name: String,
    /// Project manager.
    pub manager_id: UserId,
    /// Members, excluding the manager unless also listed.
    pub member_ids: BTreeSet<UserId>,
}

impl Project {
    /// Creates a project with no members.
    pub fn new(id: ProjectId, name: impl Into<String>, manager_id: UserId) -> Self {
        Self {
            id,
            name: name.into(),
            manager_id,
            member_ids: BTreeSet::new(),
        }
    }

    /// Adds a member.
    pub fn with_member(mut self, user: UserId) -> Self {
        self.member_ids.insert(user);
        self
    }

    /// Returns `true` if the user is the manager.
    pub fn is_manager(&self, user: UserId) -> bool {
        self.manager_id == user
    }

    /// Returns `true` if the user is listed as a member.
    pub fn is_member(&self, user: UserId) -> bool {
        self.member_ids.contains(&user)
    }
}

/// A user as seen by the access resolver and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity.
    pub id: UserId,
    /// Display name, searched by listings.
    pub display_name: String,
    /// Dashboard role.
    pub role: Role,
}

impl UserProfile {
    /// Creates a profile.
    pub fn new(id: UserId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }
}

/// Read model returned by single reads and listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    /// The document row.
    #[serde(flatten)]
    pub document: Document,
    /// Tag values.
    pub tags: Vec<String>,
    /// Uploader display name, if the user still exists.
    pub uploader_name: Option<String>,
    /// Project name, if attached and the project still exists.
    pub project_name: Option<String>,
}

/// Returns the lowercase extension of a filename, dot included.
pub fn file_extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rfind('.') {
        Some(idx) if idx + 1 < base.len() => Some(base[idx..].to_ascii_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc() -> NewDocument {
        NewDocument {
            title: "Budget".into(),
            description: None,
            category: Category::Reports,
            file_name: "Budget.XLSX".into(),
            file_path: "1/personal/abc.xlsx".into(),
            content_type: "application/vnd.ms-excel".into(),
            file_size_bytes: 10 * 1024,
            owner_id: UserId(1),
            project_id: None,
            task_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_document_starts_pending() {
        let doc = new_doc().into_document(DocumentId(9));
        assert_eq!(doc.id, DocumentId(9));
        assert_eq!(doc.scan_status, ScanStatus::Pending);
        assert_eq!(doc.scan_requested_at, doc.uploaded_at);
        assert!(!doc.is_deleted);
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_reset_scan_clears_completion() {
        let mut doc = new_doc().into_document(DocumentId(1));
        doc.scan_status = ScanStatus::Rejected;
        doc.scan_completed_at = Some(Utc::now());
        doc.scan_failure_reason = Some("Eicar".into());

        let now = Utc::now();
        doc.reset_scan(now);
        assert_eq!(doc.scan_status, ScanStatus::Pending);
        assert_eq!(doc.scan_requested_at, now);
        assert!(doc.scan_completed_at.is_none());
        assert!(doc.scan_failure_reason.is_none());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Budget.XLSX").as_deref(), Some(".xlsx"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(file_extension("dir.v2/README"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".png").as_deref(), Some(".png"));
    }

    #[test]
    fn test_project_membership() {
        let project = Project::new(ProjectId(1), "Apollo", UserId(10)).with_member(UserId(11));
        assert!(project.is_manager(UserId(10)));
        assert!(!project.is_member(UserId(10)));
        assert!(project.is_member(UserId(11)));
    }

    #[test]
    fn test_activity_builder() {
        let activity = NewActivity::new(DocumentId(1), UserId(2), ActivityKind::Share)
            .with_target(UserId(3))
            .into_activity(ActivityId(5));
        assert_eq!(activity.target_user_id, Some(UserId(3)));
        assert_eq!(activity.kind, ActivityKind::Share);
    }
}
