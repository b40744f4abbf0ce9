//! Collaborator traits consumed by the document engine.
//!
//! The engine owns none of these: the relational store, the blob store, the
//! scan queue transport, the notification system and the user/project
//! directory are all supplied by the host application.

use crate::core::error::{FileStoreResult, NotifyError, ScanQueueError, StoreResult};
use crate::core::model::{
    Document, DocumentActivity, DocumentShare, DocumentTag, NewActivity, NewDocument, Project,
    ScanJob, UserProfile,
};
use crate::core::types::{
    ActivityId, DocumentId, NotificationKind, NotificationPriority, ProjectId, Role, UserId,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;

/// Opaque byte store for document content.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use docbridge::core::{FileStore, FileStoreResult, ProjectId, UserId};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct BucketStore { /* client */ }
///
/// #[async_trait]
/// impl FileStore for BucketStore {
///     async fn put(&self, data: &[u8], file_name: &str, content_type: &str,
///                  owner: UserId, project: Option<ProjectId>) -> FileStoreResult<String> {
///         todo!()
///     }
///     async fn get(&self, path: &str) -> FileStoreResult<Vec<u8>> { todo!() }
///     async fn delete(&self, path: &str) -> FileStoreResult<()> { todo!() }
/// }
/// ```
#[async_trait]
pub trait FileStore: Send + Sync + Debug {
    /// Stores content and returns the opaque path it can be fetched by.
    async fn put(
        &self,
        data: &[u8],
        file_name: &str,
        content_type: &str,
        owner: UserId,
        project: Option<ProjectId>,
    ) -> FileStoreResult<String>;

    /// Fetches content. Fails with `FileStoreError::NotFound` if absent.
    async fn get(&self, path: &str) -> FileStoreResult<Vec<u8>>;

    /// Removes content. Absent content is not an error.
    async fn delete(&self, path: &str) -> FileStoreResult<()>;
}

/// Transport delivering scan jobs to the external scanning worker.
///
/// Implementations must fail when the transport is unreachable or
/// unconfigured; there is no silent success path.
#[async_trait]
pub trait ScanQueue: Send + Sync + Debug {
    /// Hands the job to the transport.
    async fn enqueue(&self, job: &ScanJob) -> Result<(), ScanQueueError>;
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Recipient.
    pub user_id: UserId,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Kind.
    pub kind: NotificationKind,
    /// Priority.
    pub priority: NotificationPriority,
}

/// Fire-and-forget notification delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync + Debug {
    /// Delivers one notification.
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Read-only user and project facts.
#[async_trait]
pub trait Directory: Send + Sync + Debug {
    /// Looks up a user.
    async fn user(&self, id: UserId) -> StoreResult<Option<UserProfile>>;

    /// Looks up a project with its manager and members.
    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>>;

    /// Returns the user's role; unknown users are plain employees.
    async fn role(&self, id: UserId) -> StoreResult<Role> {
        Ok(self.user(id).await?.map(|u| u.role).unwrap_or_default())
    }
}

/// All document-side rows read in one consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    /// Every document row, deleted ones included.
    pub documents: Vec<Document>,
    /// Every tag row.
    pub tags: Vec<DocumentTag>,
    /// Every share row.
    pub shares: Vec<DocumentShare>,
}

/// Document persistence.
///
/// Reads return flat snapshots. Writes go through a [`RepositoryTransaction`].
#[async_trait]
pub trait DocumentRepository: Send + Sync + Debug {
    /// Fetches a row by id, deleted rows included.
    async fn document(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    /// Tags of a document.
    async fn tags(&self, id: DocumentId) -> StoreResult<Vec<DocumentTag>>;

    /// Shares of a document.
    async fn shares(&self, id: DocumentId) -> StoreResult<Vec<DocumentShare>>;

    /// Audit trail of a document, oldest first.
    async fn activities(&self, id: DocumentId) -> StoreResult<Vec<DocumentActivity>>;

    /// Reads the whole catalog.
    async fn catalog(&self) -> StoreResult<CatalogRows>;

    /// Opens a unit of work.
    async fn begin(&self) -> StoreResult<Box<dyn RepositoryTransaction>>;
}

/// A unit of work against the repository.
///
/// Writes are invisible to readers until [`commit`](Self::commit) and are
/// discarded if the transaction is dropped without committing.
#[async_trait]
pub trait RepositoryTransaction: Send {
    /// Stages a new document and returns it with its assigned identity.
    async fn insert_document(&mut self, document: NewDocument) -> StoreResult<Document>;

    /// Stages an update. Commit fails with `VersionConflict` unless the
    /// stored version still equals `document.version`.
    async fn update_document(&mut self, document: &Document) -> StoreResult<()>;

    /// Stages a guard on a document this transaction hangs rows off.
    ///
    /// Commit fails with `NotFound` if the row is gone or deleted, and with
    /// `VersionConflict` if its version is no longer `version`.
    async fn require_live(&mut self, id: DocumentId, version: u64) -> StoreResult<()>;

    /// Stages removal of a document and its tags and shares.
    ///
    /// Only used to compensate an upload whose scan request could not be
    /// queued.
    async fn remove_document(&mut self, id: DocumentId) -> StoreResult<()>;

    /// Stages replacement of the document's whole tag set.
    async fn replace_tags(
        &mut self,
        id: DocumentId,
        tags: &[String],
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Stages a share unless one exists for the same document and recipient.
    /// Returns `true` if a row will be created.
    async fn insert_share_if_absent(&mut self, share: DocumentShare) -> StoreResult<bool>;

    /// Stages an audit entry and returns it with its assigned identity.
    async fn append_activity(&mut self, activity: NewActivity) -> StoreResult<DocumentActivity>;

    /// Stages removal of the audit entry of an operation that is being
    /// compensated.
    ///
    /// The activity log is otherwise append-only. This is only for undoing
    /// a committed operation whose follow-up failed, and the same
    /// transaction must also restore or remove the entry's document;
    /// commit fails with `StoreError::UnpairedRetraction` otherwise.
    async fn retract_compensated_activity(&mut self, id: ActivityId) -> StoreResult<()>;

    /// Applies all staged writes atomically.
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discards all staged writes.
    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

/// A shared file store.
pub type ArcFileStore = Arc<dyn FileStore>;

/// A shared scan queue.
pub type ArcScanQueue = Arc<dyn ScanQueue>;

/// A shared notification sink.
pub type ArcNotificationSink = Arc<dyn NotificationSink>;

/// A shared directory.
pub type ArcDirectory = Arc<dyn Directory>;

/// A shared repository.
pub type ArcRepository = Arc<dyn DocumentRepository>;
