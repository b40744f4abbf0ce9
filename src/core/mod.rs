//! Core types and traits for the docbridge library.
//!
//! - [`types`] - Identifiers and closed enums (`Category`, `ScanStatus`, ...)
//! - [`model`] - Document records and the relations they own
//! - [`input`] - Uploaded file content
//! - [`config`] - The document policy (allow-lists and limits)
//! - [`traits`] - Collaborator traits the engine depends on
//! - [`error`] - Structured error types

pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod traits;
pub mod types;

pub use config::DocumentPolicy;
pub use error::{
    DocumentError, DocumentResult, ErrorKind, FileStoreError, FileStoreResult, NotifyError,
    ScanQueueError, StoreError, StoreResult,
};
pub use input::FileUpload;
pub use model::{
    Document, DocumentActivity, DocumentShare, DocumentTag, DocumentView, NewActivity,
    NewDocument, Project, ScanJob, UserProfile,
};
pub use traits::{
    ArcDirectory, ArcFileStore, ArcNotificationSink, ArcRepository, ArcScanQueue, CatalogRows,
    Directory, DocumentRepository, FileStore, Notification, NotificationSink,
    RepositoryTransaction, ScanQueue,
};
pub use types::{
    ActivityId, ActivityKind, Category, DocumentId, NotificationKind, NotificationPriority,
    ProjectId, Role, ScanStatus, TaskId, UserId,
};
