//! Error types for the docbridge library.
//!
//! The engine reports a single [`DocumentError`] taxonomy. Each collaborator
//! has its own error type which converts into it.

use crate::core::types::{ActivityId, DocumentId};
use thiserror::Error;

/// The main error type for document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Caller-supplied input is invalid. Never retried.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// The caller's resolved access is insufficient.
    #[error("not authorized: {reason}")]
    Unauthorized {
        /// Human-readable reason.
        reason: String,
    },

    /// The document is deleted, never existed, or is invisible to the caller.
    #[error("document {id} not found")]
    NotFound {
        /// Requested document.
        id: DocumentId,
    },

    /// The content has not been scanned yet.
    #[error("document {id} scan is pending")]
    ScanPending {
        /// Requested document.
        id: DocumentId,
    },

    /// The content failed the malware scan.
    #[error("document {id} failed malware scan")]
    ScanRejected {
        /// Requested document.
        id: DocumentId,
        /// Scanner-provided reason, if any.
        reason: Option<String>,
    },

    /// The content type cannot be previewed inline.
    #[error("preview not supported for content type '{content_type}'")]
    PreviewUnsupported {
        /// Declared content type.
        content_type: String,
    },

    /// A collaborator (store, file store, scan queue) is unavailable.
    #[error("{dependency} unavailable: {reason}")]
    DependencyUnavailable {
        /// Which collaborator failed.
        dependency: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A concurrent writer changed the document first.
    #[error("document {id} was modified concurrently")]
    Conflict {
        /// Contended document.
        id: DocumentId,
    },

    /// The operation was cancelled by the caller.
    #[error("operation was cancelled")]
    Cancelled,
}

/// Coarse classification used by request handling to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Client error.
    Validation,
    /// Forbidden.
    Authorization,
    /// Not found or not visible.
    NotFound,
    /// Content exists but is not yet releasable.
    ScanNotReady,
    /// Content exists but was withheld by the scanner.
    ScanRejected,
    /// Retry the whole request later.
    DependencyUnavailable,
    /// Lost an optimistic concurrency race.
    Conflict,
    /// Caller went away.
    Cancelled,
}

impl DocumentError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::PreviewUnsupported { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ScanPending { .. } => ErrorKind::ScanNotReady,
            Self::ScanRejected { .. } => ErrorKind::ScanRejected,
            Self::DependencyUnavailable { .. } => ErrorKind::DependencyUnavailable,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if repeating the whole request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DependencyUnavailable { .. } | Self::Conflict { .. }
        )
    }

    /// Creates a `Validation` error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an `Unauthorized` error.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Creates a `DependencyUnavailable` error.
    pub fn unavailable(dependency: &'static str, reason: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            dependency,
            reason: reason.into(),
        }
    }
}

/// Error type for the document repository and the directory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Reason for the failure.
        reason: String,
    },

    /// The row named by an update or removal does not exist.
    #[error("document {id} not found in store")]
    NotFound {
        /// Missing document.
        id: DocumentId,
    },

    /// The row's version no longer matches the snapshot being written.
    #[error("version conflict on document {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Contended document.
        id: DocumentId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// An activity retraction was not paired with a compensating write to
    /// its document in the same transaction.
    #[error("activity {id} can only be retracted together with its document")]
    UnpairedRetraction {
        /// Activity whose removal was refused.
        id: ActivityId,
    },

    /// The transaction was already committed or rolled back.
    #[error("transaction is closed")]
    TransactionClosed,
}

/// Error type for the file store.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// No content at the given path.
    #[error("stored content not found: {path}")]
    NotFound {
        /// Missing path.
        path: String,
    },

    /// The path is not one this store hands out.
    #[error("invalid storage path: {path}")]
    InvalidPath {
        /// Rejected path.
        path: String,
    },

    /// Writing the content failed.
    #[error("failed to store content: {reason}")]
    WriteFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for the scan queue.
#[derive(Debug, Error)]
pub enum ScanQueueError {
    /// No transport is configured.
    #[error("scan queue is not configured")]
    NotConfigured,

    /// The transport rejected or failed to deliver the message.
    #[error("scan queue unavailable: {reason}")]
    Unavailable {
        /// Reason for the failure.
        reason: String,
    },

    /// The job could not be encoded.
    #[error("failed to encode scan job: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ScanQueueError {
    /// Returns `true` if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Error type for the notification sink.
#[derive(Debug, Error)]
#[error("notification delivery failed: {reason}")]
pub struct NotifyError {
    /// Reason for the failure.
    pub reason: String,
}

impl NotifyError {
    /// Creates a new error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for DocumentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound { id },
            StoreError::VersionConflict { id, .. } => Self::Conflict { id },
            other => Self::unavailable("document store", other.to_string()),
        }
    }
}

impl From<FileStoreError> for DocumentError {
    fn from(err: FileStoreError) -> Self {
        Self::unavailable("file store", err.to_string())
    }
}

impl From<ScanQueueError> for DocumentError {
    fn from(err: ScanQueueError) -> Self {
        Self::unavailable("scan queue", err.to_string())
    }
}

/// A specialized `Result` type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// A specialized `Result` type for repository and directory operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A specialized `Result` type for file store operations.
pub type FileStoreResult<T> = Result<T, FileStoreError>;
