//! # Docbridge
//!
//! A multi-tenant document access-control and lifecycle engine: uploads,
//! malware-scan gating, sharing, soft deletion and an append-only audit
//! trail.
//!
//! ## Overview
//!
//! Docbridge decides who may see, fetch, modify, replace or delete a
//! document and coordinates each document through its lifecycle:
//!
//! - Upload validates the file and metadata, stores the content and queues a
//!   scan job
//! - Content is released only once the scanner has marked it clean
//! - Replacing content always sends the document back for scanning
//! - Sharing grants read access to individual users
//! - Every mutation and every content release is written to the audit trail
//!
//! The relational store, blob store, scan queue transport, notification
//! service and user directory are collaborators supplied by the host.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docbridge::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = DocumentEngine::builder()
//!         .with_repository(InMemoryRepository::new())
//!         .with_directory(InMemoryDirectory::new())
//!         .with_file_store(FilesystemFileStore::new("/var/lib/docbridge")?)
//!         .with_scan_queue(InMemoryScanQueue::default())
//!         .build()?;
//!
//!     let cancel = CancellationToken::new();
//!     let upload = FileUpload::new(b"%PDF-1.7".to_vec(), "plan.pdf", "application/pdf");
//!     let document = engine
//!         .upload(UserId(1), UploadRequest::new("Plan", "Reports"), upload, &cancel)
//!         .await?;
//!
//!     // Not downloadable until the scanner reports back.
//!     assert_eq!(document.scan_status, ScanStatus::Pending);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Core**: Identifiers, records, policy, collaborator traits and errors
//! - **Access**: View and manage rules for documents and projects
//! - **Query**: Access-scoped, filtered and sorted listings
//! - **Engine**: The lifecycle operations
//! - **Scan**: Verdict write-back for the scanning worker
//! - **Store**: Reference collaborator implementations
//! - **Audit**: Structured audit events

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod access;
pub mod audit;
pub mod core;
pub mod engine;
pub mod query;
pub mod scan;
pub mod store;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Category, Document, DocumentError, DocumentPolicy, DocumentResult, DocumentView, FileUpload,
    ProjectId, Role, ScanStatus, UserId,
};

pub use crate::access::{AccessResolver, Actor};
pub use crate::engine::{DocumentEngine, DocumentEngineBuilder};
pub use crate::query::DocumentQuery;
pub use crate::scan::{record_verdict, ScanVerdict};

/// Prelude module for convenient imports.
///
/// ```rust
/// use docbridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        Category, Document, DocumentError, DocumentId, DocumentPolicy, DocumentResult,
        DocumentView, FileUpload, Project, ProjectId, Role, ScanStatus, UserId, UserProfile,
    };
    pub use crate::engine::{
        DocumentContent, DocumentEngine, MetadataUpdate, ShareRequest, UploadRequest,
    };
    pub use crate::query::{DocumentQuery, SortDirection, SortKey};
    pub use crate::scan::{record_verdict, ScanVerdict, VerdictOutcome};
    pub use crate::store::{
        FilesystemFileStore, InMemoryDirectory, InMemoryFileStore, InMemoryRepository,
        InMemoryScanQueue,
    };
}
