//! The document lifecycle engine.
//!
//! [`DocumentEngine`] ties the access resolver, the listing engine and the
//! collaborators together into the public operations: upload, read, list,
//! download, preview, metadata update, replace, delete and share.

mod cancel;
mod lifecycle;
mod requests;
mod retry;
mod validate;


pub use lifecycle::{DocumentEngine, DocumentEngineBuilder, DEFAULT_RECENT_COUNT};
pub use requests::{DocumentContent, MetadataUpdate, ShareRequest, ShareSummary, UploadRequest};
pub use retry::{RetryConfig, RetryingScanQueue};
