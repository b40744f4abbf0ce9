//! Reference collaborator implementations.
//!
//! Production deployments plug in their own database, blob store, queue
//! client and notification service. The implementations here back the
//! demos and the test suite.

mod directory;
mod files;
mod notify;
mod queue;
mod repository;

pub use directory::InMemoryDirectory;
pub use files::{FilesystemFileStore, InMemoryFileStore};
pub use notify::{RecordingNotificationSink, TracingNotificationSink};
pub use queue::{InMemoryScanQueue, UnconfiguredScanQueue, DEFAULT_QUEUE_NAME};
pub use repository::InMemoryRepository;
