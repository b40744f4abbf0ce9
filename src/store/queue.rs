//! Scan queue implementations.

use crate::core::error::ScanQueueError;
use crate::core::model::ScanJob;
use crate::core::traits::ScanQueue;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Default queue name used by the scanning worker.
pub const DEFAULT_QUEUE_NAME: &str = "document-scan-jobs";

#[derive(Debug, Default)]
struct QueueState {
    messages: Mutex<Vec<String>>,
    unavailable: AtomicBool,
    failures_remaining: AtomicU32,
}

/// In-memory scan queue holding JSON-encoded jobs, for tests and demos.
///
/// Clones share the same messages.
#[derive(Debug, Clone)]
pub struct InMemoryScanQueue {
    name: String,
    state: Arc<QueueState>,
}

impl Default for InMemoryScanQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_NAME)
    }
}

impl InMemoryScanQueue {
    /// Creates an empty queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(QueueState::default()),
        }
    }

    /// Returns the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Makes every enqueue fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the next `count` enqueues fail.
    pub fn fail_next(&self, count: u32) {
        self.state.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Raw JSON payloads, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.state
            .messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Decoded jobs, oldest first.
    pub fn jobs(&self) -> Vec<ScanJob> {
        self.messages()
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.state
            .messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_failure(&self) -> bool {
        self.state
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ScanQueue for InMemoryScanQueue {
    async fn enqueue(&self, job: &ScanJob) -> Result<(), ScanQueueError> {
        if self.state.unavailable.load(Ordering::SeqCst) || self.take_failure() {
            tracing::error!(
                queue = %self.name,
                document_id = %job.document_id,
                "Failed to enqueue scan job"
            );
            return Err(ScanQueueError::Unavailable {
                reason: format!("queue '{}' is unreachable", self.name),
            });
        }

        let payload = serde_json::to_string(job)?;
        self.state
            .messages
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(payload);

        tracing::debug!(
            queue = %self.name,
            document_id = %job.document_id,
            "Scan job enqueued"
        );
        Ok(())
    }
}

/// Scan queue standing in for a missing transport. Every enqueue fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredScanQueue;

#[async_trait]
impl ScanQueue for UnconfiguredScanQueue {
    async fn enqueue(&self, job: &ScanJob) -> Result<(), ScanQueueError> {
        tracing::error!(document_id = %job.document_id, "Queue connection is not configured");
        Err(ScanQueueError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DocumentId, UserId};
    use chrono::Utc;

    fn job(id: i64) -> ScanJob {
        ScanJob {
            document_id: DocumentId(id),
            file_path: "1/personal/x.pdf".into(),
            file_type: "application/pdf".into(),
            uploader_id: UserId(1),
            project_id: None,
            enqueued_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_enqueue_encodes_json() {
        let queue = InMemoryScanQueue::default();
        queue.enqueue(&job(7)).await.unwrap();

        assert_eq!(queue.name(), "document-scan-jobs");
        assert!(queue.messages()[0].contains("\"documentId\":7"));
        assert_eq!(queue.jobs()[0].document_id, DocumentId(7));
    }

    #[tokio::test]
    async fn test_fail_next() {
        let queue = InMemoryScanQueue::default();
        queue.fail_next(2);

        assert!(queue.enqueue(&job(1)).await.is_err());
        assert!(queue.enqueue(&job(1)).await.is_err());
        assert!(queue.enqueue(&job(1)).await.is_ok());
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_is_transient() {
        let queue = InMemoryScanQueue::default();
        queue.set_unavailable(true);
        let err = queue.enqueue(&job(1)).await.unwrap_err();
        assert!(err.is_transient());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_always_fails() {
        let err = UnconfiguredScanQueue.enqueue(&job(1)).await.unwrap_err();
        assert!(matches!(err, ScanQueueError::NotConfigured));
    }
}
