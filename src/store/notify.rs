//! Notification sink implementations.

use crate::core::error::NotifyError;
use crate::core::traits::{Notification, NotificationSink};

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Sink that logs each notification and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %notification.user_id,
            title = %notification.title,
            kind = ?notification.kind,
            priority = ?notification.priority,
            "Notification sent"
        );
        Ok(())
    }
}

/// Sink that keeps every notification in memory, for tests.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotificationSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery fail until switched back. Failed deliveries
    /// are not recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delivered notifications, in delivery order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::new("notification service offline"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(notification);
        Ok(())
    }
}
