//! Audit event types and emission functions.

use crate::core::{Document, DocumentActivity, DocumentId, ScanStatus, UserId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event mirroring one committed activity row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAuditEvent {
    /// Activity row id.
    pub activity_id: i64,

    /// Subject document.
    pub document_id: i64,

    /// Acting user.
    pub actor_id: i64,

    /// Activity kind, snake_case.
    pub activity: String,

    /// Share recipient, if any.
    pub target_user_id: Option<i64>,

    /// JSON detail, if any.
    pub metadata: Option<serde_json::Value>,

    /// When the activity happened.
    pub occurred_at: DateTime<Utc>,
}

impl From<&DocumentActivity> for ActivityAuditEvent {
    fn from(a: &DocumentActivity) -> Self {
        Self {
            activity_id: a.id.get(),
            document_id: a.document_id.get(),
            actor_id: a.actor_id.get(),
            activity: a.kind.as_str().to_string(),
            target_user_id: a.target_user_id.map(UserId::get),
            metadata: a.metadata.clone(),
            occurred_at: a.occurred_at,
        }
    }
}

impl AuditEvent for ActivityAuditEvent {
    fn event_type(&self) -> &'static str {
        "document_activity"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Audit event for a scan verdict written back by the scanning worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanVerdictAuditEvent {
    /// Subject document.
    pub document_id: i64,

    /// Resulting scan status.
    pub status: String,

    /// Scanner-provided reason, for rejections.
    pub reason: Option<String>,

    /// When the verdict was recorded.
    pub completed_at: DateTime<Utc>,
}

impl AuditEvent for ScanVerdictAuditEvent {
    fn event_type(&self) -> &'static str {
        "scan_verdict"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Emits an audit event for a committed activity row.
///
/// Call only after the transaction holding the row has committed.
pub fn emit_activity(activity: &DocumentActivity) {
    let metadata = activity.metadata.as_ref().map(|m| m.to_string());

    tracing::info!(
        target: "docbridge::audit",
        event_type = "document_activity",
        activity_id = %activity.id,
        document_id = %activity.document_id,
        actor_id = %activity.actor_id,
        activity = activity.kind.as_str(),
        target_user_id = ?activity.target_user_id.map(UserId::get),
        metadata = ?metadata,
        occurred_at = %activity.occurred_at,
        "Document activity recorded"
    );
}

/// Emits an audit event for a scan verdict applied to a document.
pub fn emit_scan_verdict(document: &Document) {
    let event = ScanVerdictAuditEvent {
        document_id: document.id.get(),
        status: document.scan_status.to_string(),
        reason: document.scan_failure_reason.clone(),
        completed_at: document.scan_completed_at.unwrap_or(document.updated_at),
    };

    tracing::info!(
        target: "docbridge::audit",
        event_type = event.event_type(),
        document_id = event.document_id,
        scan_status = %event.status,
        reason = ?event.reason,
        completed_at = %event.completed_at,
        "Scan verdict recorded"
    );
}

/// Emits an audit event for a write undone after its scan request failed.
pub fn emit_compensation(document_id: DocumentId, operation: &str, reason: &str) {
    tracing::warn!(
        target: "docbridge::audit",
        event_type = "compensation",
        document_id = %document_id,
        operation = %operation,
        reason = %reason,
        "Committed write rolled back"
    );
}

/// Emits an audit event for a verdict that arrived for stale content.
pub fn emit_stale_verdict(document_id: DocumentId, status: ScanStatus) {
    tracing::info!(
        target: "docbridge::audit",
        event_type = "scan_verdict_stale",
        document_id = %document_id,
        current_status = %status,
        "Scan verdict ignored"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActivityId, ActivityKind, NewActivity};

    #[test]
    fn test_activity_event_from_row() {
        let activity = NewActivity::new(DocumentId(4), UserId(2), ActivityKind::Share)
            .with_target(UserId(3))
            .into_activity(ActivityId(11));
        let event = ActivityAuditEvent::from(&activity);

        assert_eq!(event.activity_id, 11);
        assert_eq!(event.document_id, 4);
        assert_eq!(event.activity, "share");
        assert_eq!(event.target_user_id, Some(3));
        assert_eq!(event.event_type(), "document_activity");
    }

    #[test]
    fn test_activity_event_serializes() {
        let activity = NewActivity::new(DocumentId(1), UserId(1), ActivityKind::Upload)
            .with_metadata(serde_json::json!({ "category": "Reports" }))
            .into_activity(ActivityId(1));
        let json = serde_json::to_value(ActivityAuditEvent::from(&activity)).unwrap();

        assert_eq!(json["activity"], "upload");
        assert_eq!(json["metadata"]["category"], "Reports");
        assert!(json["target_user_id"].is_null());
    }
}
