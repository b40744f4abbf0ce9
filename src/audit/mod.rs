//! Structured audit logging.
//!
//! Every committed activity row is mirrored as a `tracing` event on the
//! `docbridge::audit` target so any subscriber (JSON file, OpenTelemetry,
//! etc.) can ship it to tamper-resistant storage.

mod events;
mod metadata;

pub use events::{
    emit_activity, emit_compensation, emit_scan_verdict, emit_stale_verdict,
    ActivityAuditEvent, AuditEvent, ScanVerdictAuditEvent,
};
pub use metadata::{metadata_edit_metadata, replace_metadata, upload_metadata};
