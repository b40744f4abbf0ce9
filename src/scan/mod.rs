//! Scan verdict write-back, as run by the scanning worker.
//!
//! The engine only ever moves documents into `Pending`. Moving them out is
//! the worker's job: it pops a [`ScanJob`](crate::core::ScanJob), scans the
//! content and reports the verdict through [`record_verdict`].

use crate::core::{
    Document, DocumentRepository, DocumentResult, ScanJob, ScanStatus,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// What the scanner concluded about a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum ScanVerdict {
    /// No threat found.
    Clean,
    /// Content must be withheld.
    Rejected {
        /// Scanner-provided reason.
        reason: Option<String>,
    },
}

impl ScanVerdict {
    /// Creates a rejection with a reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: Some(reason.into()),
        }
    }

    fn status(&self) -> ScanStatus {
        match self {
            Self::Clean => ScanStatus::Clean,
            Self::Rejected { .. } => ScanStatus::Rejected,
        }
    }
}

/// Result of reporting a verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictOutcome {
    /// The document moved out of `Pending`.
    Applied(Document),
    /// The job no longer describes the document's current content; nothing
    /// was written.
    Stale,
}

impl VerdictOutcome {
    /// Returns `true` if the verdict was written.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Writes a scanner verdict back to the document named by the job.
///
/// The verdict is ignored when the document is gone, deleted, no longer
/// `Pending`, or holds different content than the job scanned (it was
/// replaced after the job was queued).
pub async fn record_verdict(
    repo: &dyn DocumentRepository,
    job: &ScanJob,
    verdict: ScanVerdict,
) -> DocumentResult<VerdictOutcome> {
    let Some(mut document) = repo.document(job.document_id).await? else {
        tracing::debug!(document_id = %job.document_id, "Verdict for unknown document");
        return Ok(VerdictOutcome::Stale);
    };

    if document.is_deleted
        || document.scan_status != ScanStatus::Pending
        || document.file_path != job.file_path
    {
        crate::audit::emit_stale_verdict(document.id, document.scan_status);
        return Ok(VerdictOutcome::Stale);
    }

    let now = Utc::now();
    document.scan_status = verdict.status();
    document.scan_completed_at = Some(now);
    document.scan_failure_reason = match verdict {
        ScanVerdict::Clean => None,
        ScanVerdict::Rejected { reason } => reason,
    };
    document.updated_at = now;

    let mut tx = repo.begin().await?;
    tx.update_document(&document).await?;
    tx.commit().await?;
    document.version += 1;

    tracing::info!(
        document_id = %document.id,
        scan_status = %document.scan_status,
        "Scan verdict applied"
    );
    crate::audit::emit_scan_verdict(&document);

    Ok(VerdictOutcome::Applied(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, NewDocument, UserId};
    use crate::store::InMemoryRepository;

    async fn seeded() -> (InMemoryRepository, Document) {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let doc = tx
            .insert_document(NewDocument {
                title: "Plan".into(),
                description: None,
                category: Category::Other,
                file_name: "plan.pdf".into(),
                file_path: "1/personal/a.pdf".into(),
                content_type: "application/pdf".into(),
                file_size_bytes: 3,
                owner_id: UserId(1),
                project_id: None,
                task_id: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (repo, doc)
    }

    #[tokio::test]
    async fn test_clean_verdict_applies() {
        let (repo, doc) = seeded().await;
        let job = ScanJob::for_document(&doc);

        let outcome = record_verdict(&repo, &job, ScanVerdict::Clean).await.unwrap();
        assert!(outcome.is_applied());

        let stored = repo.document(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.scan_status, ScanStatus::Clean);
        assert!(stored.scan_completed_at.is_some());
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_rejection_keeps_reason() {
        let (repo, doc) = seeded().await;
        let job = ScanJob::for_document(&doc);

        record_verdict(&repo, &job, ScanVerdict::rejected("Eicar-Test-Signature"))
            .await
            .unwrap();

        let stored = repo.document(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.scan_status, ScanStatus::Rejected);
        assert_eq!(
            stored.scan_failure_reason.as_deref(),
            Some("Eicar-Test-Signature")
        );
    }

    #[tokio::test]
    async fn test_second_verdict_is_stale() {
        let (repo, doc) = seeded().await;
        let job = ScanJob::for_document(&doc);

        record_verdict(&repo, &job, ScanVerdict::Clean).await.unwrap();
        let outcome = record_verdict(&repo, &job, ScanVerdict::rejected("late"))
            .await
            .unwrap();
        assert_eq!(outcome, VerdictOutcome::Stale);
        assert_eq!(
            repo.document(doc.id).await.unwrap().unwrap().scan_status,
            ScanStatus::Clean
        );
    }

    #[tokio::test]
    async fn test_verdict_for_replaced_content_is_stale() {
        let (repo, doc) = seeded().await;
        let mut job = ScanJob::for_document(&doc);
        job.file_path = "1/personal/old.pdf".into();

        let outcome = record_verdict(&repo, &job, ScanVerdict::Clean).await.unwrap();
        assert_eq!(outcome, VerdictOutcome::Stale);
    }

    #[tokio::test]
    async fn test_verdict_for_deleted_document_is_stale() {
        let (repo, mut doc) = seeded().await;
        let job = ScanJob::for_document(&doc);

        doc.tombstone(UserId(1), Utc::now());
        let mut tx = repo.begin().await.unwrap();
        tx.update_document(&doc).await.unwrap();
        tx.commit().await.unwrap();

        let outcome = record_verdict(&repo, &job, ScanVerdict::Clean).await.unwrap();
        assert_eq!(outcome, VerdictOutcome::Stale);
    }

    #[test]
    fn test_verdict_serde() {
        let json = serde_json::to_string(&ScanVerdict::rejected("x")).unwrap();
        assert_eq!(json, r#"{"verdict":"rejected","reason":"x"}"#);
        let back: ScanVerdict = serde_json::from_str(r#"{"verdict":"clean"}"#).unwrap();
        assert_eq!(back, ScanVerdict::Clean);
    }
}
