//! In-memory transactional document repository.

use crate::core::error::{StoreError, StoreResult};
use crate::core::model::{
    Document, DocumentActivity, DocumentShare, DocumentTag, NewActivity, NewDocument,
};
use crate::core::traits::{CatalogRows, DocumentRepository, RepositoryTransaction};
use crate::core::types::{ActivityId, DocumentId};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

#[derive(Debug, Clone, Default)]
struct Tables {
    documents: BTreeMap<DocumentId, Document>,
    tags: BTreeMap<DocumentId, Vec<DocumentTag>>,
    shares: Vec<DocumentShare>,
    activities: Vec<DocumentActivity>,
}

impl Tables {
    fn has_share(&self, share: &DocumentShare) -> bool {
        self.shares
            .iter()
            .any(|s| s.document_id == share.document_id && s.shared_with == share.shared_with)
    }

    fn apply(&mut self, write: Write) -> StoreResult<()> {
        match write {
            Write::InsertDocument(document) => {
                self.documents.insert(document.id, document);
            }
            Write::UpdateDocument(mut document) => {
                let stored = self
                    .documents
                    .get_mut(&document.id)
                    .ok_or(StoreError::NotFound { id: document.id })?;
                if stored.version != document.version {
                    return Err(StoreError::VersionConflict {
                        id: document.id,
                        expected: document.version,
                        actual: stored.version,
                    });
                }
                document.version += 1;
                *stored = document;
            }
            Write::RequireLive(id, version) => {
                let stored = self
                    .documents
                    .get(&id)
                    .filter(|d| !d.is_deleted)
                    .ok_or(StoreError::NotFound { id })?;
                if stored.version != version {
                    return Err(StoreError::VersionConflict {
                        id,
                        expected: version,
                        actual: stored.version,
                    });
                }
            }
            Write::RemoveDocument(id) => {
                self.documents
                    .remove(&id)
                    .ok_or(StoreError::NotFound { id })?;
                self.tags.remove(&id);
                self.shares.retain(|s| s.document_id != id);
            }
            Write::ReplaceTags(id, tags) => {
                if tags.is_empty() {
                    self.tags.remove(&id);
                } else {
                    self.tags.insert(id, tags);
                }
            }
            Write::InsertShare(share) => {
                if !self.has_share(&share) {
                    self.shares.push(share);
                }
            }
            Write::AppendActivity(activity) => self.activities.push(activity),
            Write::RetractActivity(id) => self.activities.retain(|a| a.id != id),
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Write {
    InsertDocument(Document),
    UpdateDocument(Document),
    RequireLive(DocumentId, u64),
    RemoveDocument(DocumentId),
    ReplaceTags(DocumentId, Vec<DocumentTag>),
    InsertShare(DocumentShare),
    AppendActivity(DocumentActivity),
    RetractActivity(ActivityId),
}

#[derive(Debug, Default)]
struct Inner {
    tables: RwLock<Tables>,
    next_document: AtomicI64,
    next_activity: AtomicI64,
    unavailable: AtomicBool,
}

/// In-memory [`DocumentRepository`] with buffered, all-or-nothing
/// transactions and optimistic version checks.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Inner>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of document rows, deleted ones included.
    pub fn len(&self) -> usize {
        self.read().documents.len()
    }

    /// Returns `true` if there are no document rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of activity rows.
    pub fn activity_count(&self) -> usize {
        self.read().activities.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.tables.read().unwrap_or_else(|p| p.into_inner())
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "repository is offline".into(),
            });
        }
        Ok(())
    }

    fn next_document_id(&self) -> DocumentId {
        DocumentId(self.inner.next_document.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn next_activity_id(&self) -> ActivityId {
        ActivityId(self.inner.next_activity.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn document(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        self.check_available()?;
        Ok(self.read().documents.get(&id).cloned())
    }

    async fn tags(&self, id: DocumentId) -> StoreResult<Vec<DocumentTag>> {
        self.check_available()?;
        Ok(self.read().tags.get(&id).cloned().unwrap_or_default())
    }

    async fn shares(&self, id: DocumentId) -> StoreResult<Vec<DocumentShare>> {
        self.check_available()?;
        Ok(self
            .read()
            .shares
            .iter()
            .filter(|s| s.document_id == id)
            .cloned()
            .collect())
    }

    async fn activities(&self, id: DocumentId) -> StoreResult<Vec<DocumentActivity>> {
        self.check_available()?;
        Ok(self
            .read()
            .activities
            .iter()
            .filter(|a| a.document_id == id)
            .cloned()
            .collect())
    }

    async fn catalog(&self) -> StoreResult<CatalogRows> {
        self.check_available()?;
        let tables = self.read();
        Ok(CatalogRows {
            documents: tables.documents.values().cloned().collect(),
            tags: tables.tags.values().flatten().cloned().collect(),
            shares: tables.shares.clone(),
        })
    }

    async fn begin(&self) -> StoreResult<Box<dyn RepositoryTransaction>> {
        self.check_available()?;
        Ok(Box::new(InMemoryTransaction {
            repo: self.clone(),
            writes: Vec::new(),
        }))
    }
}

/// Buffered unit of work against an [`InMemoryRepository`].
#[derive(Debug)]
struct InMemoryTransaction {
    repo: InMemoryRepository,
    writes: Vec<Write>,
}

impl InMemoryTransaction {
    fn share_staged(&self, share: &DocumentShare) -> bool {
        self.writes.iter().any(|w| {
            matches!(w, Write::InsertShare(s)
                if s.document_id == share.document_id && s.shared_with == share.shared_with)
        })
    }

    fn compensates(&self, document_id: DocumentId) -> bool {
        self.writes.iter().any(|w| match w {
            Write::RemoveDocument(id) => *id == document_id,
            Write::UpdateDocument(d) => d.id == document_id,
            _ => false,
        })
    }

    /// Every retracted activity must belong to a document this
    /// transaction restores or removes.
    fn check_retractions(&self, tables: &Tables) -> StoreResult<()> {
        for write in &self.writes {
            if let Write::RetractActivity(id) = write {
                let paired = tables
                    .activities
                    .iter()
                    .find(|a| a.id == *id)
                    .is_some_and(|a| self.compensates(a.document_id));
                if !paired {
                    return Err(StoreError::UnpairedRetraction { id: *id });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryTransaction for InMemoryTransaction {
    async fn insert_document(&mut self, document: NewDocument) -> StoreResult<Document> {
        let document = document.into_document(self.repo.next_document_id());
        self.writes.push(Write::InsertDocument(document.clone()));
        Ok(document)
    }

    async fn update_document(&mut self, document: &Document) -> StoreResult<()> {
        self.writes.push(Write::UpdateDocument(document.clone()));
        Ok(())
    }

    async fn require_live(&mut self, id: DocumentId, version: u64) -> StoreResult<()> {
        self.writes.push(Write::RequireLive(id, version));
        Ok(())
    }

    async fn remove_document(&mut self, id: DocumentId) -> StoreResult<()> {
        self.writes.push(Write::RemoveDocument(id));
        Ok(())
    }

    async fn replace_tags(
        &mut self,
        id: DocumentId,
        tags: &[String],
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let rows = tags
            .iter()
            .map(|value| DocumentTag {
                document_id: id,
                value: value.clone(),
                created_at: at,
            })
            .collect();
        self.writes.push(Write::ReplaceTags(id, rows));
        Ok(())
    }

    async fn insert_share_if_absent(&mut self, share: DocumentShare) -> StoreResult<bool> {
        if self.repo.read().has_share(&share) || self.share_staged(&share) {
            return Ok(false);
        }
        self.writes.push(Write::InsertShare(share));
        Ok(true)
    }

    async fn append_activity(&mut self, activity: NewActivity) -> StoreResult<DocumentActivity> {
        let activity = activity.into_activity(self.repo.next_activity_id());
        self.writes.push(Write::AppendActivity(activity.clone()));
        Ok(activity)
    }

    async fn retract_compensated_activity(&mut self, id: ActivityId) -> StoreResult<()> {
        self.writes.push(Write::RetractActivity(id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.repo.check_available()?;
        let repo = self.repo.clone();
        let mut tables = repo.inner.tables.write().unwrap_or_else(|p| p.into_inner());
        self.check_retractions(&tables)?;
        let writes = self.writes;

        // Apply to a scratch copy so a failing write leaves nothing behind.
        let mut scratch = tables.clone();
        for write in writes {
            scratch.apply(write)?;
        }
        *tables = scratch;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ActivityKind, Category, UserId};

    fn new_doc(title: &str) -> NewDocument {
        NewDocument {
            title: title.into(),
            description: None,
            category: Category::Other,
            file_name: "a.txt".into(),
            file_path: "1/personal/a.txt".into(),
            content_type: "text/plain".into(),
            file_size_bytes: 1,
            owner_id: UserId(1),
            project_id: None,
            task_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let doc = tx.insert_document(new_doc("A")).await.unwrap();
        assert!(repo.document(doc.id).await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert_eq!(repo.document(doc.id).await.unwrap().unwrap().title, "A");
    }

    #[tokio::test]
    async fn test_drop_is_rollback() {
        let repo = InMemoryRepository::new();
        {
            let mut tx = repo.begin().await.unwrap();
            tx.insert_document(new_doc("A")).await.unwrap();
        }
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_version_conflict_aborts_whole_commit() {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let doc = tx.insert_document(new_doc("A")).await.unwrap();
        tx.commit().await.unwrap();

        // First writer wins.
        let mut first = doc.clone();
        first.title = "First".into();
        let mut tx = repo.begin().await.unwrap();
        tx.update_document(&first).await.unwrap();
        tx.commit().await.unwrap();

        // Second writer, holding the stale version, loses everything.
        let mut second = doc.clone();
        second.title = "Second".into();
        let mut tx = repo.begin().await.unwrap();
        tx.append_activity(NewActivity::new(doc.id, UserId(1), ActivityKind::MetadataEdit))
            .await
            .unwrap();
        tx.update_document(&second).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));

        let stored = repo.document(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "First");
        assert_eq!(stored.version, 2);
        assert_eq!(repo.activity_count(), 0);
    }

    #[tokio::test]
    async fn test_share_rows_are_unique() {
        let repo = InMemoryRepository::new();
        let share = DocumentShare {
            document_id: DocumentId(1),
            shared_with: UserId(2),
            shared_by: UserId(1),
            shared_at: Utc::now(),
        };

        let mut tx = repo.begin().await.unwrap();
        assert!(tx.insert_share_if_absent(share.clone()).await.unwrap());
        assert!(!tx.insert_share_if_absent(share.clone()).await.unwrap());
        tx.commit().await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        assert!(!tx.insert_share_if_absent(share).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(repo.shares(DocumentId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_retract() {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let doc = tx.insert_document(new_doc("A")).await.unwrap();
        tx.replace_tags(doc.id, &["x".to_string()], Utc::now())
            .await
            .unwrap();
        let activity = tx
            .append_activity(NewActivity::new(doc.id, UserId(1), ActivityKind::Upload))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(repo.tags(doc.id).await.unwrap().len(), 1);

        let mut tx = repo.begin().await.unwrap();
        tx.remove_document(doc.id).await.unwrap();
        tx.retract_compensated_activity(activity.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.is_empty());
        assert!(repo.tags(doc.id).await.unwrap().is_empty());
        assert_eq!(repo.activity_count(), 0);
    }

    #[tokio::test]
    async fn test_retraction_needs_compensating_write() {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let doc = tx.insert_document(new_doc("A")).await.unwrap();
        let activity = tx
            .append_activity(NewActivity::new(doc.id, UserId(1), ActivityKind::Upload))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        tx.retract_compensated_activity(activity.id).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::UnpairedRetraction { id } if id == activity.id));
        assert_eq!(repo.activity_count(), 1);

        // Restoring the row in the same transaction makes it a compensation.
        let mut tx = repo.begin().await.unwrap();
        tx.update_document(&doc).await.unwrap();
        tx.retract_compensated_activity(activity.id).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(repo.activity_count(), 0);
    }

    #[tokio::test]
    async fn test_require_live_guards_dependent_rows() {
        let repo = InMemoryRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let doc = tx.insert_document(new_doc("A")).await.unwrap();
        tx.commit().await.unwrap();

        let share = DocumentShare {
            document_id: doc.id,
            shared_with: UserId(2),
            shared_by: UserId(1),
            shared_at: Utc::now(),
        };

        let mut tx = repo.begin().await.unwrap();
        tx.require_live(doc.id, doc.version).await.unwrap();
        tx.insert_share_if_absent(share.clone()).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(repo.shares(doc.id).await.unwrap().len(), 1);

        // A concurrent edit bumps the version.
        let mut edited = doc.clone();
        edited.title = "B".into();
        let mut tx = repo.begin().await.unwrap();
        tx.update_document(&edited).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        tx.require_live(doc.id, doc.version).await.unwrap();
        tx.append_activity(NewActivity::new(doc.id, UserId(1), ActivityKind::Download))
            .await
            .unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        // A tombstoned row is gone for dependent writes.
        let mut deleted = repo.document(doc.id).await.unwrap().unwrap();
        deleted.tombstone(UserId(1), Utc::now());
        let mut tx = repo.begin().await.unwrap();
        tx.update_document(&deleted).await.unwrap();
        tx.commit().await.unwrap();

        let live = repo.document(doc.id).await.unwrap().unwrap();
        let mut tx = repo.begin().await.unwrap();
        tx.require_live(doc.id, live.version).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(repo.activity_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let repo = InMemoryRepository::new();
        repo.set_unavailable(true);
        assert!(matches!(
            repo.catalog().await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(repo.begin().await.is_err());

        repo.set_unavailable(false);
        assert!(repo.begin().await.is_ok());
    }
}
