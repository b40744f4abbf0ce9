//! The document lifecycle engine.

use crate::access::{AccessGrant, AccessResolver, Actor, DocumentFacts};
use crate::audit;
use crate::core::{
    ActivityKind, ArcDirectory, ArcFileStore, ArcNotificationSink, ArcRepository, ArcScanQueue,
    Directory, Document, DocumentActivity, DocumentError, DocumentId, DocumentPolicy,
    DocumentRepository, DocumentResult, DocumentShare, DocumentView, FileStore, FileUpload,
    NewActivity, NewDocument, Notification, NotificationKind, NotificationPriority,
    NotificationSink, Project, ProjectId, ScanJob, ScanQueue, ScanStatus, UserId,
};
use crate::engine::cancel::{cancellable, ensure_active};
use crate::engine::requests::{
    DocumentContent, MetadataUpdate, ShareRequest, ShareSummary, UploadRequest,
};
use crate::engine::validate;
use crate::query::{Catalog, DocumentQuery, ListingEngine};
use crate::store::TracingNotificationSink;

use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Number of uploads `recent_documents` returns by default.
pub const DEFAULT_RECENT_COUNT: usize = 5;

/// Builder for creating a [`DocumentEngine`].
#[derive(Default)]
pub struct DocumentEngineBuilder {
    policy: Option<Arc<DocumentPolicy>>,
    repository: Option<ArcRepository>,
    directory: Option<ArcDirectory>,
    files: Option<ArcFileStore>,
    queue: Option<ArcScanQueue>,
    notifier: Option<ArcNotificationSink>,
}

impl DocumentEngineBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy. Defaults to [`DocumentPolicy::default`].
    pub fn with_policy(mut self, policy: DocumentPolicy) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    /// Sets a policy shared with other components.
    pub fn with_shared_policy(mut self, policy: Arc<DocumentPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the document repository.
    pub fn with_repository<R: DocumentRepository + 'static>(mut self, repository: R) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Sets the user and project directory.
    pub fn with_directory<D: Directory + 'static>(mut self, directory: D) -> Self {
        self.directory = Some(Arc::new(directory));
        self
    }

    /// Sets the file store.
    pub fn with_file_store<F: FileStore + 'static>(mut self, files: F) -> Self {
        self.files = Some(Arc::new(files));
        self
    }

    /// Sets the scan queue.
    pub fn with_scan_queue<Q: ScanQueue + 'static>(mut self, queue: Q) -> Self {
        self.queue = Some(Arc::new(queue));
        self
    }

    /// Sets the notification sink. Defaults to [`TracingNotificationSink`].
    pub fn with_notifier<N: NotificationSink + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Builds the engine. Fails if a required collaborator is missing.
    pub fn build(self) -> DocumentResult<DocumentEngine> {
        Ok(DocumentEngine {
            policy: self.policy.unwrap_or_default(),
            repository: self
                .repository
                .ok_or_else(|| DocumentError::unavailable("document store", "not configured"))?,
            directory: self
                .directory
                .ok_or_else(|| DocumentError::unavailable("directory", "not configured"))?,
            files: self
                .files
                .ok_or_else(|| DocumentError::unavailable("file store", "not configured"))?,
            queue: self
                .queue
                .ok_or_else(|| DocumentError::unavailable("scan queue", "not configured"))?,
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(TracingNotificationSink)),
        })
    }
}

/// A document row with the project and share facts needed to resolve
/// access to it.
struct Loaded {
    document: Document,
    project: Option<Project>,
    shared_with: BTreeSet<UserId>,
}

impl Loaded {
    fn facts(&self) -> DocumentFacts<'_> {
        DocumentFacts::new(&self.document)
            .with_project(self.project.as_ref())
            .with_shares(&self.shared_with)
    }
}

/// Orchestrates upload, scan gating, retrieval, edits, sharing and
/// deletion of documents.
///
/// Every operation takes the acting user's id and a cancellation token.
/// Each collaborator call is raced against the token; writes are staged in
/// one repository transaction that is only committed while the token is
/// still live.
///
/// # Examples
///
/// ```rust,no_run
/// use docbridge::prelude::*;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), DocumentError> {
/// let engine = DocumentEngine::builder()
///     .with_repository(InMemoryRepository::new())
///     .with_directory(InMemoryDirectory::new())
///     .with_file_store(InMemoryFileStore::new())
///     .with_scan_queue(InMemoryScanQueue::default())
///     .build()?;
///
/// let cancel = CancellationToken::new();
/// let document = engine
///     .upload(
///         UserId(1),
///         UploadRequest::new("Budget", "Reports"),
///         FileUpload::new(b"%PDF".to_vec(), "Budget.pdf", "application/pdf"),
///         &cancel,
///     )
///     .await?;
/// assert_eq!(document.scan_status, ScanStatus::Pending);
/// # Ok(())
/// # }
/// ```
pub struct DocumentEngine {
    policy: Arc<DocumentPolicy>,
    repository: ArcRepository,
    directory: ArcDirectory,
    files: ArcFileStore,
    queue: ArcScanQueue,
    notifier: ArcNotificationSink,
}

impl DocumentEngine {
    /// Creates a new builder.
    pub fn builder() -> DocumentEngineBuilder {
        DocumentEngineBuilder::new()
    }

    /// Returns the policy in force.
    pub fn policy(&self) -> &DocumentPolicy {
        &self.policy
    }

    /// Stores a new document and requests a scan of its content.
    ///
    /// All input is validated before the file store is touched. The
    /// document, its tags and the Upload activity are committed before the
    /// scan job is enqueued; if the enqueue fails, that commit is undone and
    /// the stored content removed.
    pub async fn upload(
        &self,
        actor_id: UserId,
        request: UploadRequest,
        file: FileUpload,
        cancel: &CancellationToken,
    ) -> DocumentResult<Document> {
        let title = validate::title(&self.policy, &request.title)?;
        let description = validate::description(&self.policy, request.description.as_deref())?;
        let category = validate::category(&self.policy, &request.category)?;
        let tags = validate::tags(&self.policy, &request.tags)?;
        validate::file(&self.policy, &file)?;

        let actor = self.actor(actor_id, cancel).await?;
        let project = match request.project_id {
            Some(project_id) => {
                let project = cancellable(cancel, self.directory.project(project_id)).await?;
                if !AccessResolver::can_access_project(project.as_ref(), &actor) {
                    return Err(DocumentError::unauthorized(format!(
                        "not authorized for project {}",
                        project_id
                    )));
                }
                project
            }
            None => None,
        };

        let file_path = cancellable(
            cancel,
            self.files.put(
                file.data(),
                file.file_name(),
                file.content_type(),
                actor.id,
                request.project_id,
            ),
        )
        .await?;

        let now = Utc::now();
        let new_document = NewDocument {
            title,
            description,
            category,
            file_name: file.file_name().to_string(),
            file_path: file_path.clone(),
            content_type: file.content_type().to_string(),
            file_size_bytes: file.size(),
            owner_id: actor.id,
            project_id: request.project_id,
            task_id: request.task_id,
            created_at: now,
        };

        let persisted = async {
            let mut tx = cancellable(cancel, self.repository.begin()).await?;
            let document = tx.insert_document(new_document).await?;
            tx.replace_tags(document.id, &tags, now).await?;
            let activity = tx
                .append_activity(
                    NewActivity::new(document.id, actor.id, ActivityKind::Upload)
                        .with_metadata(audit::upload_metadata(category, request.project_id))
                        .at(now),
                )
                .await?;
            ensure_active(cancel)?;
            tx.commit().await?;
            Ok::<_, DocumentError>((document, activity))
        }
        .await;

        let (document, activity) = match persisted {
            Ok(persisted) => persisted,
            Err(e) => {
                self.discard_content(&file_path).await;
                return Err(e);
            }
        };

        let job = ScanJob::for_document(&document);
        if let Err(e) = cancellable(cancel, self.queue.enqueue(&job)).await {
            self.undo_upload(&document, &activity, &e).await;
            return Err(e);
        }

        tracing::info!(
            document_id = %document.id,
            actor = %actor.id,
            project_id = ?document.project_id,
            size = document.file_size_bytes,
            "Document uploaded"
        );
        audit::emit_activity(&activity);

        if let Some(project) = project {
            let notifications = project
                .member_ids
                .iter()
                .filter(|member| **member != actor.id)
                .map(|member| Notification {
                    user_id: *member,
                    title: "New Project Document".to_string(),
                    message: format!(
                        "A new document '{}' was added to your project.",
                        document.title
                    ),
                    kind: NotificationKind::ProjectUpdate,
                    priority: NotificationPriority::Informational,
                })
                .collect();
            self.dispatch(notifications, cancel).await;
        }

        Ok(document)
    }

    /// Reads a document.
    ///
    /// Returns `None` both when the document does not exist (or is deleted)
    /// and when the caller may not view it.
    pub async fn get_document(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<Option<DocumentView>> {
        let actor = self.actor(actor_id, cancel).await?;
        let loaded = match self.load(document_id, cancel).await {
            Ok(loaded) => loaded,
            Err(DocumentError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        if !AccessResolver::can_view(&loaded.facts(), &actor) {
            return Ok(None);
        }
        self.render(loaded, cancel).await.map(Some)
    }

    /// Lists the documents the caller may view, filtered and ordered by
    /// `query` and capped at the policy's listing limit.
    pub async fn list_documents(
        &self,
        actor_id: UserId,
        query: &DocumentQuery,
        cancel: &CancellationToken,
    ) -> DocumentResult<Vec<DocumentView>> {
        let actor = self.actor(actor_id, cancel).await?;
        let catalog = self.catalog(cancel).await?;
        Ok(self.listing().list(&catalog, &actor, query))
    }

    /// Lists a project's documents, newest first.
    ///
    /// Callers without access to the project get an empty list.
    pub async fn project_documents(
        &self,
        project_id: ProjectId,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<Vec<DocumentView>> {
        let actor = self.actor(actor_id, cancel).await?;
        let project = cancellable(cancel, self.directory.project(project_id)).await?;
        if !AccessResolver::can_access_project(project.as_ref(), &actor) {
            tracing::debug!(project_id = %project_id, actor = %actor.id, "No project access");
            return Ok(Vec::new());
        }
        let catalog = self.catalog(cancel).await?;
        Ok(self.listing().in_project(&catalog, project_id))
    }

    /// Lists documents explicitly shared with the caller, newest first.
    pub async fn shared_with_me(
        &self,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<Vec<DocumentView>> {
        let actor = self.actor(actor_id, cancel).await?;
        let catalog = self.catalog(cancel).await?;
        Ok(self.listing().shared_with(&catalog, &actor))
    }

    /// Lists the caller's own most recent uploads, at most `top`.
    pub async fn recent_documents(
        &self,
        actor_id: UserId,
        top: usize,
        cancel: &CancellationToken,
    ) -> DocumentResult<Vec<DocumentView>> {
        let actor = self.actor(actor_id, cancel).await?;
        let catalog = self.catalog(cancel).await?;
        Ok(self.listing().uploaded_by(&catalog, &actor, top))
    }

    /// Counts the caller's own live uploads.
    pub async fn document_count(
        &self,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<usize> {
        let rows = cancellable(cancel, self.repository.catalog()).await?;
        Ok(rows
            .documents
            .iter()
            .filter(|d| !d.is_deleted && d.owner_id == actor_id)
            .count())
    }

    /// Releases a document's content as an attachment.
    pub async fn download(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<DocumentContent> {
        self.fetch(document_id, actor_id, ActivityKind::Download, cancel)
            .await
    }

    /// Releases a document's content for inline display.
    ///
    /// Only the policy's previewable content types are accepted.
    pub async fn preview(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<DocumentContent> {
        self.fetch(document_id, actor_id, ActivityKind::Preview, cancel)
            .await
    }

    /// Applies a partial metadata update.
    pub async fn update_metadata(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        update: MetadataUpdate,
        cancel: &CancellationToken,
    ) -> DocumentResult<Document> {
        let actor = self.actor(actor_id, cancel).await?;
        let loaded = self.load(document_id, cancel).await?;
        self.require_manage(&loaded, &actor)?;
        let mut document = loaded.document;
        let mut changed = Vec::new();

        if let Some(raw) = update.title.as_deref().filter(|t| !t.trim().is_empty()) {
            let title = validate::title(&self.policy, raw)?;
            if title != document.title {
                document.title = title;
                changed.push("title");
            }
        }

        if let Some(raw) = update.description.as_deref() {
            let description = validate::description(&self.policy, Some(raw))?;
            if description != document.description {
                document.description = description;
                changed.push("description");
            }
        }

        if let Some(label) = update.category.as_deref() {
            match self.policy.accept_category(label) {
                Some(category) if category != document.category => {
                    document.category = category;
                    changed.push("category");
                }
                Some(_) => {}
                None => tracing::debug!(
                    document_id = %document.id,
                    category = %label,
                    "Ignoring unsupported category"
                ),
            }
        }

        let tags = match update.tags.as_deref() {
            Some(raw) => {
                let tags = validate::tags(&self.policy, raw)?;
                let stored = cancellable(cancel, self.repository.tags(document.id)).await?;
                let unchanged = stored.len() == tags.len()
                    && stored.iter().zip(&tags).all(|(old, new)| old.value == *new);
                if unchanged {
                    None
                } else {
                    changed.push("tags");
                    Some(tags)
                }
            }
            None => None,
        };

        let now = Utc::now();
        document.updated_at = now;

        let mut tx = cancellable(cancel, self.repository.begin()).await?;
        tx.update_document(&document).await?;
        if let Some(tags) = &tags {
            tx.replace_tags(document.id, tags, now).await?;
        }
        let activity = tx
            .append_activity(
                NewActivity::new(document.id, actor.id, ActivityKind::MetadataEdit)
                    .with_metadata(audit::metadata_edit_metadata(&changed))
                    .at(now),
            )
            .await?;
        ensure_active(cancel)?;
        tx.commit().await?;
        document.version += 1;

        tracing::info!(
            document_id = %document.id,
            actor = %actor.id,
            changed = ?changed,
            "Document metadata updated"
        );
        audit::emit_activity(&activity);

        Ok(document)
    }

    /// Swaps a document's content and requests a fresh scan.
    ///
    /// The scan state always returns to `Pending`. The previous content is
    /// removed only once the new scan job is queued; if queueing fails the
    /// document is restored to its previous row and content.
    pub async fn replace_file(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        file: FileUpload,
        cancel: &CancellationToken,
    ) -> DocumentResult<Document> {
        let actor = self.actor(actor_id, cancel).await?;
        let loaded = self.load(document_id, cancel).await?;
        self.require_manage(&loaded, &actor)?;
        validate::file(&self.policy, &file)?;

        let previous = loaded.document;
        let new_path = cancellable(
            cancel,
            self.files.put(
                file.data(),
                file.file_name(),
                file.content_type(),
                previous.owner_id,
                previous.project_id,
            ),
        )
        .await?;

        let now = Utc::now();
        let mut document = previous.clone();
        document.file_name = file.file_name().to_string();
        document.file_path = new_path.clone();
        document.content_type = file.content_type().to_string();
        document.file_size_bytes = file.size();
        document.reset_scan(now);
        document.updated_at = now;

        let persisted = async {
            let mut tx = cancellable(cancel, self.repository.begin()).await?;
            tx.update_document(&document).await?;
            let activity = tx
                .append_activity(
                    NewActivity::new(document.id, actor.id, ActivityKind::Replace)
                        .with_metadata(audit::replace_metadata(
                            &document.file_name,
                            document.file_size_bytes,
                        ))
                        .at(now),
                )
                .await?;
            ensure_active(cancel)?;
            tx.commit().await?;
            Ok::<_, DocumentError>(activity)
        }
        .await;

        let activity = match persisted {
            Ok(activity) => activity,
            Err(e) => {
                self.discard_content(&new_path).await;
                return Err(e);
            }
        };
        document.version += 1;

        let job = ScanJob::for_document(&document);
        if let Err(e) = cancellable(cancel, self.queue.enqueue(&job)).await {
            self.undo_replace(&previous, &document, &activity, &e).await;
            return Err(e);
        }

        self.discard_content(&previous.file_path).await;

        tracing::info!(
            document_id = %document.id,
            actor = %actor.id,
            previous_status = %previous.scan_status,
            size = document.file_size_bytes,
            "Document content replaced"
        );
        audit::emit_activity(&activity);

        Ok(document)
    }

    /// Soft-deletes a document and removes its content.
    ///
    /// A deleted document is gone for every caller: a second delete fails
    /// with `NotFound`.
    pub async fn delete(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        cancel: &CancellationToken,
    ) -> DocumentResult<()> {
        let actor = self.actor(actor_id, cancel).await?;
        let loaded = self.load(document_id, cancel).await?;
        self.require_manage(&loaded, &actor)?;

        let now = Utc::now();
        let mut document = loaded.document;
        document.tombstone(actor.id, now);

        let mut tx = cancellable(cancel, self.repository.begin()).await?;
        tx.update_document(&document).await?;
        let activity = tx
            .append_activity(NewActivity::new(document.id, actor.id, ActivityKind::Delete).at(now))
            .await?;
        ensure_active(cancel)?;
        tx.commit().await?;

        self.discard_content(&document.file_path).await;

        tracing::info!(document_id = %document.id, actor = %actor.id, "Document deleted");
        audit::emit_activity(&activity);

        Ok(())
    }

    /// Grants read access to other users.
    ///
    /// Each distinct recipient other than the caller gets a share row if
    /// they do not already hold one. Every recipient is notified and
    /// logged on every call, including repeats.
    pub async fn share(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        request: ShareRequest,
        cancel: &CancellationToken,
    ) -> DocumentResult<ShareSummary> {
        let actor = self.actor(actor_id, cancel).await?;
        let loaded = self.load(document_id, cancel).await?;
        self.require_manage(&loaded, &actor)?;
        let document = loaded.document;

        let mut seen = HashSet::new();
        let recipients: Vec<UserId> = request
            .user_ids
            .into_iter()
            .filter(|id| *id != actor.id && seen.insert(*id))
            .collect();

        let now = Utc::now();
        let mut newly_shared = Vec::new();
        let mut activities: Vec<DocumentActivity> = Vec::with_capacity(recipients.len());

        let mut tx = cancellable(cancel, self.repository.begin()).await?;
        tx.require_live(document.id, document.version).await?;
        for recipient in &recipients {
            let created = tx
                .insert_share_if_absent(DocumentShare {
                    document_id: document.id,
                    shared_with: *recipient,
                    shared_by: actor.id,
                    shared_at: now,
                })
                .await?;
            if created {
                newly_shared.push(*recipient);
            }
            activities.push(
                tx.append_activity(
                    NewActivity::new(document.id, actor.id, ActivityKind::Share)
                        .with_target(*recipient)
                        .at(now),
                )
                .await?,
            );
        }
        ensure_active(cancel)?;
        tx.commit().await?;

        tracing::info!(
            document_id = %document.id,
            actor = %actor.id,
            recipients = recipients.len(),
            new_shares = newly_shared.len(),
            "Document shared"
        );
        activities.iter().for_each(audit::emit_activity);

        let notifications = recipients
            .iter()
            .map(|recipient| Notification {
                user_id: *recipient,
                title: "Document Shared".to_string(),
                message: format!("{} was shared with you.", document.title),
                kind: NotificationKind::ProjectUpdate,
                priority: NotificationPriority::Important,
            })
            .collect();
        self.dispatch(notifications, cancel).await;

        Ok(ShareSummary {
            recipients,
            newly_shared,
        })
    }

    async fn fetch(
        &self,
        document_id: DocumentId,
        actor_id: UserId,
        kind: ActivityKind,
        cancel: &CancellationToken,
    ) -> DocumentResult<DocumentContent> {
        let actor = self.actor(actor_id, cancel).await?;
        let loaded = self.load(document_id, cancel).await?;
        self.require_view(&loaded, &actor)?;
        let document = loaded.document;

        match document.scan_status {
            ScanStatus::Clean => {}
            ScanStatus::Pending => return Err(DocumentError::ScanPending { id: document.id }),
            ScanStatus::Rejected => {
                return Err(DocumentError::ScanRejected {
                    id: document.id,
                    reason: document.scan_failure_reason.clone(),
                })
            }
        }

        if kind == ActivityKind::Preview && !self.policy.allows_preview(&document.content_type) {
            return Err(DocumentError::PreviewUnsupported {
                content_type: document.content_type.clone(),
            });
        }

        let data = cancellable(cancel, self.files.get(&document.file_path)).await?;

        let mut tx = cancellable(cancel, self.repository.begin()).await?;
        tx.require_live(document.id, document.version).await?;
        let activity = tx
            .append_activity(NewActivity::new(document.id, actor.id, kind))
            .await?;
        ensure_active(cancel)?;
        tx.commit().await?;

        tracing::debug!(
            document_id = %document.id,
            actor = %actor.id,
            activity = kind.as_str(),
            "Document content released"
        );
        audit::emit_activity(&activity);

        Ok(DocumentContent {
            data,
            content_type: document.content_type,
            file_name: document.file_name,
        })
    }

    async fn actor(&self, id: UserId, cancel: &CancellationToken) -> DocumentResult<Actor> {
        let role = cancellable(cancel, self.directory.role(id)).await?;
        Ok(Actor::new(id, role))
    }

    /// Loads a live document with its access facts. Deleted and unknown
    /// documents are `NotFound`.
    async fn load(&self, id: DocumentId, cancel: &CancellationToken) -> DocumentResult<Loaded> {
        let document = cancellable(cancel, self.repository.document(id))
            .await?
            .filter(|d| !d.is_deleted)
            .ok_or(DocumentError::NotFound { id })?;

        let project = match document.project_id {
            Some(project_id) => cancellable(cancel, self.directory.project(project_id)).await?,
            None => None,
        };
        let shared_with = cancellable(cancel, self.repository.shares(id))
            .await?
            .into_iter()
            .map(|s| s.shared_with)
            .collect();

        Ok(Loaded {
            document,
            project,
            shared_with,
        })
    }

    /// Callers without view access cannot tell the document exists.
    fn require_view(&self, loaded: &Loaded, actor: &Actor) -> DocumentResult<AccessGrant> {
        AccessResolver::view_grant(&loaded.facts(), actor).ok_or(DocumentError::NotFound {
            id: loaded.document.id,
        })
    }

    fn require_manage(&self, loaded: &Loaded, actor: &Actor) -> DocumentResult<AccessGrant> {
        self.require_view(loaded, actor)?;
        AccessResolver::manage_grant(&loaded.facts(), actor).ok_or_else(|| {
            DocumentError::unauthorized(format!(
                "user {} may not manage document {}",
                actor.id, loaded.document.id
            ))
        })
    }

    async fn render(
        &self,
        loaded: Loaded,
        cancel: &CancellationToken,
    ) -> DocumentResult<DocumentView> {
        let tags = cancellable(cancel, self.repository.tags(loaded.document.id))
            .await?
            .into_iter()
            .map(|t| t.value)
            .collect();
        let uploader = cancellable(cancel, self.directory.user(loaded.document.owner_id)).await?;

        Ok(DocumentView {
            tags,
            uploader_name: uploader.map(|u| u.display_name),
            project_name: loaded.project.map(|p| p.name),
            document: loaded.document,
        })
    }

    async fn catalog(&self, cancel: &CancellationToken) -> DocumentResult<Catalog> {
        let rows = cancellable(cancel, self.repository.catalog()).await?;

        let mut projects = Vec::new();
        for project_id in Catalog::referenced_projects(&rows) {
            if let Some(project) = cancellable(cancel, self.directory.project(project_id)).await? {
                projects.push(project);
            }
        }
        let mut users = Vec::new();
        for user_id in Catalog::referenced_users(&rows) {
            if let Some(user) = cancellable(cancel, self.directory.user(user_id)).await? {
                users.push(user);
            }
        }

        Ok(Catalog::new(rows, projects, users))
    }

    fn listing(&self) -> ListingEngine {
        ListingEngine::new(self.policy.list_limit)
    }

    /// Delivers notifications concurrently. Failures are logged and never
    /// reach the caller; cancellation abandons delivery.
    async fn dispatch(&self, notifications: Vec<Notification>, cancel: &CancellationToken) {
        if notifications.is_empty() {
            return;
        }

        let deliveries = notifications.into_iter().map(|n| {
            let user_id = n.user_id;
            async move { (user_id, self.notifier.notify(n).await) }
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Notification delivery abandoned");
            }
            results = join_all(deliveries) => {
                for (user_id, result) in results {
                    if let Err(e) = result {
                        tracing::warn!(user_id = %user_id, error = %e, "Notification failed");
                    }
                }
            }
        }
    }

    /// Best-effort content removal. Leftovers are reclaimed out of band.
    async fn discard_content(&self, path: &str) {
        if let Err(e) = self.files.delete(path).await {
            tracing::warn!(path = %path, error = %e, "Failed to remove stored content");
        }
    }

    /// Removes a committed upload whose scan job could not be queued.
    async fn undo_upload(
        &self,
        document: &Document,
        activity: &DocumentActivity,
        cause: &DocumentError,
    ) {
        let undone = async {
            let mut tx = self.repository.begin().await?;
            tx.remove_document(document.id).await?;
            tx.retract_compensated_activity(activity.id).await?;
            tx.commit().await
        }
        .await;

        match undone {
            Ok(()) => audit::emit_compensation(document.id, "upload", &cause.to_string()),
            Err(e) => tracing::error!(
                document_id = %document.id,
                error = %e,
                "Failed to roll back upload"
            ),
        }
        self.discard_content(&document.file_path).await;
    }

    /// Restores the pre-replace row after the new scan job could not be
    /// queued, and removes the new content.
    async fn undo_replace(
        &self,
        previous: &Document,
        current: &Document,
        activity: &DocumentActivity,
        cause: &DocumentError,
    ) {
        let mut restored = previous.clone();
        restored.version = current.version;

        let undone = async {
            let mut tx = self.repository.begin().await?;
            tx.update_document(&restored).await?;
            tx.retract_compensated_activity(activity.id).await?;
            tx.commit().await
        }
        .await;

        match undone {
            Ok(()) => {
                audit::emit_compensation(current.id, "replace", &cause.to_string());
                self.discard_content(&current.file_path).await;
            }
            Err(e) => tracing::error!(
                document_id = %current.id,
                error = %e,
                "Failed to roll back replace"
            ),
        }
    }
}

impl std::fmt::Debug for DocumentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEngine")
            .field("policy", &self.policy)
            .field("repository", &self.repository)
            .field("files", &self.files)
            .field("queue", &self.queue)
            .finish()
    }
}
