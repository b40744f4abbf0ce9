//! Access-scoped listing over a catalog snapshot.

use crate::access::{AccessResolver, Actor, DocumentFacts};
use crate::core::{
    CatalogRows, Document, DocumentId, DocumentView, Project, ProjectId, UserId, UserProfile,
};
use crate::query::filter::{DocumentQuery, DocumentSort};

use std::collections::{BTreeSet, HashMap};

static NO_SHARES: BTreeSet<UserId> = BTreeSet::new();

/// A consistent snapshot of documents and the facts needed to scope,
/// filter and render them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: Vec<Document>,
    tags: HashMap<DocumentId, Vec<String>>,
    shares: HashMap<DocumentId, BTreeSet<UserId>>,
    projects: HashMap<ProjectId, Project>,
    users: HashMap<UserId, UserProfile>,
}

impl Catalog {
    /// Builds a catalog from repository rows plus the projects and users
    /// they reference. Deleted rows are dropped here and never seen again.
    pub fn new(
        rows: CatalogRows,
        projects: impl IntoIterator<Item = Project>,
        users: impl IntoIterator<Item = UserProfile>,
    ) -> Self {
        let documents: Vec<Document> = rows
            .documents
            .into_iter()
            .filter(|d| !d.is_deleted)
            .collect();

        let mut tags: HashMap<DocumentId, Vec<String>> = HashMap::new();
        for tag in rows.tags {
            tags.entry(tag.document_id).or_default().push(tag.value);
        }

        let mut shares: HashMap<DocumentId, BTreeSet<UserId>> = HashMap::new();
        for share in rows.shares {
            shares
                .entry(share.document_id)
                .or_default()
                .insert(share.shared_with);
        }

        Self {
            documents,
            tags,
            shares,
            projects: projects.into_iter().map(|p| (p.id, p)).collect(),
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    /// Project ids referenced by live documents.
    pub fn referenced_projects(rows: &CatalogRows) -> BTreeSet<ProjectId> {
        rows.documents
            .iter()
            .filter(|d| !d.is_deleted)
            .filter_map(|d| d.project_id)
            .collect()
    }

    /// Uploader ids referenced by live documents.
    pub fn referenced_users(rows: &CatalogRows) -> BTreeSet<UserId> {
        rows.documents
            .iter()
            .filter(|d| !d.is_deleted)
            .map(|d| d.owner_id)
            .collect()
    }

    /// Number of live documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if there are no live documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Live documents.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Access facts for one document of this catalog.
    pub fn facts<'a>(&'a self, document: &'a Document) -> DocumentFacts<'a> {
        DocumentFacts::new(document)
            .with_project(document.project_id.and_then(|id| self.projects.get(&id)))
            .with_shares(self.shares.get(&document.id).unwrap_or(&NO_SHARES))
    }

    /// Renders one document of this catalog.
    pub fn view(&self, document: &Document) -> DocumentView {
        DocumentView {
            document: document.clone(),
            tags: self.tags.get(&document.id).cloned().unwrap_or_default(),
            uploader_name: self
                .users
                .get(&document.owner_id)
                .map(|u| u.display_name.clone()),
            project_name: document
                .project_id
                .and_then(|id| self.projects.get(&id))
                .map(|p| p.name.clone()),
        }
    }

    /// Documents the actor may view.
    pub fn visible_to<'a>(&'a self, actor: &'a Actor) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents
            .iter()
            .filter(move |d| AccessResolver::can_view(&self.facts(d), actor))
    }
}

/// Turns a catalog snapshot into an access-scoped, filtered, ordered page.
///
/// Deterministic for identical inputs.
#[derive(Debug, Clone, Copy)]
pub struct ListingEngine {
    limit: usize,
}

impl ListingEngine {
    /// Creates an engine capping results at `limit` rows.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// Returns the row cap.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Scopes to the actor's view access, filters, sorts and caps.
    pub fn list(
        &self,
        catalog: &Catalog,
        actor: &Actor,
        query: &DocumentQuery,
    ) -> Vec<DocumentView> {
        let mut views: Vec<DocumentView> = catalog
            .visible_to(actor)
            .map(|d| catalog.view(d))
            .filter(|v| query.matches(v))
            .collect();

        views.sort_by(|a, b| query.sort.compare(&a.document, &b.document));
        views.truncate(self.limit);

        tracing::debug!(
            actor = %actor.id,
            catalog_size = catalog.len(),
            returned = views.len(),
            "Listed documents"
        );

        views
    }

    /// Documents shared with the actor, newest first. Not capped.
    pub fn shared_with(&self, catalog: &Catalog, actor: &Actor) -> Vec<DocumentView> {
        self.newest_first(
            catalog,
            catalog
                .documents
                .iter()
                .filter(|d| catalog.shares.get(&d.id).is_some_and(|s| s.contains(&actor.id))),
            usize::MAX,
        )
    }

    /// Every document of a project, newest first. Not capped.
    ///
    /// Callers check project access first.
    pub fn in_project(&self, catalog: &Catalog, project_id: ProjectId) -> Vec<DocumentView> {
        self.newest_first(
            catalog,
            catalog
                .documents
                .iter()
                .filter(|d| d.project_id == Some(project_id)),
            usize::MAX,
        )
    }

    /// The actor's own uploads, newest first, at most `top`.
    pub fn uploaded_by(&self, catalog: &Catalog, actor: &Actor, top: usize) -> Vec<DocumentView> {
        self.newest_first(
            catalog,
            catalog.documents.iter().filter(|d| d.owner_id == actor.id),
            top.min(self.limit),
        )
    }

    fn newest_first<'a>(
        &self,
        catalog: &Catalog,
        documents: impl Iterator<Item = &'a Document>,
        take: usize,
    ) -> Vec<DocumentView> {
        let sort = DocumentSort::default();
        let mut documents: Vec<&Document> = documents.collect();
        documents.sort_by(|a, b| sort.compare(a, b));
        documents
            .into_iter()
            .take(take)
            .map(|d| catalog.view(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, DocumentShare, DocumentTag, NewDocument, Role};
    use crate::query::{SortDirection, SortKey};
    use chrono::{Duration, TimeZone, Utc};

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);
    const CAROL: UserId = UserId(3);
    const ADMIN: UserId = UserId(9);

    fn doc(id: i64, owner: UserId, project: Option<i64>, title: &str, size: u64) -> Document {
        NewDocument {
            title: title.into(),
            description: None,
            category: Category::Reports,
            file_name: "f.pdf".into(),
            file_path: format!("p/{}", id),
            content_type: "application/pdf".into(),
            file_size_bytes: size,
            owner_id: owner,
            project_id: project.map(ProjectId),
            task_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(id),
        }
        .into_document(DocumentId(id))
    }

    fn catalog() -> Catalog {
        let mut deleted = doc(5, ALICE, None, "Gone", 1);
        deleted.tombstone(ALICE, Utc::now());

        let rows = CatalogRows {
            documents: vec![
                doc(1, ALICE, None, "Alpha", 300),
                doc(2, BOB, Some(7), "Bravo", 100),
                doc(3, BOB, None, "Charlie", 200),
                doc(4, CAROL, None, "Delta", 400),
                deleted,
            ],
            tags: vec![DocumentTag {
                document_id: DocumentId(3),
                value: "Invoices".into(),
                created_at: Utc::now(),
            }],
            shares: vec![DocumentShare {
                document_id: DocumentId(3),
                shared_with: ALICE,
                shared_by: BOB,
                shared_at: Utc::now(),
            }],
        };
        let projects = vec![Project::new(ProjectId(7), "Apollo", CAROL).with_member(ALICE)];
        let users = vec![
            UserProfile::new(ALICE, "Alice", Role::Employee),
            UserProfile::new(BOB, "Bob", Role::Employee),
            UserProfile::new(CAROL, "Carol", Role::ProjectManager),
        ];
        Catalog::new(rows, projects, users)
    }

    fn ids(views: &[DocumentView]) -> Vec<i64> {
        views.iter().map(|v| v.document.id.get()).collect()
    }

    #[test]
    fn test_scope_matches_view_predicate() {
        let catalog = catalog();
        let engine = ListingEngine::new(500);

        // Alice: own (1), project member (2), shared (3).
        let alice = Actor::new(ALICE, Role::Employee);
        let mut listed = ids(&engine.list(&catalog, &alice, &DocumentQuery::new()));
        listed.sort();
        assert_eq!(listed, vec![1, 2, 3]);

        // Carol manages project 7 and owns 4.
        let carol = Actor::new(CAROL, Role::ProjectManager);
        let mut listed = ids(&engine.list(&catalog, &carol, &DocumentQuery::new()));
        listed.sort();
        assert_eq!(listed, vec![2, 4]);
    }

    #[test]
    fn test_administrator_sees_everything_but_deleted() {
        let catalog = catalog();
        let admin = Actor::new(ADMIN, Role::Administrator);
        let listed = ids(&ListingEngine::new(500).list(&catalog, &admin, &DocumentQuery::new()));
        assert_eq!(listed, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_sorting() {
        let catalog = catalog();
        let admin = Actor::new(ADMIN, Role::Administrator);
        let engine = ListingEngine::new(500);

        let query = DocumentQuery::new().sorted_by(SortKey::FileSizeBytes, SortDirection::Asc);
        assert_eq!(ids(&engine.list(&catalog, &admin, &query)), vec![2, 3, 1, 4]);

        let query = DocumentQuery::new().sorted_by(SortKey::Title, SortDirection::Desc);
        assert_eq!(ids(&engine.list(&catalog, &admin, &query)), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_search_uses_joined_fields() {
        let catalog = catalog();
        let admin = Actor::new(ADMIN, Role::Administrator);
        let engine = ListingEngine::new(500);

        let by_tag = engine.list(&catalog, &admin, &DocumentQuery::new().with_search("invoice"));
        assert_eq!(ids(&by_tag), vec![3]);
        assert_eq!(by_tag[0].tags, vec!["Invoices".to_string()]);

        let query = DocumentQuery::new().with_search("APOLLO");
        let by_project = engine.list(&catalog, &admin, &query);
        assert_eq!(ids(&by_project), vec![2]);

        let query = DocumentQuery::new().with_search("carol");
        let by_uploader = engine.list(&catalog, &admin, &query);
        assert_eq!(ids(&by_uploader), vec![4]);
    }

    #[test]
    fn test_limit_caps_results() {
        let catalog = catalog();
        let admin = Actor::new(ADMIN, Role::Administrator);
        let listed = ListingEngine::new(2).list(&catalog, &admin, &DocumentQuery::new());
        assert_eq!(ids(&listed), vec![4, 3]);
    }

    #[test]
    fn test_shared_with_and_uploaded_by() {
        let catalog = catalog();
        let engine = ListingEngine::new(500);
        let alice = Actor::new(ALICE, Role::Employee);
        let bob = Actor::new(BOB, Role::Employee);

        assert_eq!(ids(&engine.shared_with(&catalog, &alice)), vec![3]);
        assert!(engine.shared_with(&catalog, &bob).is_empty());

        assert_eq!(ids(&engine.uploaded_by(&catalog, &bob, 5)), vec![3, 2]);
        assert_eq!(ids(&engine.uploaded_by(&catalog, &bob, 1)), vec![3]);
        // The tombstoned upload is not counted.
        assert_eq!(ids(&engine.uploaded_by(&catalog, &alice, 5)), vec![1]);
    }

    #[test]
    fn test_shared_and_project_listings_ignore_cap() {
        let catalog = catalog();
        let engine = ListingEngine::new(1);
        let alice = Actor::new(ALICE, Role::Employee);

        assert_eq!(ids(&engine.shared_with(&catalog, &alice)), vec![3]);
        assert_eq!(ids(&engine.in_project(&catalog, ProjectId(7))), vec![2]);
        assert!(engine.in_project(&catalog, ProjectId(8)).is_empty());

        let many = Catalog::new(
            CatalogRows {
                documents: (1..=4).map(|id| doc(id, BOB, Some(7), "P", 1)).collect(),
                tags: Vec::new(),
                shares: (1..=4)
                    .map(|id| DocumentShare {
                        document_id: DocumentId(id),
                        shared_with: ALICE,
                        shared_by: BOB,
                        shared_at: Utc::now(),
                    })
                    .collect(),
            },
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(ids(&engine.in_project(&many, ProjectId(7))), vec![4, 3, 2, 1]);
        assert_eq!(ids(&engine.shared_with(&many, &alice)), vec![4, 3, 2, 1]);
        assert_eq!(engine.list(&many, &alice, &DocumentQuery::new()).len(), 1);
    }

    #[test]
    fn test_deleted_never_listed() {
        let catalog = catalog();
        let alice = Actor::new(ALICE, Role::Employee);
        let query = DocumentQuery::new().with_search("gone");
        let listed = ListingEngine::new(500).list(&catalog, &alice, &query);
        assert!(listed.is_empty());
        assert_eq!(catalog.len(), 4);
    }
}
