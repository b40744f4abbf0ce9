//! Access resolution over a snapshot of document facts.

use crate::core::{Document, Project, Role, UserId};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

static NO_SHARES: BTreeSet<UserId> = BTreeSet::new();

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// User identity.
    pub id: UserId,
    /// Role at the time the operation started.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns `true` for administrators.
    pub fn is_administrator(&self) -> bool {
        self.role.is_administrator()
    }
}

/// Why access was granted. The first matching reason wins, in declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessGrant {
    /// The actor uploaded the document.
    Uploader,
    /// The document was shared with the actor.
    SharedWith,
    /// The actor manages the document's project.
    ProjectManager,
    /// The actor is a member of the document's project.
    ProjectMember,
    /// The actor is an administrator.
    Administrator,
}

impl AccessGrant {
    /// Returns `true` if this grant also confers manage rights.
    pub fn confers_manage(self) -> bool {
        matches!(
            self,
            Self::Uploader | Self::ProjectManager | Self::Administrator
        )
    }
}

impl fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uploader => "uploader",
            Self::SharedWith => "shared_with",
            Self::ProjectManager => "project_manager",
            Self::ProjectMember => "project_member",
            Self::Administrator => "administrator",
        };
        f.write_str(s)
    }
}

/// Everything the resolver needs to know about one document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentFacts<'a> {
    /// The document row.
    pub document: &'a Document,
    /// The document's project, if it has one and it still exists.
    pub project: Option<&'a Project>,
    /// Recipients of shares on this document.
    pub shared_with: &'a BTreeSet<UserId>,
}

impl<'a> DocumentFacts<'a> {
    /// Facts for a document with no project and no shares.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            project: None,
            shared_with: &NO_SHARES,
        }
    }

    /// Sets the project. Ignored unless it is the document's project.
    pub fn with_project(mut self, project: Option<&'a Project>) -> Self {
        self.project = project.filter(|p| Some(p.id) == self.document.project_id);
        self
    }

    /// Sets the share recipients.
    pub fn with_shares(mut self, shared_with: &'a BTreeSet<UserId>) -> Self {
        self.shared_with = shared_with;
        self
    }
}

/// Decides who may see, fetch and manage documents.
///
/// All checks are pure predicates over the facts passed in. Deleted
/// documents grant nothing to anyone, administrators included.
///
/// # Examples
///
/// ```rust
/// use docbridge::access::{AccessResolver, Actor, DocumentFacts};
/// use docbridge::core::{Project, ProjectId, Role, UserId};
///
/// let project = Project::new(ProjectId(1), "Apollo", UserId(10)).with_member(UserId(11));
/// let member = Actor::new(UserId(11), Role::Employee);
/// assert!(AccessResolver::can_access_project(Some(&project), &member));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessResolver;

impl AccessResolver {
    /// Returns the reason the actor may view the document, if any.
    pub fn view_grant(facts: &DocumentFacts<'_>, actor: &Actor) -> Option<AccessGrant> {
        let document = facts.document;
        if document.is_deleted {
            return None;
        }
        if document.owner_id == actor.id {
            return Some(AccessGrant::Uploader);
        }
        if facts.shared_with.contains(&actor.id) {
            return Some(AccessGrant::SharedWith);
        }
        if let Some(project) = facts.project {
            if project.is_manager(actor.id) {
                return Some(AccessGrant::ProjectManager);
            }
            if project.is_member(actor.id) {
                return Some(AccessGrant::ProjectMember);
            }
        }
        if actor.is_administrator() {
            return Some(AccessGrant::Administrator);
        }
        None
    }

    /// Returns the reason the actor may manage the document, if any.
    ///
    /// Shares and plain project membership never confer manage rights.
    pub fn manage_grant(facts: &DocumentFacts<'_>, actor: &Actor) -> Option<AccessGrant> {
        let document = facts.document;
        if document.is_deleted {
            return None;
        }
        if document.owner_id == actor.id {
            return Some(AccessGrant::Uploader);
        }
        if facts.project.is_some_and(|p| p.is_manager(actor.id)) {
            return Some(AccessGrant::ProjectManager);
        }
        if actor.is_administrator() {
            return Some(AccessGrant::Administrator);
        }
        None
    }

    /// Returns `true` if the actor may view the document.
    pub fn can_view(facts: &DocumentFacts<'_>, actor: &Actor) -> bool {
        Self::view_grant(facts, actor).is_some()
    }

    /// Returns `true` if the actor may edit, replace, delete or share the
    /// document.
    pub fn can_manage(facts: &DocumentFacts<'_>, actor: &Actor) -> bool {
        Self::manage_grant(facts, actor).is_some()
    }

    /// Returns `true` if the actor may attach documents to, or list, the
    /// project. A missing project grants access to nobody.
    pub fn can_access_project(project: Option<&Project>, actor: &Actor) -> bool {
        match project {
            Some(project) => {
                project.is_manager(actor.id)
                    || project.is_member(actor.id)
                    || actor.is_administrator()
            }
            None => false,
        }
    }
}
