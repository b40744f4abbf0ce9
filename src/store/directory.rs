//! In-memory user and project directory.

use crate::core::error::StoreResult;
use crate::core::model::{Project, UserProfile};
use crate::core::traits::Directory;
use crate::core::types::{ProjectId, UserId};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Entries {
    users: HashMap<UserId, UserProfile>,
    projects: HashMap<ProjectId, Project>,
}

/// In-memory [`Directory`]. Clones share the same entries.
///
/// # Examples
///
/// ```rust
/// use docbridge::core::{Project, ProjectId, Role, UserId, UserProfile};
/// use docbridge::store::InMemoryDirectory;
///
/// let directory = InMemoryDirectory::new()
///     .with_user(UserProfile::new(UserId(1), "Ada", Role::ProjectManager))
///     .with_project(Project::new(ProjectId(1), "Apollo", UserId(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    pub fn with_user(self, user: UserProfile) -> Self {
        self.upsert_user(user);
        self
    }

    /// Adds a project.
    pub fn with_project(self, project: Project) -> Self {
        self.upsert_project(project);
        self
    }

    /// Adds or replaces a user.
    pub fn upsert_user(&self, user: UserProfile) {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .users
            .insert(user.id, user);
    }

    /// Adds or replaces a project.
    pub fn upsert_project(&self, project: Project) {
        self.entries
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .projects
            .insert(project.id, project);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn user(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .users
            .get(&id)
            .cloned())
    }

    async fn project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .projects
            .get(&id)
            .cloned())
    }
}
