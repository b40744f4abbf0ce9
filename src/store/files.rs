//! File store implementations.

use crate::core::error::{FileStoreError, FileStoreResult};
use crate::core::model::file_extension;
use crate::core::traits::FileStore;
use crate::core::types::{ProjectId, UserId};

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Builds the relative path a new file is stored under:
/// `{owner}/{project|personal}/{uuid}{.ext}`.
fn storage_path(file_name: &str, owner: UserId, project: Option<ProjectId>) -> String {
    let segment = project
        .map(|p| p.to_string())
        .unwrap_or_else(|| "personal".to_string());
    let extension = file_extension(file_name).unwrap_or_default();
    format!("{}/{}/{}{}", owner, segment, Uuid::new_v4().simple(), extension)
}

/// Filesystem-backed file store.
///
/// Content lives under a root directory, one file per stored upload, with
/// randomised names so user-supplied filenames never reach the disk.
///
/// # Directory Structure
///
/// ```text
/// root/
/// └── {owner}/
///     ├── personal/
///     │   └── {uuid}.pdf
///     └── {project}/
///         └── {uuid}.xlsx
/// ```
#[derive(Debug)]
pub struct FilesystemFileStore {
    root: PathBuf,
}

impl FilesystemFileStore {
    /// Creates a store rooted at the given directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> FileStoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| FileStoreError::WriteFailed {
            reason: format!("Failed to create root directory: {}", e),
        })?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a stored path against the root. Absolute paths and paths
    /// that climb out of the root are rejected.
    fn resolve(&self, path: &str) -> FileStoreResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(FileStoreError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn put(
        &self,
        data: &[u8],
        file_name: &str,
        _content_type: &str,
        owner: UserId,
        project: Option<ProjectId>,
    ) -> FileStoreResult<String> {
        let relative = storage_path(file_name, owner, project);
        let full = self.resolve(&relative)?;

        if let Some(dir) = full.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| FileStoreError::WriteFailed {
                    reason: format!("Failed to create directory: {}", e),
                })?;
        }
        tokio::fs::write(&full, data)
            .await
            .map_err(|e| FileStoreError::WriteFailed {
                reason: format!("Failed to write file: {}", e),
            })?;

        tracing::debug!(path = %relative, size = data.len(), "Stored file");
        Ok(relative)
    }

    async fn get(&self, path: &str) -> FileStoreResult<Vec<u8>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FileStoreError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> FileStoreResult<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                tracing::debug!(path = %path, "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory file store, for tests and demos.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryFileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if content exists at the path.
    pub fn contains(&self, path: &str) -> bool {
        self.files
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(path)
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn put(
        &self,
        data: &[u8],
        file_name: &str,
        _content_type: &str,
        owner: UserId,
        project: Option<ProjectId>,
    ) -> FileStoreResult<String> {
        let path = storage_path(file_name, owner, project);
        self.files
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(path.clone(), data.to_vec());
        Ok(path)
    }

    async fn get(&self, path: &str) -> FileStoreResult<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| FileStoreError::NotFound {
                path: path.to_string(),
            })
    }

    async fn delete(&self, path: &str) -> FileStoreResult<()> {
        self.files
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(path);
        Ok(())
    }
}
