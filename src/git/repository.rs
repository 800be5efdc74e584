use git2::{ErrorCode, Oid, Repository};
use std::path::{Component, Path, PathBuf};

use chrono::DateTime;

use crate::error::{is_not_found, AppError, Result};
use crate::models::CommitInfo;

/// Handle to a repository on disk.
///
/// `git2::Repository` is not `Sync`, so instead of sharing one handle behind a
/// lock every unit of work opens its own via [`GitRepository::with_repo`].
/// Objects are immutable, so independent handles never need coordination.
#[derive(Debug, Clone)]
pub struct GitRepository {
    pub path: PathBuf,
    /// Canonical path, used as the repository part of cache keys.
    pub id: String,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let canonical = std::fs::canonicalize(&path)
            .map_err(|_| AppError::RepoNotFound(path_str.clone()))?;

        Repository::open(&canonical).map_err(|e| {
            if is_not_found(&e) {
                AppError::RepoNotFound(path_str.clone())
            } else {
                AppError::ObjectStore(e)
            }
        })?;

        Ok(Self {
            id: canonical.to_string_lossy().to_string(),
            path: canonical,
        })
    }

    /// Opens the repository named `name` below the hosting root directory.
    pub fn open_in_root(root: &Path, name: &str) -> Result<Self> {
        let relative = Path::new(name);
        let well_formed = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(AppError::InvalidRepository(name.to_string()));
        }

        let not_found = || AppError::RepoNotFound(name.to_string());
        let root = std::fs::canonicalize(root).map_err(|_| not_found())?;
        let target = std::fs::canonicalize(root.join(relative)).map_err(|_| not_found())?;
        // Symlinks under the root must not lead out of it.
        if !target.starts_with(&root) {
            return Err(AppError::InvalidRepository(name.to_string()));
        }

        Self::open(target).map_err(|e| match e {
            AppError::RepoNotFound(_) => AppError::RepoNotFound(name.to_string()),
            other => other,
        })
    }

    pub fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        let repo = Repository::open(&self.path)?;
        f(&repo)
    }
}

/// Resolves a branch, tag, or (short) hash to the commit it currently names.
///
/// An empty revision means `HEAD`.
pub fn resolve_revision(repo: &Repository, revision: &str) -> Result<Oid> {
    let spec = if revision.is_empty() { "HEAD" } else { revision };

    let not_found = |e: git2::Error| match e.code() {
        ErrorCode::NotFound
        | ErrorCode::InvalidSpec
        | ErrorCode::Ambiguous
        | ErrorCode::UnbornBranch
        | ErrorCode::Peel => AppError::RevisionNotFound(revision.to_string()),
        _ => AppError::ObjectStore(e),
    };

    let object = repo.revparse_single(spec).map_err(not_found)?;
    let commit = object.peel_to_commit().map_err(not_found)?;
    Ok(commit.id())
}

pub fn commit_to_info(commit: &git2::Commit) -> CommitInfo {
    let author = commit.author();
    CommitInfo {
        oid: commit.id().to_string(),
        message: commit.summary().unwrap_or("").trim().to_string(),
        author: author.name().unwrap_or("Unknown").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        committed_at: DateTime::from_timestamp(commit.time().seconds(), 0).unwrap_or_default(),
    }
}

pub fn find_commit_info(repo: &Repository, oid: Oid) -> Result<CommitInfo> {
    let commit = repo.find_commit(oid)?;
    Ok(commit_to_info(&commit))
}
