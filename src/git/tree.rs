use git2::{ObjectType, Oid, Repository, Tree};

use crate::error::{AppError, Result};
use crate::models::EntryType;

const MODE_TREE: i32 = 0o040000;
const MODE_BLOB: i32 = 0o100644;
const MODE_BLOB_GROUP_WRITABLE: i32 = 0o100664;
const MODE_BLOB_EXECUTABLE: i32 = 0o100755;
const MODE_LINK: i32 = 0o120000;
const MODE_COMMIT: i32 = 0o160000;

/// The terminal entry a path resolves to inside a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedEntry {
    pub entry_type: EntryType,
    pub mode: i32,
    pub oid: Oid,
}

impl LocatedEntry {
    fn root(tree: &Tree) -> Self {
        Self {
            entry_type: EntryType::Directory,
            mode: MODE_TREE,
            oid: tree.id(),
        }
    }
}

pub fn entry_type_for_mode(mode: i32) -> Option<EntryType> {
    match mode {
        MODE_TREE => Some(EntryType::Directory),
        MODE_BLOB | MODE_BLOB_GROUP_WRITABLE => Some(EntryType::File),
        MODE_BLOB_EXECUTABLE => Some(EntryType::Executable),
        MODE_LINK => Some(EntryType::Symlink),
        MODE_COMMIT => Some(EntryType::Submodule),
        _ => None,
    }
}

/// Splits a slash separated path into its components.
///
/// Leading and trailing slashes are ignored, so `""` and `"/"` both name the
/// root. Empty, `.` and `..` components are rejected.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let components: Vec<&str> = trimmed.split('/').collect();
    if components
        .iter()
        .any(|c| c.is_empty() || *c == "." || *c == "..")
    {
        return Err(AppError::InvalidPath(path.to_string()));
    }
    Ok(components)
}

/// Finds the entry named by `path` in `tree`, or `PathNotFound`.
pub fn locate(repo: &Repository, tree: &Tree, path: &str) -> Result<LocatedEntry> {
    let components = split_path(path)?;
    lookup(repo, tree, &components)?.ok_or_else(|| AppError::PathNotFound(path.to_string()))
}

/// Descends one tree per component. `None` when a component is missing or an
/// intermediate component is not a directory.
pub fn lookup(repo: &Repository, tree: &Tree, components: &[&str]) -> Result<Option<LocatedEntry>> {
    let Some((last, parents)) = components.split_last() else {
        return Ok(Some(LocatedEntry::root(tree)));
    };

    let mut current = tree.clone();
    for name in parents {
        let next = match current.get_name(name) {
            Some(entry) if entry.filemode() == MODE_TREE => entry.id(),
            _ => return Ok(None),
        };
        current = repo.find_tree(next)?;
    }

    let Some(entry) = current.get_name(last) else {
        return Ok(None);
    };
    let mode = entry.filemode();
    let entry_type = entry_type_for_mode(mode)
        .ok_or_else(|| AppError::Internal(format!("unsupported file mode {:o} for {}", mode, last)))?;

    Ok(Some(LocatedEntry {
        entry_type,
        mode,
        oid: entry.id(),
    }))
}

/// Reads the size of a blob from its object header, without loading content.
pub fn blob_size(repo: &Repository, oid: Oid) -> Result<u64> {
    let (size, kind) = repo.odb()?.read_header(oid)?;
    if kind != ObjectType::Blob {
        return Err(AppError::Internal(format!("object {} is a {}, not a blob", oid, kind)));
    }
    Ok(size as u64)
}
