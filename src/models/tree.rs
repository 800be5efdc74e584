//! Path and commit DTOs.
//!
//! - `PathDetails`: One resolved path of a batch (directory listings, file views)
//! - `EntryType`: Kind of tree entry a path points at
//! - `CommitInfo`: Commit that last touched a path
//! - `PathsDetailsRequest` / `PathsDetailsResponse`: Batch endpoint bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathDetails {
    pub path: String,
    pub exists: bool,
    pub entry_type: EntryType,
    /// Only set for regular and executable files.
    pub size: Option<u64>,
    pub last_commit: CommitInfo,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Executable,
    Directory,
    Symlink,
    Submodule,
}

impl EntryType {
    pub fn is_file(self) -> bool {
        matches!(self, EntryType::File | EntryType::Executable)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitInfo {
    pub oid: String,
    pub message: String,
    pub author: String,
    pub author_email: String,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsDetailsRequest {
    /// Repository name relative to the hosting root.
    pub repository: String,
    /// Branch, tag or commit hash; empty means `HEAD`.
    #[serde(default)]
    pub revision: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsDetailsResponse {
    /// Commit the revision resolved to for this request.
    pub commit: String,
    pub details: Vec<PathDetails>,
}
