//! Last-commit resolution.
//!
//! A path's "value" in a commit is the id and mode of the entry it names (the
//! root tree id for the empty path), or nothing when the path is absent. The
//! last commit for a path is the most recent ancestor whose value differs from
//! the value in every one of its parents. Walking from the start commit only
//! follows parents that carry the same value, so the walk stays on lineages
//! where the path is unchanged.
//!
//! Merge policy: a merge whose value matches at least one parent is skipped and
//! all matching parents are followed. A merge that disagrees with every parent
//! is itself the answer, even if the parents agree with each other.

use git2::{Commit, Oid, Repository, Sort};
use std::collections::{HashMap, HashSet};

use crate::error::{AppError, Result};
use crate::git::repository::find_commit_info;
use crate::git::tree::{lookup, split_path};
use crate::models::CommitInfo;

type PathValue = Option<(Oid, i32)>;

/// Returns the most recent commit reachable from `start` that changed `path`.
///
/// The start commit is checked against its parents first, since it is often
/// the answer and a topological revwalk has to sort all reachable history
/// before yielding anything. Past that, the revwalk is topologically sorted,
/// so a commit is only yielded after all of its descendants; the first commit
/// found that differs from all of its parents is therefore the most recent one.
pub fn resolve_last_commit(repo: &Repository, start: Oid, path: &str) -> Result<Oid> {
    let components = split_path(path)?;
    let mut values: HashMap<Oid, PathValue> = HashMap::new();

    let first = repo.find_commit(start)?;
    let mut interesting: HashSet<Oid> = match visit(repo, &first, &components, &mut values)? {
        Visit::Changed => {
            tracing::debug!("Last commit for {:?}: {} (start commit)", path, start);
            return Ok(start);
        }
        Visit::Absent => {
            tracing::debug!("Path {:?} never existed (root start commit)", path);
            return Err(AppError::PathNeverExisted(path.to_string()));
        }
        Visit::Follow(parents) => parents.into_iter().collect(),
    };

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push(start)?;

    let mut examined = 1usize;
    for oid in revwalk {
        if interesting.is_empty() {
            break;
        }
        let oid = oid?;
        if !interesting.remove(&oid) {
            continue;
        }
        examined += 1;

        let commit = repo.find_commit(oid)?;
        match visit(repo, &commit, &components, &mut values)? {
            Visit::Changed => {
                tracing::debug!("Last commit for {:?}: {} ({} examined)", path, oid, examined);
                return Ok(oid);
            }
            Visit::Absent => continue,
            Visit::Follow(parents) => interesting.extend(parents),
        }
    }

    tracing::debug!("Path {:?} never existed ({} commits examined)", path, examined);
    Err(AppError::PathNeverExisted(path.to_string()))
}

enum Visit {
    /// The commit's value differs from every parent (or it is a root holding the path).
    Changed,
    /// Root commit without the path.
    Absent,
    /// Parents carrying the same value.
    Follow(Vec<Oid>),
}

fn visit(
    repo: &Repository,
    commit: &Commit,
    components: &[&str],
    values: &mut HashMap<Oid, PathValue>,
) -> Result<Visit> {
    let value = path_value(repo, commit, components, values)?;

    if commit.parent_count() == 0 {
        return Ok(if value.is_some() {
            Visit::Changed
        } else {
            Visit::Absent
        });
    }

    // `Commit::parents` silently drops parents it cannot load.
    let mut unchanged_in = Vec::new();
    for i in 0..commit.parent_count() {
        let parent = commit.parent(i)?;
        if path_value(repo, &parent, components, values)? == value {
            unchanged_in.push(parent.id());
        }
    }

    Ok(if unchanged_in.is_empty() {
        Visit::Changed
    } else {
        Visit::Follow(unchanged_in)
    })
}

pub fn last_commit_info(repo: &Repository, start: Oid, path: &str) -> Result<CommitInfo> {
    let oid = resolve_last_commit(repo, start, path)?;
    find_commit_info(repo, oid)
}

fn path_value(
    repo: &Repository,
    commit: &Commit,
    components: &[&str],
    values: &mut HashMap<Oid, PathValue>,
) -> Result<PathValue> {
    if let Some(value) = values.get(&commit.id()) {
        return Ok(*value);
    }

    let tree = commit.tree()?;
    let value = lookup(repo, &tree, components)?.map(|entry| (entry.oid, entry.mode));
    values.insert(commit.id(), value);
    Ok(value)
}
