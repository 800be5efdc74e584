//! Builders for throwaway repositories used by unit tests.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;

pub const REGULAR: i32 = 0o100644;
pub const EXECUTABLE: i32 = 0o100755;
pub const SYMLINK: i32 = 0o120000;

/// A bare repository inside a temp dir. Every commit is a full snapshot of the
/// given files, with strictly increasing author/committer time.
pub struct TestRepo {
    dir: TempDir,
    path: PathBuf,
    clock: Cell<i64>,
}

impl TestRepo {
    pub const NAME: &'static str = "project.git";

    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(Self::NAME);
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        Repository::init_opts(&path, &opts).unwrap();
        Self {
            dir,
            path,
            clock: Cell::new(1_700_000_000),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn with_repo<T>(&self, f: impl FnOnce(&Repository) -> T) -> T {
        let repo = Repository::open(&self.path).unwrap();
        f(&repo)
    }

    pub fn commit(&self, message: &str, parents: &[Oid], files: &[(&str, &str)]) -> Oid {
        let files: Vec<(&str, &str, i32)> = files.iter().map(|(p, c)| (*p, *c, REGULAR)).collect();
        self.commit_with_modes(message, parents, &files)
    }

    pub fn commit_with_modes(
        &self,
        message: &str,
        parents: &[Oid],
        files: &[(&str, &str, i32)],
    ) -> Oid {
        let now = self.clock.get() + 60;
        self.clock.set(now);

        self.with_repo(|repo| {
            let entries: Vec<(String, Vec<u8>, i32)> = files
                .iter()
                .map(|(p, c, m)| (p.to_string(), c.as_bytes().to_vec(), *m))
                .collect();
            let tree_id = write_tree(repo, &entries);
            let tree = repo.find_tree(tree_id).unwrap();

            let sig = Signature::new("Test Author", "author@example.com", &Time::new(now, 0)).unwrap();
            let parent_commits: Vec<git2::Commit> =
                parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
            let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();

            repo.commit(None, &sig, &sig, message, &tree, &parent_refs)
                .unwrap()
        })
    }

    pub fn set_branch(&self, name: &str, target: Oid) {
        self.with_repo(|repo| {
            repo.reference(&format!("refs/heads/{name}"), target, true, "test")
                .unwrap();
        });
    }

    pub fn tag(&self, name: &str, target: Oid) {
        self.with_repo(|repo| {
            repo.reference(&format!("refs/tags/{name}"), target, true, "test")
                .unwrap();
        });
    }
}

fn write_tree(repo: &Repository, files: &[(String, Vec<u8>, i32)]) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    let mut subdirs: BTreeMap<&str, Vec<(String, Vec<u8>, i32)>> = BTreeMap::new();

    for (path, content, mode) in files {
        match path.split_once('/') {
            Some((dir, rest)) => subdirs
                .entry(dir)
                .or_default()
                .push((rest.to_string(), content.clone(), *mode)),
            None => {
                let blob = repo.blob(content).unwrap();
                builder.insert(path.as_str(), blob, *mode).unwrap();
            }
        }
    }

    for (dir, children) in subdirs {
        let subtree = write_tree(repo, &children);
        builder.insert(dir, subtree, 0o040000).unwrap();
    }

    builder.write().unwrap()
}
