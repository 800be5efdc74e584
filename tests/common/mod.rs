use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};

pub const REPO_NAME: &str = "app.git";

/// Linear history in a bare repository named [`REPO_NAME`] under `root`.
/// Each commit is a full snapshot of flat files; `main` points at the last one.
pub fn linear_repo(root: &Path, commits: &[(&str, Vec<(&str, &str)>)]) -> Vec<Oid> {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    let repo = Repository::init_opts(root.join(REPO_NAME), &opts).unwrap();

    let mut oids: Vec<Oid> = Vec::new();
    for (i, (message, files)) in commits.iter().enumerate() {
        let mut builder = repo.treebuilder(None).unwrap();
        for (name, content) in files.iter() {
            let blob = repo.blob(content.as_bytes()).unwrap();
            builder.insert(*name, blob, 0o100644).unwrap();
        }
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();

        let sig = Signature::new("Dev", "dev@example.com", &Time::new(1_700_000_000 + i as i64 * 60, 0)).unwrap();
        let parents: Vec<git2::Commit> = oids.last().map(|p| repo.find_commit(*p).unwrap()).into_iter().collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        let oid = repo.commit(None, &sig, &sig, message, &tree, &parent_refs).unwrap();
        oids.push(oid);
    }

    if let Some(head) = oids.last() {
        repo.reference("refs/heads/main", *head, true, "test").unwrap();
    }
    oids
}
