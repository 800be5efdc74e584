//! Batch path details.
//!
//! Resolves a revision once, then for every requested path reports whether it
//! exists, its size when it is a file, and the commit that last touched it.
//! Structural facts come straight from the revision's tree. Last commits go
//! through the shared [`LastCommitCache`] and run concurrently per path.
//!
//! A batch either succeeds for every path, in request order, or fails as a
//! whole with the first error (e.g. `PathNotFound` naming the offending path).

use std::time::Instant;

use futures::future::try_join_all;
use git2::Oid;

use crate::config::ServiceConfig;
use crate::error::{AppError, Result};
use crate::git::cache::{CacheStats, CommitEntryKey, LastCommitCache};
use crate::git::history::last_commit_info;
use crate::git::repository::{resolve_revision, GitRepository};
use crate::git::tree::{blob_size, locate, split_path};
use crate::models::{CommitInfo, EntryType, PathDetails, PathsDetailsResponse};

/// Owns the last-commit cache. Built once at startup and shared by all requests.
pub struct PathsDetailsService {
    config: ServiceConfig,
    cache: LastCommitCache,
}

struct Structure {
    entry_type: EntryType,
    size: Option<u64>,
}

impl PathsDetailsService {
    pub fn new(config: ServiceConfig) -> Self {
        let cache = LastCommitCache::with_capacity(config.cache_capacity);
        Self { config, cache }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolves `paths` at `revision` in the repository named `repo_name`,
    /// abandoning the batch once the configured request timeout passes.
    pub async fn paths_details(
        &self,
        repo_name: &str,
        revision: &str,
        paths: Vec<String>,
    ) -> Result<PathsDetailsResponse> {
        if paths.len() > self.config.max_batch_paths {
            return Err(AppError::InvalidRequest(format!(
                "{} paths requested, at most {} allowed",
                paths.len(),
                self.config.max_batch_paths
            )));
        }

        let timeout = self.config.request_timeout();
        tokio::time::timeout(timeout, self.resolve(repo_name, revision, paths))
            .await
            .map_err(|_| AppError::Timeout(timeout))?
    }

    async fn resolve(
        &self,
        repo_name: &str,
        revision: &str,
        paths: Vec<String>,
    ) -> Result<PathsDetailsResponse> {
        let start = Instant::now();
        let normalized = paths
            .iter()
            .map(|path| split_path(path).map(|components| components.join("/")))
            .collect::<Result<Vec<String>>>()?;

        let (repo, commit, structure) = {
            let root = self.config.repos_root.clone();
            let repo_name = repo_name.to_string();
            let revision = revision.to_string();
            let normalized = normalized.clone();
            let requested = paths.clone();
            run_blocking(move || {
                let repo = GitRepository::open_in_root(&root, &repo_name)?;
                let (commit, structure) = read_structure(&repo, &revision, &normalized, &requested)?;
                Ok((repo, commit, structure))
            })
            .await?
        };

        let lookups = normalized.iter().zip(&paths).map(|(path, requested)| {
            let key = CommitEntryKey::new(&repo.id, commit, path);
            let repo = repo.clone();
            let path = path.clone();
            async move {
                self.cache
                    .get_or_compute(key, move || {
                        repo.with_repo(|r| last_commit_info(r, commit, &path))
                    })
                    .await
                    .map_err(|source| AppError::CacheComputeFailed {
                        path: requested.clone(),
                        source,
                    })
            }
        });
        let last_commits: Vec<CommitInfo> = try_join_all(lookups).await?;

        let details: Vec<PathDetails> = paths
            .into_iter()
            .zip(structure)
            .zip(last_commits)
            .map(|((path, structure), last_commit)| PathDetails {
                path,
                exists: true,
                entry_type: structure.entry_type,
                size: structure.size,
                last_commit,
            })
            .collect();

        tracing::info!(
            "Resolved {} path(s) at {} in {} in {:?}",
            details.len(),
            commit,
            repo.id,
            start.elapsed()
        );

        Ok(PathsDetailsResponse {
            commit: commit.to_string(),
            details,
        })
    }
}

fn read_structure(
    repo: &GitRepository,
    revision: &str,
    paths: &[String],
    requested: &[String],
) -> Result<(Oid, Vec<Structure>)> {
    repo.with_repo(|r| {
        let commit = resolve_revision(r, revision)?;
        let tree = r.find_commit(commit)?.tree()?;

        let structure = paths
            .iter()
            .zip(requested)
            .map(|(path, requested)| {
                let entry = locate(r, &tree, path).map_err(|e| match e {
                    AppError::PathNotFound(_) => AppError::PathNotFound(requested.clone()),
                    other => other,
                })?;
                let size = if entry.entry_type.is_file() {
                    Some(blob_size(r, entry.oid)?)
                } else {
                    None
                };
                Ok(Structure {
                    entry_type: entry.entry_type,
                    size,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((commit, structure))
    })
}

async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::TestRepo;
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        test: TestRepo,
        a: Oid,
        b: Oid,
        c: Oid,
    }

    fn fixture() -> Fixture {
        let test = TestRepo::new();
        let a = test.commit("A", &[], &[("file.txt", "x"), ("other.txt", "1"), ("dir/nested.rs", "fn main() {}")]);
        let b = test.commit("B", &[a], &[("file.txt", "yy"), ("other.txt", "1"), ("dir/nested.rs", "fn main() {}")]);
        let c = test.commit("C", &[b], &[("file.txt", "yy"), ("other.txt", "22"), ("dir/nested.rs", "fn main() {}")]);
        test.set_branch("main", c);
        Fixture { test, a, b, c }
    }

    fn service(test: &TestRepo) -> PathsDetailsService {
        PathsDetailsService::new(ServiceConfig {
            repos_root: test.root().to_path_buf(),
            ..ServiceConfig::default()
        })
    }

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_reports_details() {
        let f = fixture();
        let service = service(&f.test);

        let response = service
            .paths_details(TestRepo::NAME, "main", paths(&["other.txt", "file.txt", "", "dir", "dir/nested.rs"]))
            .await
            .unwrap();

        assert_eq!(response.commit, f.c.to_string());
        let got: Vec<(&str, EntryType, Option<u64>, String)> = response
            .details
            .iter()
            .map(|d| (d.path.as_str(), d.entry_type, d.size, d.last_commit.oid.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("other.txt", EntryType::File, Some(2), f.c.to_string()),
                ("file.txt", EntryType::File, Some(2), f.b.to_string()),
                ("", EntryType::Directory, None, f.c.to_string()),
                ("dir", EntryType::Directory, None, f.a.to_string()),
                ("dir/nested.rs", EntryType::File, Some(12), f.a.to_string()),
            ]
        );
        assert!(response.details.iter().all(|d| d.exists));
    }

    #[tokio::test]
    async fn test_older_revision_by_hash() {
        let f = fixture();
        let service = service(&f.test);

        let response = service
            .paths_details(TestRepo::NAME, &f.a.to_string(), paths(&["file.txt"]))
            .await
            .unwrap();

        assert_eq!(response.commit, f.a.to_string());
        assert_eq!(response.details[0].size, Some(1));
        assert_eq!(response.details[0].last_commit.oid, f.a.to_string());
    }

    #[tokio::test]
    async fn test_missing_path_fails_whole_batch() {
        let f = fixture();
        let service = service(&f.test);

        let result = service
            .paths_details(TestRepo::NAME, "main", paths(&["file.txt", "missing.txt", "other.txt"]))
            .await;

        assert!(matches!(result, Err(AppError::PathNotFound(p)) if p == "missing.txt"));
        assert_eq!(service.cache_stats().misses, 0);
    }

    #[tokio::test]
    async fn test_repeated_batches_are_identical_and_cached() {
        let f = fixture();
        let service = service(&f.test);
        let batch = paths(&["file.txt", "other.txt", "dir"]);

        let first = service.paths_details(TestRepo::NAME, "main", batch.clone()).await.unwrap();
        let second = service.paths_details(TestRepo::NAME, "main", batch).await.unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        let stats = service.cache_stats();
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.entries, 3);
    }

    #[tokio::test]
    async fn test_equivalent_spellings_share_a_cache_entry() {
        let f = fixture();
        let service = service(&f.test);

        let response = service
            .paths_details(TestRepo::NAME, "main", paths(&["dir", "dir/", "/dir"]))
            .await
            .unwrap();

        assert_eq!(response.details.len(), 3);
        assert_eq!(response.details[1].path, "dir/");
        assert_eq!(service.cache_stats().entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_share_computation() {
        let f = fixture();
        let service = Arc::new(service(&f.test));

        let mut handles = vec![];
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.paths_details(TestRepo::NAME, "main", paths(&["file.txt"])).await
            }));
        }
        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.details[0].last_commit.oid, f.b.to_string());
        }

        let stats = service.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_batch_leaves_cache_usable() {
        let f = fixture();
        let service = Arc::new(PathsDetailsService::new(ServiceConfig {
            repos_root: f.test.root().to_path_buf(),
            request_timeout_ms: 250,
            ..ServiceConfig::default()
        }));

        // Occupy the batch's only key with a computation that outlives the timeout.
        let repo = GitRepository::open_in_root(f.test.root(), TestRepo::NAME).unwrap();
        let key = CommitEntryKey::new(&repo.id, f.c, "file.txt");
        let c = f.c;
        let slow = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .cache
                    .get_or_compute(key, move || {
                        std::thread::sleep(Duration::from_millis(1500));
                        repo.with_repo(|r| last_commit_info(r, c, "file.txt"))
                    })
                    .await
            })
        };
        while service.cache_stats().in_flight == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let result = service.paths_details(TestRepo::NAME, "main", paths(&["file.txt"])).await;
        assert!(matches!(result, Err(AppError::Timeout(t)) if t == Duration::from_millis(250)));

        slow.await.unwrap().unwrap();
        let stats = service.cache_stats();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.entries, 1);

        let response = service
            .paths_details(TestRepo::NAME, "main", paths(&["file.txt"]))
            .await
            .unwrap();
        assert_eq!(response.details[0].last_commit.oid, f.b.to_string());
        assert_eq!(service.cache_stats().hits, 1);
        assert_eq!(service.cache_stats().misses, 1);
    }

    #[tokio::test]
    async fn test_unknown_revision() {
        let f = fixture();
        let service = service(&f.test);

        let result = service.paths_details(TestRepo::NAME, "nope", paths(&["file.txt"])).await;
        assert!(matches!(result, Err(AppError::RevisionNotFound(r)) if r == "nope"));
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let f = fixture();
        let service = PathsDetailsService::new(ServiceConfig {
            repos_root: f.test.root().to_path_buf(),
            max_batch_paths: 2,
            ..ServiceConfig::default()
        });

        let too_many = service
            .paths_details(TestRepo::NAME, "main", paths(&["a", "b", "c"]))
            .await;
        assert!(matches!(too_many, Err(AppError::InvalidRequest(_))));

        let bad_path = service.paths_details(TestRepo::NAME, "main", paths(&["a//b"])).await;
        assert!(matches!(bad_path, Err(AppError::InvalidPath(_))));

        let bad_repo = service.paths_details("../elsewhere", "main", paths(&["a"])).await;
        assert!(matches!(bad_repo, Err(AppError::InvalidRepository(_))));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let f = fixture();
        let service = service(&f.test);

        let response = service.paths_details(TestRepo::NAME, "main", Vec::new()).await.unwrap();
        assert_eq!(response.commit, f.c.to_string());
        assert!(response.details.is_empty());
    }
}
