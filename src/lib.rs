//! Path details service.
//!
//! Given a repository, a revision and a batch of paths, reports per path
//! whether it exists, its size when it is a file, and the most recent commit
//! that changed it. Last-commit lookups walk the commit graph and are memoized
//! in a single-flight cache keyed by the resolved commit hash.
//!
//! - `git::repository`: opening repositories and resolving revisions
//! - `git::tree`: locating tree entries and reading blob sizes
//! - `git::history`: the last-commit walk
//! - `git::cache`: single-flight last-commit cache
//! - `git::details`: batch orchestration
//! - `routes`: HTTP API
//! - `report`: rendering of secret scan results for push hooks

pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod report;
pub mod routes;
