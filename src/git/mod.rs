pub mod cache;
pub mod details;
pub mod history;
pub mod repository;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheStats, LastCommitCache};
pub use details::PathsDetailsService;
pub use repository::GitRepository;
