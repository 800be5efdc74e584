//! Command line and environment configuration.
//!
//! Every service option can be given as a flag or through a `PATHD_*`
//! environment variable. Logging is configured separately through `RUST_LOG`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// Path details service - per-path size and last commit lookups for hosted git repositories
#[derive(Parser, Debug)]
#[command(name = "path-details")]
#[command(about = "Resolves path metadata and last-touching commits for git repositories", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub service: ServiceConfig,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (the default)
    Serve,
    /// Resolve one batch of paths and print the result as JSON
    Details {
        /// Repository name relative to the repositories root
        repo: String,
        /// Branch, tag or commit hash
        revision: String,
        /// Paths to resolve; an empty string names the repository root
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServiceConfig {
    /// Directory containing the hosted repositories
    #[arg(long, env = "PATHD_REPOS_ROOT", default_value = ".")]
    pub repos_root: PathBuf,

    /// Address to bind the HTTP server to
    #[arg(long, env = "PATHD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to run the server on
    #[arg(short, long, env = "PATHD_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Maximum number of cached last-commit entries (0 = unbounded)
    #[arg(long, env = "PATHD_CACHE_CAPACITY", default_value_t = 100_000)]
    pub cache_capacity: usize,

    /// Milliseconds a batch may take before it is abandoned
    #[arg(
        long,
        env = "PATHD_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout_ms: u64,

    /// Maximum number of paths accepted in one batch
    #[arg(long, env = "PATHD_MAX_BATCH_PATHS", default_value_t = 1000)]
    pub max_batch_paths: usize,
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            repos_root: PathBuf::from("."),
            host: "127.0.0.1".to_string(),
            port: 3001,
            cache_capacity: 100_000,
            request_timeout_ms: 30_000,
            max_batch_paths: 1000,
        }
    }
}
