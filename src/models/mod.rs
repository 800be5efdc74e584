//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for API consumers.
//! - `tree`: PathDetails, EntryType, CommitInfo and the batch request/response
//! - `scan`: SecretFinding records consumed by the report renderer

pub mod scan;
pub mod tree;

pub use scan::*;
pub use tree::*;
