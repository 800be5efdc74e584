use serde::{Deserialize, Serialize};

/// A single secret detected in a pushed commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretFinding {
    pub rule_id: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub secret: String,
    pub commit: String,
    pub description: String,
    pub ref_name: String,
}
