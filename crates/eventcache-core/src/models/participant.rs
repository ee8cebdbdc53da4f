use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

/// Body of `GET /participants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantsResponse {
    pub names: Vec<String>,
}

/// Filter participant names by a case-insensitive substring.
/// An empty (or all-whitespace) query matches everything.
pub fn search<'a>(names: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim();
    names
        .iter()
        .map(String::as_str)
        .filter(|name| query.is_empty() || contains_ignore_case(name, query))
        .collect()
}
