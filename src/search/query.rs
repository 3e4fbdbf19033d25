//! Query parsing and result ordering.

use crate::types::SearchResult;
use serde::{Deserialize, Serialize};

/// Query that lists every indexed package.
pub const ALL_QUERY: &str = "all:";

/// Ordering applied to query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Index order.
    #[default]
    None,
    /// Lexicographic by import path.
    Path,
    /// Highest score first; equal scores keep index order.
    Score,
}

impl SortBy {
    pub(crate) fn apply(self, results: &mut [SearchResult]) {
        match self {
            Self::None => {}
            Self::Path => results.sort_by(|a, b| a.import_path.cmp(&b.import_path)),
            Self::Score => results.sort_by(|a, b| b.score.total_cmp(&a.score)),
        }
    }
}

/// Whitespace-separated query terms.
pub(crate) fn query_terms(query: &str) -> Vec<&str> {
    query.split_whitespace().collect()
}
