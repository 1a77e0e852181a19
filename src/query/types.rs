//! Response payload shapes for the query operations.

use serde::{Deserialize, Serialize};

/// One matched document in a search payload, already joined with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub citations: u64,
    pub title: String,
    /// Occurrences of the searched word in this document.
    pub freq: u64,
}

/// Payload of a `search` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Corpus-wide occurrence count of the word; 0 for a miss.
    pub count: u64,
    pub word: String,
    pub result: Vec<SearchHit>,
}

/// One ranked word in a top-N payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopWord {
    pub word: String,
    pub freq: u64,
}

/// Payload of a `topn` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopNResult {
    /// Number of words actually returned, `min(n, distinct words)`.
    pub count: u64,
    pub result: Vec<TopWord>,
}
