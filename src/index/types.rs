//! Index and metadata data structures.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Occurrences of one word in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: String,
    pub count: u64,
}

/// Aggregate entry for one word across the whole corpus.
///
/// `total_count` is the sum over `postings`, and the postings are ordered by
/// count descending with ties broken by `doc_id` ascending, so query serving
/// never re-sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub word: String,
    pub total_count: u64,
    pub postings: Vec<Posting>,
}

/// Parsed inverted index for one corpus. Immutable once built; a rebuild
/// replaces it wholesale.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub entries: HashMap<String, IndexEntry>,
}

impl InvertedIndex {
    pub fn get(&self, word: &str) -> Option<&IndexEntry> {
        self.entries.get(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Descriptive record for one paper, written during acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub citation: u64,
    pub link: String,
}

/// Document id to paper record, the full metadata store of one corpus.
pub type MetadataMap = HashMap<String, PaperMetadata>;
