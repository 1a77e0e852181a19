//! Search and ranking logic.

use crate::error::{ClusterError, Result};
use crate::index::types::{InvertedIndex, MetadataMap};
use crate::query::types::{SearchHit, SearchResult, TopNResult, TopWord};

/// Exact-word lookup joined with the metadata store.
///
/// A word absent from the index is a miss, not an error: the result carries
/// `count: 0` and no hits. A document that is indexed but missing from the
/// metadata store is an error, since the index and metadata of one corpus
/// are built together and must agree.
pub fn search(index: &InvertedIndex, metadata: &MetadataMap, word: &str) -> Result<SearchResult> {
    let Some(entry) = index.get(word) else {
        return Ok(SearchResult {
            count: 0,
            word: word.to_string(),
            result: Vec::new(),
        });
    };

    let mut result = Vec::with_capacity(entry.postings.len());
    for posting in &entry.postings {
        let record = metadata
            .get(&posting.doc_id)
            .ok_or_else(|| ClusterError::MetadataMissing(posting.doc_id.clone()))?;
        result.push(SearchHit {
            doc_id: posting.doc_id.clone(),
            citations: record.citation,
            title: record.title.clone(),
            freq: posting.count,
        });
    }

    Ok(SearchResult {
        count: entry.total_count,
        word: word.to_string(),
        result,
    })
}

/// The `n` most frequent words of the corpus, by total count descending
/// with ties broken by word ascending. `n <= 0` yields an empty result.
pub fn top_n(index: &InvertedIndex, n: i64) -> TopNResult {
    if n <= 0 {
        return TopNResult {
            count: 0,
            result: Vec::new(),
        };
    }

    let mut ranked: Vec<_> = index.entries.values().collect();
    ranked.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.word.cmp(&b.word))
    });
    ranked.truncate(n as usize);

    TopNResult {
        count: ranked.len() as u64,
        result: ranked
            .into_iter()
            .map(|entry| TopWord {
                word: entry.word.clone(),
                freq: entry.total_count,
            })
            .collect(),
    }
}
