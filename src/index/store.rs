//! File layout, parsing and cache lifecycle for index artifacts.

use crate::error::{ClusterError, Result};
use crate::index::types::{IndexEntry, InvertedIndex, MetadataMap, Posting};
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory holding the per-document text files of one corpus.
pub fn corpus_path(data_dir: &Path, index_id: &str) -> PathBuf {
    data_dir.join(index_id)
}

/// Aggregated text index produced by the batch job's merge step.
pub fn aggregated_path(data_dir: &Path, index_id: &str) -> PathBuf {
    data_dir.join(format!("{}-index", index_id))
}

/// Binary cache of the parsed index.
pub fn cache_path(data_dir: &Path, index_id: &str) -> PathBuf {
    data_dir.join(format!("{}-index.bin", index_id))
}

/// Metadata store written during acquisition.
pub fn metadata_path(data_dir: &Path, index_id: &str) -> PathBuf {
    data_dir.join(format!("{}-metadata.json", index_id))
}

/// Two-tier cache over the on-disk index artifacts.
///
/// The first tier is a process-local map of parsed indexes, the second is a
/// binary file next to the aggregated text index. Both are filled lazily on
/// first access and only replaced by an explicit rebuild; entries never
/// expire on their own.
pub struct IndexStore {
    data_dir: PathBuf,
    indexes: DashMap<String, Arc<InvertedIndex>>,
    metadata: DashMap<String, Arc<MetadataMap>>,
}

impl IndexStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        IndexStore {
            data_dir: data_dir.into(),
            indexes: DashMap::new(),
            metadata: DashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Parse the aggregated text index from disk, refresh both cache tiers
    /// and return the parsed form.
    ///
    /// Fails with `IndexCorrupt` when any non-empty line does not follow the
    /// `word\ttotal:doc,count;...` shape.
    pub fn build(&self, index_id: &str) -> Result<Arc<InvertedIndex>> {
        let contents = fs::read_to_string(aggregated_path(&self.data_dir, index_id))?;
        let index = parse_aggregated(index_id, &contents)?;

        let bytes = bincode::serialize(&index)?;
        fs::write(cache_path(&self.data_dir, index_id), bytes)?;

        tracing::info!("Built index {} ({} words)", index_id, index.len());
        let index = Arc::new(index);
        self.indexes.insert(index_id.to_string(), index.clone());
        Ok(index)
    }

    /// Fetch the index for `index_id`, cheapest tier first: the in-memory
    /// map, then the binary cache, then a fresh parse of the text index.
    ///
    /// An unreadable binary cache is discarded with a warning rather than
    /// surfaced, since the text index can always be re-parsed.
    pub fn load(&self, index_id: &str) -> Result<Arc<InvertedIndex>> {
        if let Some(cached) = self.indexes.get(index_id) {
            return Ok(cached.clone());
        }

        let cache_file = cache_path(&self.data_dir, index_id);
        if cache_file.exists() {
            match read_cache(&cache_file) {
                Ok(index) => {
                    tracing::info!("Loaded index {} from binary cache", index_id);
                    let index = Arc::new(index);
                    self.indexes.insert(index_id.to_string(), index.clone());
                    return Ok(index);
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable binary cache for {}: {}", index_id, e);
                }
            }
        }

        self.build(index_id)
    }

    /// Fetch the metadata store for `index_id`, from memory or disk.
    pub fn load_metadata(&self, index_id: &str) -> Result<Arc<MetadataMap>> {
        if let Some(cached) = self.metadata.get(index_id) {
            return Ok(cached.clone());
        }

        let contents = fs::read_to_string(metadata_path(&self.data_dir, index_id))?;
        let map: MetadataMap = serde_json::from_str(&contents)?;

        let map = Arc::new(map);
        self.metadata.insert(index_id.to_string(), map.clone());
        Ok(map)
    }

    /// Drop the in-memory tier for `index_id`. The files on disk stay as
    /// they are; the next `build` replaces the binary cache wholesale.
    /// Requests served between an invalidate and the following rebuild see
    /// the previous snapshot, never a partial one.
    pub fn invalidate(&self, index_id: &str) {
        self.indexes.remove(index_id);
        self.metadata.remove(index_id);
    }
}

fn read_cache(path: &Path) -> Result<InvertedIndex> {
    let bytes = fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}

fn parse_aggregated(index_id: &str, contents: &str) -> Result<InvertedIndex> {
    let mut entries = std::collections::HashMap::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry = parse_entry(line).map_err(|reason| ClusterError::IndexCorrupt {
            index_id: index_id.to_string(),
            detail: format!("line {}: {}", line_no + 1, reason),
        })?;
        // Duplicate words can appear when the batch input was not fully
        // sorted; the last row wins, matching the reducer's fragmentation.
        entries.insert(entry.word.clone(), entry);
    }
    Ok(InvertedIndex { entries })
}

fn parse_entry(line: &str) -> std::result::Result<IndexEntry, String> {
    let (word, value) = line
        .split_once('\t')
        .ok_or_else(|| "missing word separator".to_string())?;
    let (total, docs) = value
        .split_once(':')
        .ok_or_else(|| "missing total separator".to_string())?;
    let total_count: u64 = total
        .parse()
        .map_err(|_| format!("non-numeric total {:?}", total))?;

    let mut postings = Vec::new();
    for item in docs.split(';') {
        let (doc_id, count) = item
            .split_once(',')
            .ok_or_else(|| format!("bad document item {:?}", item))?;
        let count: u64 = count
            .parse()
            .map_err(|_| format!("non-numeric count {:?}", count))?;
        postings.push(Posting {
            doc_id: doc_id.to_string(),
            count,
        });
    }
    postings.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.doc_id.cmp(&b.doc_id)));

    Ok(IndexEntry {
        word: word.to_string(),
        total_count,
        postings,
    })
}
