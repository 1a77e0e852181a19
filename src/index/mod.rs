//! Inverted Index Module
//!
//! Owns the on-disk index artifacts and their cached in-memory form.
//!
//! ## Core Concepts
//! - **Layout**: Each corpus, identified by an `index_id`, materializes as a
//!   small family of files under the data directory: the aggregated text
//!   index produced by the batch job, a binary cache of its parsed form, and
//!   the metadata store written during acquisition.
//! - **Parsing**: Aggregated `word\ttotal:doc,count;...` rows become the
//!   in-memory index, with postings pre-sorted for query serving.
//! - **Caching**: Two tiers (a process-local map and a binary file), filled
//!   lazily on first access. An index is immutable once parsed; a rebuild
//!   replaces it wholesale, never in place.
//! - **Build leases**: Per-index expiring claims keep concurrent build
//!   requests from racing each other.

pub mod lease;
pub mod store;
pub mod types;

pub use store::IndexStore;
pub use types::{IndexEntry, InvertedIndex, MetadataMap, PaperMetadata, Posting};
