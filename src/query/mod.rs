//! Query Module
//!
//! Read-side evaluation over a parsed inverted index.
//!
//! ## Overview
//! Both operations work on an already-loaded index snapshot and never touch
//! disk; the dispatch layer decides which snapshot to hand in and folds the
//! results into response envelopes.
//!
//! ## Responsibilities
//! - **Search**: Exact-word lookup joined with the metadata store,
//!   preserving the postings' count-descending order.
//! - **Ranking**: Corpus-wide top-N words by total frequency.
//! - **Payloads**: The result shapes serialized into DONE responses.
//!
//! ## Submodules
//! - **`engine`**: Search and ranking logic.
//! - **`types`**: Response payload shapes.

pub mod engine;
pub mod types;

pub use engine::{search, top_n};
pub use types::{SearchHit, SearchResult, TopNResult, TopWord};
