//! Reduce Stage Module
//!
//! The word-count aggregation stage of the index build pipeline. The binary
//! re-invokes itself as `mapper` and `reducer` on the compute cluster, so
//! both stages read stdin and write stdout and carry no state beyond the
//! line stream.
//!
//! ## Workflow
//! 1. **Map**: Each document line `doc_id word word ...` is expanded into
//!    one `word\t1;doc_id` pair per word occurrence.
//! 2. **Shuffle**: The cluster sorts the pair stream so equal words form
//!    contiguous runs (the local runner sorts in-process).
//! 3. **Reduce**: The sorted stream is folded into one
//!    `word\ttotal:doc,count;...` row per word, with per-document counts.
//!
//! ## Submodules
//! - **`mapper`**: Document line to word-pair expansion.
//! - **`aggregator`**: Grouped reduction over the sorted pair stream.

pub mod aggregator;
pub mod mapper;

pub use aggregator::{reduce_stream, Aggregator};
pub use mapper::map_stream;
