//! Build Pipeline Module
//!
//! The two external collaborators of an index build: the scholarly paper API
//! the corpus is acquired from (`fetch`), and the batch compute cluster that
//! runs the map/reduce job and doubles as durable storage for finished
//! indexes (`cluster`). Both are narrowed to small traits so the dispatch
//! layer stays testable and local mode can run without external services.
//!
//! ## Workflow
//! 1. **Acquire**: Walk the paged search API, scrape each paper's abstract,
//!    and write one normalized text file per document plus the metadata
//!    store.
//! 2. **Job**: Ship the corpus and this binary's map/reduce subcommands to
//!    the cluster and run the streaming job over them.
//! 3. **Merge**: Collect the job's output parts into the local aggregated
//!    index file.
//! 4. **Archive**: Copy the merged index to durable storage, where a later
//!    failed build can recover it from.

pub mod cluster;
pub mod fetch;

pub use cluster::{CommandOutcome, ComputeCluster, LocalCluster, StreamingCluster};
pub use fetch::{AcquisitionReport, DocumentSource, ScholarApiSource};

#[cfg(test)]
mod tests;
