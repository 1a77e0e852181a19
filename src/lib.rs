//! Scholar Index Cluster Library
//!
//! This library crate defines the core modules of the index-serving node.
//! It serves as the foundation for the binary executable (`main.rs`), which
//! also re-invokes itself as the map and reduce stages of the batch job.
//!
//! ## Architecture Modules
//! The system is composed of six loosely coupled subsystems:
//!
//! - **`reduce`**: The streaming map/reduce stages that turn a corpus of
//!   per-document word lines into aggregated inverted-index rows.
//! - **`index`**: The on-disk index artifacts and their cached in-memory
//!   form, plus the per-index build leases.
//! - **`query`**: Read-side evaluation, exact-word search with metadata
//!   joins and corpus-wide top-N ranking.
//! - **`pipeline`**: The external collaborators of a build, the scholarly
//!   paper source and the batch compute cluster.
//! - **`dispatch`**: The request/response protocol and the routing and
//!   build-pipeline policy.
//! - **`gateway`**: The single-threaded poll loop that owns the transport.

pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod reduce;
