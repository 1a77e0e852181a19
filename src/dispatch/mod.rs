//! Dispatch Module
//!
//! Request routing between the transport and the index, query and pipeline
//! layers.
//!
//! ## Architecture Overview
//! Every decoded request passes through here exactly once:
//! 1. **Routing**: The action string picks the operation; unknown actions
//!    complete FAILED instead of being dropped.
//! 2. **Execution**: Queries run against the cached index snapshot; builds
//!    run the acquire -> job -> merge pipeline under a per-index lease,
//!    with one recovery attempt from the archived index when the primary
//!    path fails.
//! 3. **Completion**: Whatever happened is folded into exactly one DONE or
//!    FAILED response envelope carrying the request's correlation id.
//!
//! ## Submodules
//! - **`protocol`**: Envelope DTOs and action names.
//! - **`dispatcher`**: The routing and build pipeline logic.

pub mod dispatcher;
pub mod protocol;

pub use dispatcher::RequestDispatcher;
pub use protocol::{RequestEnvelope, RequestStatus, ResponseEnvelope};
