//! # cicd-pipeline
//!
//! Remote pipeline lifecycle against the control-plane API.
//!
//! [`PipelineSync`] activates (create or refresh), reads (local trust only)
//! and deactivates (best effort) pipelines. Every call is a single synchronous
//! request through a [`Transport`]; there are no retries.

pub mod error;
pub mod spec;
pub mod sync;
pub mod transport;
pub mod wire;

pub use error::PipelineError;
pub use spec::{PipelineSpec, PipelineTarget};
pub use sync::{Deactivation, PipelineSync};
pub use transport::{HttpReply, Transport, UreqTransport};
