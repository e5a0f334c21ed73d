//! # cicd-chart
//!
//! Content-addressed chart packaging.
//!
//! Call [`build`] to turn a chart directory into a [`Bundle`]: a parsed
//! descriptor, a 64-hex content hash over the whole tree, rendered value
//! overrides and an in-memory zip archive. The [`store`] module uploads,
//! reads back and deletes bundles in a content-addressed store.

pub mod archive;
pub mod builder;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod overrides;
pub mod store;

pub use builder::{build, BuildRequest, Bundle};
pub use descriptor::ChartDescriptor;
pub use error::ChartError;
pub use store::{ChartStore, DirStore, Removal};
