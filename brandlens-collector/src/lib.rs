//! Resumable query collection
//!
//! This crate provides the service layer of the pipeline: loading the query
//! battery, checkpointing completed responses to a flat CSV file, and the
//! retrying collection driver that walks the battery one query at a time.

pub mod checkpoint;
pub mod driver;
pub mod error;
pub mod query_source;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

pub use checkpoint::{CheckpointSet, CheckpointStore};
pub use driver::{CollectionDriver, CollectionSummary, CollectorConfig};
pub use error::CollectError;
pub use query_source::load_queries;
pub use retry::{RetryOutcome, RetryPolicy};
