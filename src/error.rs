use std::collections::TryReserveError;
use thiserror::Error;

/// Resource failures surfaced by growing operations.
///
/// Every variant is raised before the table is mutated, so the table is
/// unchanged when one is returned.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to allocate a bucket array of {buckets} slots")]
    BucketAlloc {
        buckets: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("node arena is full ({limit} nodes)")]
    NodeCapacity { limit: usize },
}
