//! Service-specific error types

use thiserror::Error;

/// Batch runner errors.
///
/// Config and client setup failures are reported through `anyhow` in `main`;
/// these cover reading the batch and aborting it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    #[error("invalid invocation batch: {0}")]
    InvalidBatch(#[from] serde_json::Error),

    #[error("item {index} ({resource}.{operation}) failed: {source}")]
    ItemFailed {
        index: usize,
        resource: &'static str,
        operation: &'static str,
        #[source]
        source: hubstaff_client::Error,
    },
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
