use std::path::PathBuf;

use thiserror::Error;

/// Failures callers may want to match on.
///
/// These travel inside [`anyhow::Error`]; recover them with
/// `err.downcast_ref::<SynscapeError>()`.
#[derive(Debug, Error)]
pub enum SynscapeError {
    #[error("index {index} is out of bounds for a dataset of {len} scenes")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{}: scene image directory not found", .path.display())]
    MissingImageDir { path: PathBuf },

    #[error("{}: expected top-level JSON object", .path.display())]
    NotAnObject { path: PathBuf },
}
