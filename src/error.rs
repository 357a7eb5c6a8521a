//! Error types at the component seams. Module internals use `anyhow` and
//! wrap once at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Fetch failure from a record source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The origin could not be reached, or the expected control/endpoint was
    /// never located. Fatal for the run.
    #[error("source unavailable: {0:#}")]
    Unavailable(anyhow::Error),

    /// The origin was reachable but yielded nothing. The pipeline treats this
    /// as an empty table, not a failure.
    #[error("source reachable but yielded no rows")]
    Empty,
}

impl SourceError {
    pub fn unavailable(err: impl Into<anyhow::Error>) -> Self {
        SourceError::Unavailable(err.into())
    }
}

/// Both the primary and the fallback writer failed.
#[derive(Debug, Error)]
#[error(
    "persistence failed: primary {} ({:#}); fallback {} ({:#})",
    .primary_path.display(),
    .primary,
    .fallback_path.display(),
    .fallback
)]
pub struct PersistenceFailed {
    pub primary_path: PathBuf,
    pub primary: anyhow::Error,
    pub fallback_path: PathBuf,
    pub fallback: anyhow::Error,
}
