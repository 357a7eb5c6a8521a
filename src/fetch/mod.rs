//! Record sources: heterogeneous, unreliable origins that hand the pipeline
//! quasi-tabular rows.

pub mod archive;
pub mod catalog;
pub mod grid;

use crate::error::SourceError;
use crate::table::RawTable;

/// One fetch per pipeline run. Retry and fallback behaviour belongs to the
/// implementation (pagination loops, clipboard-vs-cell strategies), never to
/// the pipeline. Returning `Ok` with zero rows is valid and yields an empty
/// normalized table downstream.
pub trait RecordSource {
    fn fetch(&mut self) -> Result<RawTable, SourceError>;
}
