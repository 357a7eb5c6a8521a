//! Automation-grid source.
//!
//! The vendor grid lives behind an opaque session handle owned by a
//! platform-specific bridge; this module only sees the narrow `GridApi`
//! capability. Extraction runs an ordered list of strategies and takes the
//! first one that succeeds: a clipboard dump is one round-trip, the
//! cell-by-cell walk is the slow path that survives grids whose copy verb
//! is disabled.

use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::fetch::RecordSource;
use crate::table::{RawCell, RawTable};

/// Narrow view of a vendor automation grid.
pub trait GridApi {
    /// Select-all plus copy; returns the grid as tab-delimited text with the
    /// column titles in the first line.
    fn copy_all(&mut self) -> Result<String>;
    fn row_count(&self) -> Result<usize>;
    fn column_count(&self) -> Result<usize>;
    fn column_title(&self, col: usize) -> Result<String>;
    fn cell_value(&self, row: usize, col: usize) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStrategy {
    Clipboard,
    CellWalk,
}

pub struct GridSource<A> {
    api: A,
    strategies: Vec<GridStrategy>,
}

impl<A: GridApi> GridSource<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            strategies: vec![GridStrategy::Clipboard, GridStrategy::CellWalk],
        }
    }

    /// Override the strategy order.
    pub fn with_strategies(mut self, strategies: Vec<GridStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    fn fetch_clipboard(&mut self) -> Result<RawTable> {
        let dump = self.api.copy_all().context("copying grid to clipboard")?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(b'\t')
            .from_reader(Cursor::new(dump));

        let mut table = RawTable::new();
        for (idx, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("clipboard parse error at line {idx}"))?;
            table.push_row(record.iter().map(Into::into).collect());
        }
        Ok(table)
    }

    fn fetch_cells(&mut self) -> Result<RawTable> {
        let rows = self.api.row_count().context("reading grid row count")?;
        let cols = self
            .api
            .column_count()
            .context("reading grid column count")?;

        let mut table = RawTable::new();
        let mut header = Vec::with_capacity(cols);
        for col in 0..cols {
            // A title accessor that fails on one column should not sink the
            // whole extraction.
            let title = match self.api.column_title(col) {
                Ok(title) => title,
                Err(e) => {
                    debug!(col, error = %e, "column title unavailable");
                    format!("col_{col}")
                }
            };
            header.push(RawCell::Text(title));
        }
        table.push_row(header);

        for row in 0..rows {
            let mut cells = Vec::with_capacity(cols);
            for col in 0..cols {
                match self.api.cell_value(row, col) {
                    Ok(value) => cells.push(RawCell::Text(value)),
                    Err(e) => {
                        debug!(row, col, error = %e, "cell read failed");
                        cells.push(RawCell::Empty);
                    }
                }
            }
            table.push_row(cells);
        }
        Ok(table)
    }
}

impl<A: GridApi> RecordSource for GridSource<A> {
    fn fetch(&mut self) -> Result<RawTable, SourceError> {
        let mut last_err = None;
        for strategy in self.strategies.clone() {
            let attempt = match strategy {
                GridStrategy::Clipboard => self.fetch_clipboard(),
                GridStrategy::CellWalk => self.fetch_cells(),
            };
            match attempt {
                Ok(table) => {
                    debug!(?strategy, rows = table.rows.len(), "grid extraction succeeded");
                    return Ok(table);
                }
                Err(e) => {
                    warn!(?strategy, error = %format!("{e:#}"), "grid extraction strategy failed");
                    last_err = Some(e);
                }
            }
        }
        Err(SourceError::Unavailable(
            last_err.unwrap_or_else(|| anyhow!("no extraction strategy configured")),
        ))
    }
}
