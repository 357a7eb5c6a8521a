//! One pipeline run: fetch, normalize, persist, summarize.
//!
//! Per-cell and per-row anomalies are logged and carried in the result;
//! only an unreachable source or a double persistence failure aborts.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::export::{self, Format, OutputTarget};
use crate::fetch::RecordSource;
use crate::normalize::{normalize, NormalizationRules};
use crate::table::RawTable;

/// What one run produced, for callers and the summary line.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub columns: usize,
    pub warnings: usize,
    pub format: Format,
    pub path: PathBuf,
}

/// Fetch from `source` and push the rows through `run_table`. An empty
/// source is not a failure: the run proceeds with an empty table.
pub fn run(
    source: &mut dyn RecordSource,
    rules: &NormalizationRules,
    target: &OutputTarget,
) -> Result<RunSummary> {
    let raw = match source.fetch() {
        Ok(raw) => raw,
        Err(SourceError::Empty) => {
            info!("source yielded no rows; continuing with an empty table");
            RawTable::new()
        }
        Err(err @ SourceError::Unavailable(_)) => return Err(err.into()),
    };
    run_table(raw, rules, target)
}

/// Normalize `raw`, surface every accumulated warning, persist resiliently
/// and emit the run summary line.
pub fn run_table(
    raw: RawTable,
    rules: &NormalizationRules,
    target: &OutputTarget,
) -> Result<RunSummary> {
    let result = normalize(raw, rules);
    for warning in &result.warnings {
        warn!("{warning}");
    }

    let report = export::write(&result.table, target)?;
    let summary = RunSummary {
        rows: result.row_count(),
        columns: result.column_count(),
        warnings: result.warnings.len(),
        format: report.format,
        path: report.path,
    };
    info!(
        rows = summary.rows,
        columns = summary.columns,
        warnings = summary.warnings,
        format = %summary.format,
        path = %summary.path.display(),
        fallback = report.fallback_used,
        "extraction complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ColumnSpec;
    use crate::table::RawCell;

    struct StaticSource(Option<RawTable>);

    impl RecordSource for StaticSource {
        fn fetch(&mut self) -> Result<RawTable, SourceError> {
            match self.0.take() {
                Some(table) => Ok(table),
                None => Err(SourceError::Empty),
            }
        }
    }

    #[test]
    fn end_to_end_through_the_primary_writer() {
        let table = RawTable::from_strings(vec![
            vec!["", "", "", ""],
            vec!["banner"],
            vec!["ID", "Name", "Price"],
            vec!["1", "Widget", "1.234,50"],
            vec!["2", "Gadget", "n/a", "extra"],
        ]);
        let rules = NormalizationRules {
            skip_leading_rows: 2,
            numeric_columns: vec![ColumnSpec::name("Price")],
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::xlsx(dir.path().join("export"));

        let mut source = StaticSource(Some(table));
        let summary = run(&mut source, &rules, &target).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, 3);
        // One unparsable price, one over-long row.
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.format, Format::Xlsx);
        assert!(summary.path.exists());
    }

    #[test]
    fn empty_source_still_produces_an_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::xlsx(dir.path().join("empty"));

        let mut source = StaticSource(None);
        let summary = run(&mut source, &NormalizationRules::default(), &target).unwrap();

        assert_eq!(summary.rows, 0);
        assert_eq!(summary.columns, 0);
        assert_eq!(summary.warnings, 0);
        assert!(summary.path.exists());
    }

    #[test]
    fn unavailable_source_aborts_the_run() {
        struct DownSource;
        impl RecordSource for DownSource {
            fn fetch(&mut self) -> Result<RawTable, SourceError> {
                Err(SourceError::unavailable(anyhow::anyhow!("connection refused")))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::xlsx(dir.path().join("never"));
        let err = run(&mut DownSource, &NormalizationRules::default(), &target).unwrap_err();
        assert!(err.to_string().contains("source unavailable"));
        assert!(!target.path.exists());
    }

    #[test]
    fn typed_cells_survive_the_pipeline() {
        let mut table = RawTable::new();
        table.push_row(vec!["page".into(), "price".into()]);
        table.push_row(vec![RawCell::Number(1.0), RawCell::Text("$1.990".into())]);
        let rules = NormalizationRules {
            numeric_columns: vec![ColumnSpec::name("page"), ColumnSpec::name("price")],
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::xlsx(dir.path().join("typed"));

        let summary = run_table(table, &rules, &target).unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.warnings, 0);
    }
}
