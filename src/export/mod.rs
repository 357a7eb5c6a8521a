//! Resilient persistence: try the primary format, fall back to delimited
//! text, fail only when both writers fail.

pub mod delimited;
pub mod xlsx;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::error::PersistenceFailed;
use crate::table::NormalizedTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Format {
    Xlsx,
    Csv,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Xlsx => "xlsx",
            Format::Csv => "csv",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Primary output path and format. The fallback path is implicit: same base
/// name, delimited-text extension.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub format: Format,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>, format: Format) -> Self {
        let mut path = path.into();
        path.set_extension(format.extension());
        Self { path, format }
    }

    pub fn xlsx(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Xlsx)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.path.with_extension(Format::Csv.extension())
    }

    fn sheet_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string())
    }
}

/// Which format actually landed on disk, and where.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub format: Format,
    pub path: PathBuf,
    pub fallback_used: bool,
}

/// Attempt the primary serializer; on any failure attempt the delimited
/// fallback; error only when both fail, carrying both causes.
pub fn write(
    table: &NormalizedTable,
    target: &OutputTarget,
) -> Result<WriteReport, PersistenceFailed> {
    let primary = match target.format {
        Format::Xlsx => xlsx::write_xlsx(table, &target.path, &target.sheet_name()),
        Format::Csv => delimited::write_csv(table, &target.path),
    };
    let primary_err = match primary {
        Ok(()) => {
            return Ok(WriteReport {
                format: target.format,
                path: target.path.clone(),
                fallback_used: false,
            })
        }
        Err(err) => err,
    };

    let fallback_path = target.fallback_path();
    warn!(
        primary = %target.path.display(),
        fallback = %fallback_path.display(),
        error = %format!("{primary_err:#}"),
        "primary writer failed; falling back to delimited text"
    );
    match delimited::write_csv(table, &fallback_path) {
        Ok(()) => Ok(WriteReport {
            format: Format::Csv,
            path: fallback_path,
            fallback_used: true,
        }),
        Err(fallback_err) => Err(PersistenceFailed {
            primary_path: target.path.clone(),
            primary: primary_err,
            fallback_path,
            fallback: fallback_err,
        }),
    }
}
