//! Error types for loading and patching workbooks

use std::path::PathBuf;
use thiserror::Error;

/// Why a sheet could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("workbook not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("failed to read {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet '{0}' has no header row")]
    NoHeader(String),
}

/// Why a typed record set could not be extracted from a sheet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("sheet '{sheet}' is missing column '{column}'")]
    MissingColumn { sheet: String, column: String },
}

/// Why a quota patch was refused or could not be confirmed
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("only .xlsx and .xlsm workbooks can be patched: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("sheet '{0}' is not part of the workbook archive")]
    SheetPartNotFound(String),

    #[error("no row in '{sheet}' matches {month} for the requested agents")]
    NoMatchingRows { sheet: String, month: String },

    #[error("cell {0} was not found in the sheet XML")]
    CellNotFound(String),

    #[error("cell {cell} holds {found:?} after writing {expected}")]
    VerificationFailed {
        cell: String,
        expected: i64,
        found: Option<i64>,
    },

    #[error("no backup found for {}", .0.display())]
    NoBackup(PathBuf),
}
