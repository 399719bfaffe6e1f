use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use sheetmap_common::{ColumnError, ConversionError};
use thiserror::Error;

use crate::traits::SpreadsheetFormat;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Everything a read or write can fail with.
///
/// Validation failures (`InvalidColumns`, `Argument`, `Record`) are kept apart
/// from environment failures (`Io`, `EngineUnavailable`) so callers can tell
/// a bad header from a missing file.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("invalid header: {0}")]
    InvalidColumns(#[from] ColumnError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("argument `{name}`: {reason}")]
    Argument { name: &'static str, reason: String },

    #[error("spreadsheet engine '{engine}' is unavailable: {reason}")]
    EngineUnavailable { engine: String, reason: String },

    /// `row` is the 1-based sheet row (the header is row 1).
    #[error("row {row}, column '{column}': {reason}")]
    Record {
        row: usize,
        column: String,
        #[source]
        reason: ConversionError,
    },
}

pub type Result<T, E = WorkbookError> = std::result::Result<T, E>;

impl WorkbookError {
    pub fn io(path: impl AsRef<Path>, source: impl Into<BoxError>) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    /// Wrap a backend error, keeping it as the source.
    pub fn from_backend<E>(path: impl AsRef<Path>, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::io(path, err)
    }

    pub fn unsupported_format(path: impl AsRef<Path>, format: SpreadsheetFormat, action: &str) -> Self {
        Self::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("{action} {format} workbooks is not supported by this backend"),
            ),
        )
    }

    pub fn argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            name,
            reason: reason.into(),
        }
    }

    /// `true` for header, argument and record failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidColumns(_) | Self::Argument { .. } | Self::Record { .. }
        )
    }

    /// The underlying `std::io::Error`, when the failure came from the
    /// filesystem.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } => source
                .downcast_ref::<std::io::Error>()
                .map(std::io::Error::kind),
            _ => None,
        }
    }
}
