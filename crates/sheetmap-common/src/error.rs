//! Error types shared by the data model.
//!
//! - **`CellErrorKind`**  : error codes a spreadsheet cell can hold (`#N/A`, …)
//! - **`ColumnError`**    : header/column invariant violations
//! - **`ConversionError`**: a cell value that does not fit a typed field

use std::fmt;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised Excel error codes.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display`
/// renders them exactly as Excel shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CellErrorKind {
    Null,
    Ref,
    Name,
    Value,
    Div,
    Na,
    Num,
    GettingData,
}

impl fmt::Display for CellErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
            Self::GettingData => "#GETTING_DATA",
        })
    }
}

impl CellErrorKind {
    /// Parse the Excel rendering of an error code; `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "#null!" => Self::Null,
            "#ref!" => Self::Ref,
            "#name?" => Self::Name,
            "#value!" => Self::Value,
            "#div/0!" => Self::Div,
            "#n/a" => Self::Na,
            "#num!" => Self::Num,
            "#getting_data" => Self::GettingData,
            _ => return None,
        })
    }
}

/// A header row (or a row/column binding) that breaks the column invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    /// Every 1-based position whose header is empty or whitespace-only.
    #[error("column headers cannot be empty; column positions: {}", join(.positions))]
    EmptyNames { positions: Vec<usize> },

    /// Every header that occurs more than once, each listed once.
    #[error("column headers must be unique; duplicated: {}", quoted(.names))]
    DuplicateNames { names: Vec<String> },

    /// A row bound to a different column set was added to a collection.
    #[error("row is bound to columns [{}], collection uses [{}]", quoted(.found), quoted(.expected))]
    Mismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

fn join(positions: &[usize]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(",")
}

/// A cell value that cannot be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} does not fit in {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("cannot parse '{text}' as {target}")]
    Parse { text: String, target: &'static str },

    #[error("missing value")]
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_roundtrips_through_display() {
        for kind in [
            CellErrorKind::Null,
            CellErrorKind::Ref,
            CellErrorKind::Name,
            CellErrorKind::Value,
            CellErrorKind::Div,
            CellErrorKind::Na,
            CellErrorKind::Num,
            CellErrorKind::GettingData,
        ] {
            assert_eq!(CellErrorKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(CellErrorKind::parse("#BOGUS"), None);
    }

    #[test]
    fn column_error_messages_enumerate_all_offenders() {
        let err = ColumnError::EmptyNames {
            positions: vec![2, 5],
        };
        assert!(err.to_string().ends_with("column positions: 2,5"));

        let err = ColumnError::DuplicateNames {
            names: vec!["Id".into(), "Name".into()],
        };
        assert!(err.to_string().ends_with("duplicated: 'Id','Name'"));
    }
}
