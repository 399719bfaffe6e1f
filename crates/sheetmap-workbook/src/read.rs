//! The streaming read protocol shared by every backend.
//!
//! 1. the header row becomes a [`ColumnSet`] and is validated before any data
//!    row is touched;
//! 2. `on_header` sees the data row count and the columns;
//! 3. rows are handed to the mapper one at a time, in file order, until the
//!    data ends, a gap row is met or the mapper cancels.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

use sheetmap_common::{CellValue, ColumnSet, Row};

use crate::error::Result;
use crate::traits::{RawRow, SheetSource};

/// What the header callback sees before the first data row.
#[derive(Debug, Clone, Copy)]
pub struct ReadStart<'a> {
    /// Rows after the header, gaps included.
    pub row_count: usize,
    pub columns: &'a Arc<ColumnSet>,
}

/// The row handed to a read mapper.
#[derive(Debug)]
pub struct RowRead {
    row: Row,
    index: usize,
    cancelled: bool,
}

impl RowRead {
    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn row_mut(&mut self) -> &mut Row {
        &mut self.row
    }

    /// Move the row out, leaving an empty row bound to the same columns.
    pub fn take_row(&mut self) -> Row {
        let empty = Row::new(self.row.columns().clone());
        std::mem::replace(&mut self.row, empty)
    }

    /// Zero-based data row index (0 = first row after the header).
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based sheet row number, counting the header as row 1.
    pub fn sheet_row(&self) -> usize {
        self.index + 2
    }

    /// Stop reading. The result returned for this row is discarded.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Closes the source on every exit path.
pub(crate) struct OpenSource<S: SheetSource>(S);

impl<S: SheetSource> OpenSource<S> {
    pub(crate) fn new(source: S) -> Self {
        Self(source)
    }
}

impl<S: SheetSource> Deref for OpenSource<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: SheetSource> DerefMut for OpenSource<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S: SheetSource> Drop for OpenSource<S> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Header text of one cell; absent and empty cells give no name.
fn header_name(cell: Option<CellValue>) -> Option<String> {
    match cell {
        None | Some(CellValue::Empty) => None,
        Some(CellValue::Text(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}

/// Build and validate the column set from raw header cells. Trailing absent
/// cells are not columns.
pub(crate) fn header_columns(mut cells: RawRow) -> Result<Arc<ColumnSet>> {
    while matches!(cells.last(), Some(None) | Some(Some(CellValue::Empty))) {
        cells.pop();
    }
    let columns = ColumnSet::from_header(cells.into_iter().map(header_name));
    columns.validate()?;
    Ok(Arc::new(columns))
}

fn bind(columns: &Arc<ColumnSet>, cells: RawRow) -> Row {
    Row::from_values(columns.clone(), cells.into_iter().take(columns.len()))
}

/// Run the protocol over an opened source. Returns the validated columns and
/// the mapper results in source order.
pub(crate) fn stream_rows<S, T, F, H>(
    source: S,
    path: &Path,
    mut mapper: F,
    on_header: Option<H>,
) -> Result<(Arc<ColumnSet>, Vec<T>)>
where
    S: SheetSource,
    F: FnMut(&mut RowRead) -> T,
    H: FnOnce(&ReadStart<'_>),
{
    let mut source = OpenSource::new(source);

    let columns = header_columns(source.header_cells()?)?;
    let row_count = source.data_row_count();
    #[cfg(feature = "tracing")]
    tracing::debug!(
        path = %path.display(),
        columns = columns.len(),
        rows = row_count,
        "header validated"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = path;

    if let Some(on_header) = on_header {
        on_header(&ReadStart {
            row_count,
            columns: &columns,
        });
    }

    let mut results = BTreeMap::new();
    for index in 0..row_count {
        let Some(cells) = source.data_row(index)? else {
            #[cfg(feature = "tracing")]
            tracing::debug!(index, "gap row ends the data");
            break;
        };
        let mut read = RowRead {
            row: bind(&columns, cells),
            index,
            cancelled: false,
        };
        let value = mapper(&mut read);
        if read.cancelled {
            #[cfg(feature = "tracing")]
            tracing::debug!(index, "read cancelled by mapper");
            break;
        }
        results.insert(index, value);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(rows = results.len(), "rows read");

    source.close();
    Ok((columns, results.into_values().collect()))
}
