//! An in-memory cell grid keyed by path.
//!
//! Used as a test double and for round-trips that never touch the disk. Books
//! live in a store shared by every clone of the backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sheetmap_common::{CellValue, Color, ColumnSet};

use crate::config::WorkbookConfig;
use crate::error::{Result, WorkbookError};
use crate::style::StyleKey;
use crate::traits::{
    BackendCaps, PlannedCell, RawRow, SheetSink, SheetSource, SpreadsheetBackend, SpreadsheetFormat,
};

/// Style handle of the memory backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryStyle {
    pub id: usize,
    pub key: StyleKey<Color>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryCell {
    pub value: CellValue,
    /// Number-format code of date cells.
    pub format: Option<String>,
    pub style: Option<MemoryStyle>,
}

/// One stored workbook with a single sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryBook {
    pub sheet_name: String,
    /// `(row, column)`, both 0-based.
    pub cells: BTreeMap<(usize, usize), MemoryCell>,
    pub autosized: Vec<usize>,
}

impl MemoryBook {
    /// Build a book from raw rows; a `None` row leaves a physical gap.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Option<RawRow>>,
    {
        let mut cells = BTreeMap::new();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().flatten().enumerate() {
                if let Some(value) = value {
                    cells.insert(
                        (r, c),
                        MemoryCell {
                            value,
                            format: None,
                            style: None,
                        },
                    );
                }
            }
        }
        Self {
            sheet_name: "sheet1".to_string(),
            cells,
            autosized: Vec::new(),
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&MemoryCell> {
        self.cells.get(&(row, column))
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.cell(row, column).map(|c| &c.value)
    }

    /// Number of rows up to the last stored cell.
    pub fn height(&self) -> usize {
        self.cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0)
    }

    fn row(&self, row: usize) -> Option<RawRow> {
        let mut cells = self.cells.range((row, 0)..(row + 1, 0)).peekable();
        cells.peek()?;
        let mut out = RawRow::new();
        for ((_, c), cell) in cells {
            if out.len() <= *c {
                out.resize(*c + 1, None);
            }
            out[*c] = Some(cell.value.clone());
        }
        Some(out)
    }
}

#[derive(Default)]
struct Store {
    books: RwLock<FxHashMap<PathBuf, MemoryBook>>,
    open_sources: AtomicUsize,
    styles_created: AtomicUsize,
}

/// In-memory backend. Clones share one store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, book: MemoryBook) {
        self.store.books.write().insert(path.into(), book);
    }

    pub fn book(&self, path: impl AsRef<Path>) -> Option<MemoryBook> {
        self.store.books.read().get(path.as_ref()).cloned()
    }

    /// Sources opened and not yet closed.
    pub fn open_sources(&self) -> usize {
        self.store.open_sources.load(Ordering::SeqCst)
    }

    /// Total styles created by all sinks of this backend.
    pub fn styles_created(&self) -> usize {
        self.store.styles_created.load(Ordering::SeqCst)
    }
}

impl SpreadsheetBackend for MemoryBackend {
    type Source = MemorySource;
    type Sink = MemorySink;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            read_streaming: true,
            read_all: true,
            write_table: true,
            styles: true,
            autosize: true,
            formats: &[SpreadsheetFormat::OpenXml, SpreadsheetFormat::Xls],
        }
    }

    fn open_read(&self, path: &Path, _config: &WorkbookConfig) -> Result<MemorySource> {
        let book = self.book(path).ok_or_else(|| {
            WorkbookError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such workbook"),
            )
        })?;
        self.store.open_sources.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySource {
            book: Some(book),
            store: self.store.clone(),
        })
    }

    fn open_write(&self, path: &Path, config: &WorkbookConfig) -> Result<MemorySink> {
        Ok(MemorySink {
            path: path.to_path_buf(),
            book: MemoryBook {
                sheet_name: config.default_sheet_name.clone(),
                ..Default::default()
            },
            store: self.store.clone(),
        })
    }
}

pub struct MemorySource {
    book: Option<MemoryBook>,
    store: Arc<Store>,
}

impl SheetSource for MemorySource {
    fn header_cells(&mut self) -> Result<RawRow> {
        Ok(self.book.as_ref().and_then(|b| b.row(0)).unwrap_or_default())
    }

    fn data_row_count(&self) -> usize {
        self.book
            .as_ref()
            .map_or(0, |b| b.height().saturating_sub(1))
    }

    fn data_row(&mut self, index: usize) -> Result<Option<RawRow>> {
        Ok(self.book.as_ref().and_then(|b| b.row(index + 1)))
    }

    fn close(&mut self) {
        if self.book.take().is_some() {
            self.store.open_sources.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemorySource {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct MemorySink {
    path: PathBuf,
    book: MemoryBook,
    store: Arc<Store>,
}

impl MemorySink {
    fn put(&mut self, row: usize, column: usize, cell: MemoryCell) {
        self.book.cells.insert((row, column), cell);
    }
}

impl SheetSink for MemorySink {
    type Color = Color;
    type Style = MemoryStyle;

    fn set_sheet_name(&mut self, name: &str) -> Result<()> {
        self.book.sheet_name = name.to_string();
        Ok(())
    }

    fn write_header(&mut self, columns: &ColumnSet, style: Option<&MemoryStyle>) -> Result<()> {
        for (c, name) in columns.iter().enumerate() {
            self.put(
                0,
                c,
                MemoryCell {
                    value: CellValue::Text(name.to_string()),
                    format: None,
                    style: style.cloned(),
                },
            );
        }
        Ok(())
    }

    fn write_row(&mut self, row: usize, cells: &[PlannedCell], style: Option<&MemoryStyle>) -> Result<()> {
        for (c, cell) in cells.iter().enumerate() {
            let (value, format) = match cell {
                PlannedCell::Blank => continue,
                PlannedCell::Number(n) => (CellValue::Number(*n), None),
                PlannedCell::Boolean(b) => (CellValue::Boolean(*b), None),
                PlannedCell::Text(s) => (CellValue::Text(s.clone()), None),
                PlannedCell::Date { serial, format } => {
                    (CellValue::from_serial_number(*serial), Some(format.clone()))
                }
            };
            self.put(
                row,
                c,
                MemoryCell {
                    value,
                    format,
                    style: style.cloned(),
                },
            );
        }
        Ok(())
    }

    fn resolve_color(&self, color: Color) -> Color {
        color
    }

    fn create_style(&mut self, key: &StyleKey<Color>) -> MemoryStyle {
        let id = self.store.styles_created.fetch_add(1, Ordering::SeqCst);
        MemoryStyle {
            id,
            key: key.clone(),
        }
    }

    fn autosize_column(&mut self, column: usize) -> Result<()> {
        self.book.autosized.push(column);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.store
            .books
            .write()
            .insert(self.path.clone(), std::mem::take(&mut self.book));
        Ok(())
    }

    fn close(&mut self) {}
}
