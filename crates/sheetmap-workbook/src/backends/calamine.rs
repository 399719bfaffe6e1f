#![cfg(feature = "calamine")]

//! The used-range backend: the whole used range of a sheet is materialised
//! in one array on open, and writes are buffered and pushed as one block on
//! save.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Sheets, Xls, Xlsx, open_workbook};
use chrono::NaiveDateTime;
use sheetmap_common::{CellErrorKind, CellValue, Color, ColumnSet};
use umya_spreadsheet::Style;

use crate::backends::umya::{NEW_FILE_SHEET, argb, build_style, put_cell, save_book, sheet_mut};
use crate::config::WorkbookConfig;
use crate::error::{Result, WorkbookError};
use crate::style::StyleKey;
use crate::traits::{
    BackendCaps, PlannedCell, RawRow, SheetSink, SheetSource, SpreadsheetBackend, SpreadsheetFormat,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct CalamineBackend;

impl CalamineBackend {
    pub fn new() -> Self {
        Self
    }

    fn open_sheets(path: &Path) -> Result<Sheets<BufReader<File>>> {
        Ok(match SpreadsheetFormat::from_path(path) {
            SpreadsheetFormat::OpenXml => {
                let wb: Xlsx<_> = open_workbook(path).map_err(|e| WorkbookError::from_backend(path, e))?;
                Sheets::Xlsx(wb)
            }
            SpreadsheetFormat::Xls => {
                let wb: Xls<_> = open_workbook(path).map_err(|e| WorkbookError::from_backend(path, e))?;
                Sheets::Xls(wb)
            }
        })
    }
}

impl SpreadsheetBackend for CalamineBackend {
    type Source = CalamineSource;
    type Sink = CalamineSink;

    fn name(&self) -> &'static str {
        "calamine"
    }

    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            read_streaming: false,
            read_all: true,
            write_table: true,
            styles: true,
            autosize: true,
            formats: &[SpreadsheetFormat::OpenXml, SpreadsheetFormat::Xls],
        }
    }

    fn open_read(&self, path: &Path, config: &WorkbookConfig) -> Result<CalamineSource> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("calamine_open", path = %path.display()).entered();
        let mut sheets = Self::open_sheets(path)?;
        let range = sheets
            .worksheet_range_at(config.sheet_index)
            .ok_or_else(|| {
                WorkbookError::io(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("workbook has no sheet at index {}", config.sheet_index),
                    ),
                )
            })?
            .map_err(|e| WorkbookError::from_backend(path, e))?;
        Ok(CalamineSource::new(range))
    }

    fn open_write(&self, path: &Path, _config: &WorkbookConfig) -> Result<CalamineSink> {
        Ok(CalamineSink {
            path: path.to_path_buf(),
            sheet_name: String::new(),
            block: Vec::new(),
            autosize: Vec::new(),
        })
    }
}

/* ───────────────────────────── reading ───────────────────────────── */

fn convert(data: &Data) -> Option<CellValue> {
    Some(match data {
        Data::Empty => return None,
        Data::String(s) if s.is_empty() => return None,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(match e {
            calamine::CellErrorType::Div0 => CellErrorKind::Div,
            calamine::CellErrorType::NA => CellErrorKind::Na,
            calamine::CellErrorType::Name => CellErrorKind::Name,
            calamine::CellErrorType::Null => CellErrorKind::Null,
            calamine::CellErrorType::Num => CellErrorKind::Num,
            calamine::CellErrorType::Ref => CellErrorKind::Ref,
            calamine::CellErrorType::GettingData => CellErrorKind::GettingData,
            _ => CellErrorKind::Value,
        }),
        Data::DateTime(dt) => CellValue::from_serial_number(dt.as_f64()),
        Data::DateTimeIso(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            Ok(dt) => CellValue::DateTime(dt),
            Err(_) => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    })
}

/// The used range of one sheet, addressed from A1 like the grid backend:
/// sheet row 0 is the header even when the used range starts lower or
/// further right.
pub struct CalamineSource {
    range: Option<Range<Data>>,
    width: u32,
    height: u32,
}

impl CalamineSource {
    fn new(range: Range<Data>) -> Self {
        let (height, width) = range.end().map_or((0, 0), |(row, col)| (row + 1, col + 1));
        Self {
            range: Some(range),
            width,
            height,
        }
    }

    fn range_row(&self, row: u32) -> Option<RawRow> {
        let range = self.range.as_ref()?;
        if row >= self.height {
            return None;
        }
        let cells: RawRow = (0..self.width)
            .map(|col| range.get_value((row, col)).and_then(convert))
            .collect();
        // an all-empty row inside the used range is a gap
        cells.iter().any(Option::is_some).then_some(cells)
    }
}

impl SheetSource for CalamineSource {
    fn header_cells(&mut self) -> Result<RawRow> {
        Ok(self.range_row(0).unwrap_or_default())
    }

    fn data_row_count(&self) -> usize {
        self.height.saturating_sub(1) as usize
    }

    fn data_row(&mut self, index: usize) -> Result<Option<RawRow>> {
        Ok(u32::try_from(index + 1).ok().and_then(|row| self.range_row(row)))
    }

    fn close(&mut self) {
        self.range = None;
    }
}

impl Drop for CalamineSource {
    fn drop(&mut self) {
        self.close();
    }
}

/* ───────────────────────────── writing ───────────────────────────── */

struct BlockRow {
    row: usize,
    cells: Vec<PlannedCell>,
    style: Option<Style>,
}

/// Buffers every row and writes the block into a fresh workbook on save.
pub struct CalamineSink {
    path: PathBuf,
    sheet_name: String,
    block: Vec<BlockRow>,
    autosize: Vec<usize>,
}

impl SheetSink for CalamineSink {
    type Color = String;
    type Style = Style;

    fn set_sheet_name(&mut self, name: &str) -> Result<()> {
        self.sheet_name = name.to_string();
        Ok(())
    }

    fn write_header(&mut self, columns: &ColumnSet, style: Option<&Style>) -> Result<()> {
        self.block.push(BlockRow {
            row: 0,
            cells: columns
                .iter()
                .map(|name| PlannedCell::Text(name.to_string()))
                .collect(),
            style: style.cloned(),
        });
        Ok(())
    }

    fn write_row(&mut self, row: usize, cells: &[PlannedCell], style: Option<&Style>) -> Result<()> {
        self.block.push(BlockRow {
            row,
            cells: cells.to_vec(),
            style: style.cloned(),
        });
        Ok(())
    }

    fn resolve_color(&self, color: Color) -> String {
        argb(color)
    }

    fn create_style(&mut self, key: &StyleKey<String>) -> Style {
        build_style(key)
    }

    fn autosize_column(&mut self, column: usize) -> Result<()> {
        self.autosize.push(column);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let mut book = umya_spreadsheet::new_file();
        let ws = sheet_mut(&mut book, NEW_FILE_SHEET, &self.path)?;
        if !self.sheet_name.is_empty() {
            ws.set_name(self.sheet_name.as_str());
        }
        for block_row in &self.block {
            for (c, cell) in block_row.cells.iter().enumerate() {
                put_cell(ws, block_row.row, c, cell, block_row.style.as_ref());
            }
        }
        for column in &self.autosize {
            ws.get_column_dimension_by_number_mut(&(*column as u32 + 1))
                .set_auto_width(true);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = self.block.len(), "flushing row block");
        save_book(&book, &self.path)
    }

    fn close(&mut self) {
        self.block.clear();
        self.autosize.clear();
    }
}
