#![cfg(feature = "umya")]

//! The cell-grid backend: cells are pulled one by one from an `umya`
//! workbook and written one by one into a new one.

use std::path::{Path, PathBuf};

use sheetmap_common::{CellErrorKind, CellValue, Color, ColumnSet};
use umya_spreadsheet::{
    Cell, CellRawValue, CellValue as UmyaValue, Spreadsheet, Style, Worksheet, reader::xlsx,
};

use crate::config::WorkbookConfig;
use crate::error::{Result, WorkbookError};
use crate::style::StyleKey;
use crate::traits::{
    BackendCaps, PlannedCell, RawRow, SheetSink, SheetSource, SpreadsheetBackend, SpreadsheetFormat,
};

/// Name of the sheet `umya_spreadsheet::new_file` creates.
pub(crate) const NEW_FILE_SHEET: &str = "Sheet1";

#[derive(Clone, Copy, Debug, Default)]
pub struct UmyaBackend;

impl UmyaBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetBackend for UmyaBackend {
    type Source = UmyaSource;
    type Sink = UmyaSink;

    fn name(&self) -> &'static str {
        "umya"
    }

    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            read_streaming: true,
            read_all: false,
            write_table: true,
            styles: true,
            autosize: true,
            formats: &[SpreadsheetFormat::OpenXml],
        }
    }

    fn open_read(&self, path: &Path, config: &WorkbookConfig) -> Result<UmyaSource> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("umya_open", path = %path.display()).entered();
        let book = xlsx::read(path).map_err(|e| WorkbookError::from_backend(path, e))?;
        UmyaSource::new(book, config.sheet_index, path)
    }

    fn open_write(&self, path: &Path, _config: &WorkbookConfig) -> Result<UmyaSink> {
        Ok(UmyaSink {
            book: Some(umya_spreadsheet::new_file()),
            sheet_name: NEW_FILE_SHEET.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/* ───────────────────────────── reading ───────────────────────────── */

/// True when a number-format code displays a date or time.
pub(crate) fn is_date_format(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    for ch in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if in_quotes || in_brackets => {}
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' | 'm' | 'M' => return true,
            _ => {}
        }
    }
    false
}

fn cell_is_date(cell: &Cell) -> bool {
    cell.get_style()
        .get_number_format()
        .is_some_and(|f| is_date_format(f.get_format_code()))
}

fn convert(cell: &Cell) -> Option<CellValue> {
    let cv: &UmyaValue = cell.get_cell_value();
    match cv.get_raw_value() {
        CellRawValue::Empty => None,
        CellRawValue::Numeric(n) if cell_is_date(cell) => Some(CellValue::from_serial_number(*n)),
        CellRawValue::Numeric(n) => Some(CellValue::Number(*n)),
        CellRawValue::Bool(b) => Some(CellValue::Boolean(*b)),
        CellRawValue::String(s) => Some(CellValue::Text(s.to_string())),
        CellRawValue::RichText(rt) => Some(CellValue::Text(rt.get_text().to_string())),
        CellRawValue::Error(_) => Some(CellValue::Error(
            CellErrorKind::parse(cv.get_value().as_ref()).unwrap_or(CellErrorKind::Value),
        )),
        CellRawValue::Lazy(s) => {
            let txt: &str = s.as_ref();
            Some(if let Ok(n) = txt.parse::<f64>() {
                CellValue::Number(n)
            } else if txt.eq_ignore_ascii_case("TRUE") {
                CellValue::Boolean(true)
            } else if txt.eq_ignore_ascii_case("FALSE") {
                CellValue::Boolean(false)
            } else {
                CellValue::Text(txt.to_string())
            })
        }
    }
}

/// One sheet of an opened workbook, read cell by cell.
pub struct UmyaSource {
    book: Option<Spreadsheet>,
    sheet: usize,
    path: PathBuf,
    width: u32,
    height: u32,
}

impl UmyaSource {
    fn new(book: Spreadsheet, sheet: usize, path: &Path) -> Result<Self> {
        let (width, height) = book
            .get_sheet(&sheet)
            .map(Worksheet::get_highest_column_and_row)
            .ok_or_else(|| {
                WorkbookError::io(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("workbook has no sheet at index {sheet}"),
                    ),
                )
            })?;
        Ok(Self {
            book: Some(book),
            sheet,
            path: path.to_path_buf(),
            width,
            height,
        })
    }

    fn worksheet(&self) -> Result<&Worksheet> {
        self.book
            .as_ref()
            .and_then(|b| b.get_sheet(&self.sheet))
            .ok_or_else(|| {
                WorkbookError::io(
                    &self.path,
                    std::io::Error::other("workbook was closed"),
                )
            })
    }

    /// Cells of 1-based sheet row `row`; `None` when no cell holds a value.
    fn sheet_row(&self, row: u32) -> Result<Option<RawRow>> {
        let ws = self.worksheet()?;
        let cells: RawRow = (1..=self.width)
            .map(|col| ws.get_cell((col, row)).and_then(convert))
            .collect();
        Ok(cells.iter().any(Option::is_some).then_some(cells))
    }
}

impl SheetSource for UmyaSource {
    fn header_cells(&mut self) -> Result<RawRow> {
        if self.height == 0 {
            return Ok(RawRow::new());
        }
        Ok(self.sheet_row(1)?.unwrap_or_default())
    }

    fn data_row_count(&self) -> usize {
        self.height.saturating_sub(1) as usize
    }

    fn data_row(&mut self, index: usize) -> Result<Option<RawRow>> {
        let row = index as u32 + 2;
        if row > self.height {
            return Ok(None);
        }
        self.sheet_row(row)
    }

    fn close(&mut self) {
        self.book = None;
    }
}

impl Drop for UmyaSource {
    fn drop(&mut self) {
        self.close();
    }
}

/* ───────────────────────────── writing ───────────────────────────── */

/// A style carrying the key's font color, weight and fill.
pub(crate) fn build_style(key: &StyleKey<String>) -> Style {
    let mut style = Style::default();
    let font = style.get_font_mut();
    font.set_bold(key.bold);
    font.get_color_mut().set_argb(key.foreground.as_str());
    if let Some(background) = &key.background {
        style.set_background_color(background.as_str());
    }
    style
}

/// Store one planned cell at 0-based `(row, column)`.
pub(crate) fn put_cell(ws: &mut Worksheet, row: usize, column: usize, cell: &PlannedCell, style: Option<&Style>) {
    let target = ws.get_cell_mut((column as u32 + 1, row as u32 + 1));
    if let Some(style) = style {
        target.set_style(style.clone());
    }
    match cell {
        PlannedCell::Number(n) => {
            target.set_value_number(*n);
        }
        PlannedCell::Boolean(b) => {
            target.set_value_bool(*b);
        }
        PlannedCell::Text(s) => {
            target.set_value_string(s.as_str());
        }
        PlannedCell::Blank => {
            target.set_blank();
        }
        PlannedCell::Date { serial, format } => {
            target.set_value_number(*serial);
            target
                .get_style_mut()
                .get_number_format_mut()
                .set_format_code(format.as_str());
        }
    }
}

pub(crate) fn sheet_mut<'a>(book: &'a mut Spreadsheet, name: &str, path: &Path) -> Result<&'a mut Worksheet> {
    book.get_sheet_by_name_mut(name).ok_or_else(|| {
        WorkbookError::io(
            path,
            std::io::Error::other(format!("sheet '{name}' is missing from the workbook")),
        )
    })
}

pub(crate) fn save_book(book: &Spreadsheet, path: &Path) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path).map_err(|e| WorkbookError::from_backend(path, e))
}

pub(crate) fn argb(color: Color) -> String {
    color.to_string()
}

/// A new single-sheet workbook written cell by cell.
pub struct UmyaSink {
    book: Option<Spreadsheet>,
    sheet_name: String,
    path: PathBuf,
}

impl UmyaSink {
    fn worksheet(&mut self) -> Result<&mut Worksheet> {
        let book = self.book.as_mut().ok_or_else(|| {
            WorkbookError::io(&self.path, std::io::Error::other("workbook was closed"))
        })?;
        sheet_mut(book, &self.sheet_name, &self.path)
    }
}

impl SheetSink for UmyaSink {
    type Color = String;
    type Style = Style;

    fn set_sheet_name(&mut self, name: &str) -> Result<()> {
        self.worksheet()?.set_name(name);
        self.sheet_name = name.to_string();
        Ok(())
    }

    fn write_header(&mut self, columns: &ColumnSet, style: Option<&Style>) -> Result<()> {
        let ws = self.worksheet()?;
        for (c, name) in columns.iter().enumerate() {
            put_cell(ws, 0, c, &PlannedCell::Text(name.to_string()), style);
        }
        Ok(())
    }

    fn write_row(&mut self, row: usize, cells: &[PlannedCell], style: Option<&Style>) -> Result<()> {
        let ws = self.worksheet()?;
        for (c, cell) in cells.iter().enumerate() {
            put_cell(ws, row, c, cell, style);
        }
        Ok(())
    }

    fn resolve_color(&self, color: Color) -> String {
        argb(color)
    }

    fn create_style(&mut self, key: &StyleKey<String>) -> Style {
        build_style(key)
    }

    fn autosize_column(&mut self, column: usize) -> Result<()> {
        self.worksheet()?
            .get_column_dimension_by_number_mut(&(column as u32 + 1))
            .set_auto_width(true);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let book = self.book.as_ref().ok_or_else(|| {
            WorkbookError::io(&self.path, std::io::Error::other("workbook was closed"))
        })?;
        save_book(book, &self.path)
    }

    fn close(&mut self) {
        self.book = None;
    }
}

impl Drop for UmyaSink {
    fn drop(&mut self) {
        self.close();
    }
}
