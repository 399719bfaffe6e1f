use std::fmt;
use std::hash::Hash;
use std::path::Path;

use sheetmap_common::{CellValue, Color, ColumnSet};

use crate::config::WorkbookConfig;
use crate::error::Result;
use crate::style::StyleKey;

/// On-disk workbook format, chosen from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpreadsheetFormat {
    /// Office Open XML (`.xlsx`).
    OpenXml,
    /// Legacy binary workbook (`.xls`).
    Xls,
}

impl SpreadsheetFormat {
    /// `.xlsx` (any case) is OpenXml; every other path is treated as legacy.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Self::OpenXml,
            _ => Self::Xls,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::OpenXml => "xlsx",
            Self::Xls => "xls",
        }
    }
}

impl fmt::Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What a backend can do. The reader/writer refuses operations a backend does
/// not advertise.
#[derive(Clone, Debug, Default)]
pub struct BackendCaps {
    /// Rows are pulled one at a time from the open file.
    pub read_streaming: bool,
    /// The used range is materialised in one step.
    pub read_all: bool,
    pub write_table: bool,
    pub styles: bool,
    pub autosize: bool,
    /// Readable formats. Only OpenXml is ever written.
    pub formats: &'static [SpreadsheetFormat],
}

impl BackendCaps {
    pub fn can_read(&self, format: SpreadsheetFormat) -> bool {
        (self.read_streaming || self.read_all) && self.formats.contains(&format)
    }

    /// Only OpenXml is ever written: no backend can produce the legacy
    /// binary format, so `.xls` targets are refused even when listed in
    /// `formats`.
    pub fn can_write(&self, format: SpreadsheetFormat) -> bool {
        self.write_table && format == SpreadsheetFormat::OpenXml
    }
}

/// A cell as the sink should store it, after the value policy ran.
#[derive(Clone, Debug, PartialEq)]
pub enum PlannedCell {
    Number(f64),
    /// Serial date number shown with `format` (a number-format code).
    Date { serial: f64, format: String },
    Boolean(bool),
    Text(String),
    Blank,
}

/// One raw row: `None` where no cell is present.
pub type RawRow = Vec<Option<CellValue>>;

/// An open sheet being read. Dropping the source releases it.
pub trait SheetSource {
    /// Cells of the header row (the first row of the sheet).
    fn header_cells(&mut self) -> Result<RawRow>;

    /// Number of rows after the header, including any gaps.
    fn data_row_count(&self) -> usize;

    /// Data row `index` (0 = the row right after the header); `None` when the
    /// row is physically absent or past the end.
    fn data_row(&mut self, index: usize) -> Result<Option<RawRow>>;

    /// Release the underlying file. Idempotent.
    fn close(&mut self);
}

/// An open sheet being written.
pub trait SheetSink {
    /// Backend color identifier.
    type Color: Clone + Eq + Hash + Send + Sync;
    /// Backend style handle.
    type Style: Clone + Send + Sync;

    fn set_sheet_name(&mut self, name: &str) -> Result<()>;

    /// Write the header labels into row 0.
    fn write_header(&mut self, columns: &ColumnSet, style: Option<&Self::Style>) -> Result<()>;

    /// Write one cell per declared column into sheet row `row` (0-based).
    fn write_row(&mut self, row: usize, cells: &[PlannedCell], style: Option<&Self::Style>) -> Result<()>;

    fn resolve_color(&self, color: Color) -> Self::Color;

    fn create_style(&mut self, key: &StyleKey<Self::Color>) -> Self::Style;

    /// Key of the header emphasis: bold on black.
    fn header_style(&self) -> StyleKey<Self::Color> {
        StyleKey {
            foreground: self.resolve_color(Color::BLACK),
            background: None,
            bold: true,
        }
    }

    fn autosize_column(&mut self, column: usize) -> Result<()>;

    /// Persist the workbook to its path.
    fn save(&mut self) -> Result<()>;

    /// Release backend resources. Idempotent.
    fn close(&mut self);
}

/// A spreadsheet engine able to open sheets for reading and writing.
pub trait SpreadsheetBackend: Send + Sync {
    type Source: SheetSource;
    type Sink: SheetSink;

    fn name(&self) -> &'static str;

    fn capabilities(&self) -> BackendCaps;

    fn open_read(&self, path: &Path, config: &WorkbookConfig) -> Result<Self::Source>;

    fn open_write(&self, path: &Path, config: &WorkbookConfig) -> Result<Self::Sink>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension_case_insensitively() {
        assert_eq!(SpreadsheetFormat::from_path("a/b.XLSX"), SpreadsheetFormat::OpenXml);
        assert_eq!(SpreadsheetFormat::from_path("b.xlsx"), SpreadsheetFormat::OpenXml);
        assert_eq!(SpreadsheetFormat::from_path("b.xls"), SpreadsheetFormat::Xls);
        assert_eq!(SpreadsheetFormat::from_path("b.csv"), SpreadsheetFormat::Xls);
        assert_eq!(SpreadsheetFormat::from_path("noext"), SpreadsheetFormat::Xls);
    }

    #[test]
    fn caps_gate_formats() {
        let caps = BackendCaps {
            read_all: true,
            write_table: true,
            formats: &[SpreadsheetFormat::OpenXml, SpreadsheetFormat::Xls],
            ..Default::default()
        };
        assert!(caps.can_read(SpreadsheetFormat::Xls));
        assert!(caps.can_write(SpreadsheetFormat::OpenXml));
        assert!(!caps.can_write(SpreadsheetFormat::Xls));
        assert!(!BackendCaps::default().can_read(SpreadsheetFormat::OpenXml));
    }
}
