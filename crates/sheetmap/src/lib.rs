//! Meta crate that re-exports the sheetmap building blocks with sensible
//! defaults. Downstream users can depend on this crate and pick backends via
//! feature flags while keeping access to the underlying crates.
//!
//! The `Record` derive expands to `sheetmap_common` paths, so crates that
//! derive it also list `sheetmap-common` as a dependency.

pub use sheetmap_common as common;
pub use sheetmap_workbook as workbook;

pub use sheetmap_common::{
    CellValue, Color, ColumnError, ColumnSet, ConversionError, FieldError, FieldInfo, FromCell,
    Record, Row, RowCollection, RowStyle, Table, ToCell, TypeMapper,
};

#[cfg(feature = "macros")]
pub use sheetmap_macros::Record;

pub use sheetmap_workbook::{
    BackendCaps, BackendKind, BackendRegistry, ExcelReaderWriter, Locale, MemoryBackend,
    MemoryBook, ReadStart, RowRead, SpreadsheetFormat, TableReaderWriter, WorkbookConfig,
    WorkbookError,
};

#[cfg(feature = "calamine")]
pub use sheetmap_workbook::CalamineBackend;
#[cfg(feature = "umya")]
pub use sheetmap_workbook::UmyaBackend;

/// Read/write through the default backend of a fresh registry.
pub fn default_reader_writer() -> Result<Box<dyn TableReaderWriter>, WorkbookError> {
    BackendRegistry::with_defaults().create_default()
}
