pub mod backends;
pub mod config;
pub mod error;
pub mod read;
pub mod reader_writer;
pub mod registry;
pub mod style;
pub mod traits;
pub mod write;

#[cfg(feature = "calamine")]
pub use backends::CalamineBackend;
#[cfg(feature = "umya")]
pub use backends::UmyaBackend;
pub use backends::{MemoryBackend, MemoryBook};
pub use config::{Locale, WorkbookConfig};
pub use error::{Result, WorkbookError};
pub use read::{ReadStart, RowRead};
pub use reader_writer::{ExcelReaderWriter, TableReaderWriter};
pub use registry::{BackendKind, BackendRegistry};
pub use style::{StyleCache, StyleKey};
pub use traits::{
    BackendCaps, PlannedCell, RawRow, SheetSink, SheetSource, SpreadsheetBackend, SpreadsheetFormat,
};
pub use write::{plan_cell, plan_row};

// Re-export for convenience
pub use sheetmap_common::{
    CellValue, Color, ColumnError, ColumnSet, Record, Row, RowCollection, RowStyle, Table,
    TypeMapper,
};
