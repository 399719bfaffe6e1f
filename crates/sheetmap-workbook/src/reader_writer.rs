use std::path::Path;
use std::sync::Arc;

use sheetmap_common::{ColumnSet, Record, RowCollection, Table, TypeMapper};

use crate::config::{Locale, WorkbookConfig};
use crate::error::{Result, WorkbookError};
use crate::read::{ReadStart, RowRead, stream_rows};
use crate::traits::{BackendCaps, SpreadsheetBackend, SpreadsheetFormat};
use crate::write::write_table;

fn check_path(path: &Path) -> Result<()> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(WorkbookError::argument("path", "must not be blank"));
    }
    Ok(())
}

/// Map one row to a record. A failure is stored and cancels the read.
fn record_from<T: Record>(read: &mut RowRead, failure: &mut Option<WorkbookError>) -> Option<T> {
    match TypeMapper::from_row::<T>(read.row()) {
        Ok(record) => Some(record),
        Err(err) => {
            *failure = Some(WorkbookError::Record {
                row: read.sheet_row(),
                column: err.label.to_string(),
                reason: err.source,
            });
            read.cancel();
            None
        }
    }
}

fn finish_records<T>(records: Vec<Option<T>>, failure: Option<WorkbookError>) -> Result<Vec<T>> {
    match failure {
        Some(err) => Err(err),
        None => Ok(records.into_iter().flatten().collect()),
    }
}

/// Reads sheets into rows or records and writes tables back, through one
/// backend.
pub struct ExcelReaderWriter<B: SpreadsheetBackend> {
    backend: B,
    config: WorkbookConfig,
}

impl<B: SpreadsheetBackend + Default> Default for ExcelReaderWriter<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: SpreadsheetBackend> ExcelReaderWriter<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, WorkbookConfig::default())
    }

    pub fn with_config(backend: B, config: WorkbookConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &WorkbookConfig {
        &self.config
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        check_path(path)?;
        let format = SpreadsheetFormat::from_path(path);
        if !self.backend.capabilities().can_read(format) {
            #[cfg(feature = "tracing")]
            tracing::warn!(backend = self.backend.name(), %format, "read refused");
            return Err(WorkbookError::unsupported_format(path, format, "reading"));
        }
        Ok(())
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        check_path(path)?;
        let format = SpreadsheetFormat::from_path(path);
        if !self.backend.capabilities().can_write(format) {
            #[cfg(feature = "tracing")]
            tracing::warn!(backend = self.backend.name(), %format, "write refused");
            return Err(WorkbookError::unsupported_format(path, format, "writing"));
        }
        Ok(())
    }

    /// Read the configured sheet into rows sharing the header's columns.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<RowCollection> {
        let path = path.as_ref();
        let (columns, rows) = self.read_inner(path, |r: &mut RowRead| r.take_row(), None::<fn(&ReadStart<'_>)>)?;
        Ok(RowCollection::from_rows(columns, rows)?)
    }

    /// Stream every data row through `mapper`. `on_header` runs once, after
    /// the header is validated and before the first row.
    pub fn read_with<T, F, H>(&self, path: impl AsRef<Path>, mapper: F, on_header: Option<H>) -> Result<Vec<T>>
    where
        F: FnMut(&mut RowRead) -> T,
        H: FnOnce(&ReadStart<'_>),
    {
        self.read_inner(path.as_ref(), mapper, on_header)
            .map(|(_, values)| values)
    }

    fn read_inner<T, F, H>(
        &self,
        path: &Path,
        mapper: F,
        on_header: Option<H>,
    ) -> Result<(Arc<ColumnSet>, Vec<T>)>
    where
        F: FnMut(&mut RowRead) -> T,
        H: FnOnce(&ReadStart<'_>),
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "sheetmap_read",
            backend = self.backend.name(),
            path = %path.display()
        )
        .entered();
        self.check_readable(path)?;
        let source = self.backend.open_read(path, &self.config)?;
        stream_rows(source, path, mapper, on_header)
    }

    /// Read every data row as a `T`, matching fields by label then name.
    pub fn read_records<T: Record>(&self, path: impl AsRef<Path>) -> Result<Vec<T>> {
        let mut failure = None;
        let records = self.read_with(
            path,
            |read: &mut RowRead| record_from(read, &mut failure),
            None::<fn(&ReadStart<'_>)>,
        )?;
        finish_records(records, failure)
    }

    /// Write `table` to `path`. `locale` defaults to the configured one.
    ///
    /// The header is validated before the target is opened; an invalid one
    /// leaves the file untouched.
    pub fn write_table(
        &self,
        path: impl AsRef<Path>,
        table: Option<&Table>,
        auto_resize: bool,
        locale: Option<&Locale>,
    ) -> Result<()> {
        let path = path.as_ref();
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "sheetmap_write",
            backend = self.backend.name(),
            path = %path.display()
        )
        .entered();
        check_path(path)?;
        let table = table.ok_or_else(|| WorkbookError::argument("table", "no table to write"))?;
        self.check_writable(path)?;
        table.columns.validate()?;
        let sink = self.backend.open_write(path, &self.config)?;
        write_table(
            sink,
            path,
            table,
            auto_resize,
            locale.unwrap_or(&self.config.locale),
            &self.config.default_sheet_name,
        )
    }

    /// Project `records` and write them; the header shows field labels.
    pub fn write_records<T: Record>(
        &self,
        path: impl AsRef<Path>,
        records: Option<&[T]>,
        auto_resize: bool,
        locale: Option<&Locale>,
    ) -> Result<()> {
        let records = records.ok_or_else(|| WorkbookError::argument("records", "no list to write"))?;
        let table = TypeMapper::project_table(records);
        self.write_table(path, Some(&table), auto_resize, locale)
    }

    pub fn write_rows(
        &self,
        path: impl AsRef<Path>,
        rows: &RowCollection,
        auto_resize: bool,
        locale: Option<&Locale>,
    ) -> Result<()> {
        self.write_table(path, Some(&rows.to_table()), auto_resize, locale)
    }
}

/// Object-safe view of a reader/writer, for choosing a backend at runtime.
pub trait TableReaderWriter: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn capabilities(&self) -> BackendCaps;

    fn read(&self, path: &Path) -> Result<RowCollection>;

    /// Visit rows; cancelling a row stops the read.
    fn read_each(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&mut RowRead),
        on_header: Option<&mut dyn FnMut(&ReadStart<'_>)>,
    ) -> Result<()>;

    fn write_table(&self, path: &Path, table: Option<&Table>, auto_resize: bool, locale: Option<&Locale>) -> Result<()>;

    fn write_rows(&self, path: &Path, rows: &RowCollection, auto_resize: bool, locale: Option<&Locale>) -> Result<()>;
}

impl<B: SpreadsheetBackend> TableReaderWriter for ExcelReaderWriter<B> {
    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn capabilities(&self) -> BackendCaps {
        self.backend.capabilities()
    }

    fn read(&self, path: &Path) -> Result<RowCollection> {
        ExcelReaderWriter::read(self, path)
    }

    fn read_each(
        &self,
        path: &Path,
        visit: &mut dyn FnMut(&mut RowRead),
        on_header: Option<&mut dyn FnMut(&ReadStart<'_>)>,
    ) -> Result<()> {
        let on_header = on_header.map(|f| move |start: &ReadStart<'_>| f(start));
        self.read_inner(path, |r: &mut RowRead| visit(r), on_header)
            .map(|_| ())
    }

    fn write_table(&self, path: &Path, table: Option<&Table>, auto_resize: bool, locale: Option<&Locale>) -> Result<()> {
        ExcelReaderWriter::write_table(self, path, table, auto_resize, locale)
    }

    fn write_rows(&self, path: &Path, rows: &RowCollection, auto_resize: bool, locale: Option<&Locale>) -> Result<()> {
        ExcelReaderWriter::write_rows(self, path, rows, auto_resize, locale)
    }
}

impl dyn TableReaderWriter + '_ {
    /// [`ExcelReaderWriter::read_with`] through a trait object.
    pub fn read_with<T, F, H>(&self, path: impl AsRef<Path>, mut mapper: F, on_header: Option<H>) -> Result<Vec<T>>
    where
        F: FnMut(&mut RowRead) -> T,
        H: FnOnce(&ReadStart<'_>),
    {
        let mut values = Vec::new();
        let mut on_header = on_header;
        let mut header = |start: &ReadStart<'_>| {
            if let Some(f) = on_header.take() {
                f(start);
            }
        };
        let mut visit = |read: &mut RowRead| {
            let value = mapper(read);
            if !read.is_cancelled() {
                values.push(value);
            }
        };
        self.read_each(path.as_ref(), &mut visit, Some(&mut header))?;
        Ok(values)
    }

    /// [`ExcelReaderWriter::read_records`] through a trait object.
    pub fn read_records<T: Record>(&self, path: impl AsRef<Path>) -> Result<Vec<T>> {
        let mut failure = None;
        let records = self.read_with(
            path,
            |read: &mut RowRead| record_from(read, &mut failure),
            None::<fn(&ReadStart<'_>)>,
        )?;
        finish_records(records, failure)
    }

    /// [`ExcelReaderWriter::write_records`] through a trait object.
    pub fn write_records<T: Record>(
        &self,
        path: impl AsRef<Path>,
        records: Option<&[T]>,
        auto_resize: bool,
        locale: Option<&Locale>,
    ) -> Result<()> {
        let records = records.ok_or_else(|| WorkbookError::argument("records", "no list to write"))?;
        let table = TypeMapper::project_table(records);
        self.write_table(path.as_ref(), Some(&table), auto_resize, locale)
    }
}
