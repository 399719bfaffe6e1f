//! Typed records ↔ rows.
//!
//! A [`Record`] describes its fields in declaration order together with the
//! label each one shows in a header row. Implementations are normally
//! generated by `#[derive(Record)]` from `sheetmap-macros`:
//!
//! ```ignore
//! #[derive(Record)]
//! #[record(display_name = "People")]
//! struct Person {
//!     id: i64,
//!     #[record(display = "Full name")]
//!     name: String,
//! }
//! ```

use std::any::TypeId;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{CellErrorKind, CellValue, ColumnSet, ConversionError, Row, Table};

/// One field of a record: its Rust name (the row key) and header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub label: &'static str,
}

impl FieldInfo {
    pub const fn new(name: &'static str, label: &'static str) -> Self {
        Self { name, label }
    }
}

/// A field that could not be filled from a row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field `{field}` (column '{label}'): {source}")]
pub struct FieldError {
    pub field: &'static str,
    pub label: &'static str,
    #[source]
    pub source: ConversionError,
}

pub trait Record: Sized + 'static {
    /// `display_name` annotation of the type, else the bare type name.
    fn table_name() -> &'static str;

    /// Fields in declaration order.
    fn fields() -> &'static [FieldInfo];

    /// Current value of the field at `index` in [`Record::fields`].
    fn field_value(&self, index: usize) -> CellValue;

    fn from_row(row: &Row) -> Result<Self, FieldError>;
}

/// Read one field from a row, trying the header label before the field name.
pub fn read_field<T: FromCell>(row: &Row, field: &FieldInfo) -> Result<T, FieldError> {
    let cell = row.get(field.label).or_else(|| row.get(field.name));
    T::from_cell(cell).map_err(|source| FieldError {
        field: field.name,
        label: field.label,
        source,
    })
}

/* ───────────────────────── value → cell ───────────────────────── */

/// Conversion of a Rust value into a cell value.
pub trait ToCell {
    fn to_cell(&self) -> CellValue;
}

impl<T: ToCell + ?Sized> ToCell for &T {
    fn to_cell(&self) -> CellValue {
        (**self).to_cell()
    }
}

impl<T: ToCell> ToCell for Option<T> {
    fn to_cell(&self) -> CellValue {
        match self {
            Some(v) => v.to_cell(),
            None => CellValue::Empty,
        }
    }
}

impl ToCell for CellValue {
    fn to_cell(&self) -> CellValue {
        self.clone()
    }
}

macro_rules! to_cell_int {
    ($($t:ty),*) => {$(
        impl ToCell for $t {
            fn to_cell(&self) -> CellValue {
                CellValue::Int(*self as i64)
            }
        }
    )*};
}

to_cell_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! to_cell_wide {
    ($($t:ty),*) => {$(
        impl ToCell for $t {
            fn to_cell(&self) -> CellValue {
                match i64::try_from(*self) {
                    Ok(i) => CellValue::Int(i),
                    Err(_) => CellValue::Number(*self as f64),
                }
            }
        }
    )*};
}

to_cell_wide!(u64, usize, isize);

impl ToCell for f32 {
    fn to_cell(&self) -> CellValue {
        CellValue::Number(*self as f64)
    }
}

impl ToCell for f64 {
    fn to_cell(&self) -> CellValue {
        CellValue::Number(*self)
    }
}

impl ToCell for bool {
    fn to_cell(&self) -> CellValue {
        CellValue::Boolean(*self)
    }
}

impl ToCell for str {
    fn to_cell(&self) -> CellValue {
        CellValue::Text(self.to_string())
    }
}

impl ToCell for String {
    fn to_cell(&self) -> CellValue {
        CellValue::Text(self.clone())
    }
}

impl ToCell for char {
    fn to_cell(&self) -> CellValue {
        CellValue::Text(self.to_string())
    }
}

impl ToCell for NaiveDate {
    fn to_cell(&self) -> CellValue {
        CellValue::Date(*self)
    }
}

impl ToCell for NaiveDateTime {
    fn to_cell(&self) -> CellValue {
        CellValue::DateTime(*self)
    }
}

impl ToCell for NaiveTime {
    fn to_cell(&self) -> CellValue {
        CellValue::Time(*self)
    }
}

impl ToCell for CellErrorKind {
    fn to_cell(&self) -> CellValue {
        CellValue::Error(*self)
    }
}

/* ───────────────────────── cell → value ───────────────────────── */

/// Conversion of a (possibly absent) cell into a Rust value.
pub trait FromCell: Sized {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError>;
}

fn present(cell: Option<&CellValue>) -> Result<&CellValue, ConversionError> {
    match cell {
        None | Some(CellValue::Empty) => Err(ConversionError::Missing),
        Some(v) => Ok(v),
    }
}

fn mismatch(expected: &'static str, found: &CellValue) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

impl<T: FromCell> FromCell for Option<T> {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        match cell {
            None | Some(CellValue::Empty) => Ok(None),
            Some(_) => T::from_cell(cell).map(Some),
        }
    }
}

impl FromCell for CellValue {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        cell.cloned().ok_or(ConversionError::Missing)
    }
}

impl FromCell for String {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        let v = present(cell)?;
        Ok(match v {
            CellValue::Text(s) => s.clone(),
            // integral floats read back from a sheet render without ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            other => other.to_string(),
        })
    }
}

macro_rules! from_cell_int {
    ($($t:ty),*) => {$(
        impl FromCell for $t {
            fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
                let v = present(cell)?;
                let wide: i64 = match v {
                    CellValue::Int(i) => *i,
                    CellValue::Number(_) => v.as_i64().ok_or_else(|| ConversionError::OutOfRange {
                        value: v.to_string(),
                        target: stringify!($t),
                    })?,
                    CellValue::Text(s) => s.trim().parse::<i64>().map_err(|_| ConversionError::Parse {
                        text: s.clone(),
                        target: stringify!($t),
                    })?,
                    other => return Err(mismatch(stringify!($t), other)),
                };
                <$t>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                    value: wide.to_string(),
                    target: stringify!($t),
                })
            }
        }
    )*};
}

from_cell_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromCell for f64 {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        let v = present(cell)?;
        match v {
            CellValue::Int(_) | CellValue::Number(_) => Ok(v.as_f64().unwrap_or_default()),
            CellValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ConversionError::Parse {
                text: s.clone(),
                target: "f64",
            }),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl FromCell for f32 {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        f64::from_cell(cell).map(|f| f as f32)
    }
}

impl FromCell for bool {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        let v = present(cell)?;
        match v {
            CellValue::Boolean(b) => Ok(*b),
            CellValue::Int(0) => Ok(false),
            CellValue::Int(1) => Ok(true),
            CellValue::Text(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            CellValue::Text(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            CellValue::Text(s) => Err(ConversionError::Parse {
                text: s.clone(),
                target: "bool",
            }),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromCell for NaiveDateTime {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        let v = present(cell)?;
        match v {
            CellValue::DateTime(dt) => Ok(*dt),
            CellValue::Date(d) => Ok(d.and_time(NaiveTime::default())),
            CellValue::Int(_) | CellValue::Number(_) => v
                .as_f64()
                .and_then(crate::serial_to_datetime)
                .ok_or_else(|| ConversionError::OutOfRange {
                    value: v.to_string(),
                    target: "NaiveDateTime",
                }),
            CellValue::Text(s) => NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S"))
                .or_else(|_| {
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                        .map(|d| d.and_time(NaiveTime::default()))
                })
                .map_err(|_| ConversionError::Parse {
                    text: s.clone(),
                    target: "NaiveDateTime",
                }),
            other => Err(mismatch("NaiveDateTime", other)),
        }
    }
}

impl FromCell for NaiveDate {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        NaiveDateTime::from_cell(cell).map(|dt| dt.date())
    }
}

impl FromCell for NaiveTime {
    fn from_cell(cell: Option<&CellValue>) -> Result<Self, ConversionError> {
        let v = present(cell)?;
        match v {
            CellValue::Time(t) => Ok(*t),
            CellValue::DateTime(dt) => Ok(dt.time()),
            CellValue::Number(_) => v
                .as_f64()
                .and_then(crate::serial_to_datetime)
                .map(|dt| dt.time())
                .ok_or_else(|| ConversionError::OutOfRange {
                    value: v.to_string(),
                    target: "NaiveTime",
                }),
            CellValue::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S").map_err(|_| {
                ConversionError::Parse {
                    text: s.clone(),
                    target: "NaiveTime",
                }
            }),
            other => Err(mismatch("NaiveTime", other)),
        }
    }
}

/* ───────────────────────── projection ───────────────────────── */

#[derive(Clone)]
struct Projection {
    labels: Arc<ColumnSet>,
    keys: Arc<ColumnSet>,
}

static PROJECTIONS: Lazy<RwLock<FxHashMap<TypeId, Projection>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Projects [`Record`] types to column sets and tables.
///
/// Column sets are a pure function of the type and are memoized for the
/// lifetime of the process.
pub struct TypeMapper;

impl TypeMapper {
    fn projection<T: Record>() -> Projection {
        let id = TypeId::of::<T>();
        if let Some(p) = PROJECTIONS.read().get(&id) {
            return p.clone();
        }
        PROJECTIONS
            .write()
            .entry(id)
            .or_insert_with(|| {
                let fields = T::fields();
                Projection {
                    labels: Arc::new(ColumnSet::new(fields.iter().map(|f| f.label))),
                    keys: Arc::new(ColumnSet::new(fields.iter().map(|f| f.name))),
                }
            })
            .clone()
    }

    /// Header labels of `T`, in field order.
    pub fn project_columns<T: Record>() -> Arc<ColumnSet> {
        Self::projection::<T>().labels
    }

    /// Field names of `T`, in field order; the keys of projected rows.
    pub fn field_keys<T: Record>() -> Arc<ColumnSet> {
        Self::projection::<T>().keys
    }

    pub fn to_row<T: Record>(record: &T) -> Row {
        Self::row_with_keys(record, Self::field_keys::<T>())
    }

    fn row_with_keys<T: Record>(record: &T, keys: Arc<ColumnSet>) -> Row {
        let mut row = Row::new(keys);
        for i in 0..T::fields().len() {
            row.set_index(i, record.field_value(i));
        }
        row
    }

    pub fn project_table<T: Record>(records: &[T]) -> Table {
        let Projection { labels, keys } = Self::projection::<T>();
        Table {
            name: Some(T::table_name().to_string()),
            columns: labels,
            rows: records
                .iter()
                .map(|r| Self::row_with_keys(r, keys.clone()))
                .collect(),
        }
    }

    pub fn from_row<T: Record>(row: &Row) -> Result<T, FieldError> {
        T::from_row(row)
    }
}
