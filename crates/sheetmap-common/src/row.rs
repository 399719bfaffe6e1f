use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{CellValue, Color, ColumnSet, ToCell};

/// Presentation attributes applied to every cell of a row when written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RowStyle {
    pub bold: bool,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl RowStyle {
    /// `true` when no attribute is set; such rows are written unstyled.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// One record: a case-sensitive name → value map bound to a shared
/// [`ColumnSet`] for positional access.
///
/// Only present cells are stored. `get` returns `None` for a column with no
/// stored value, which is distinct from a stored [`CellValue::Empty`].
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<ColumnSet>,
    values: FxHashMap<String, CellValue>,
    pub style: RowStyle,
}

impl Row {
    pub fn new(columns: Arc<ColumnSet>) -> Self {
        Self {
            columns,
            values: FxHashMap::default(),
            style: RowStyle::default(),
        }
    }

    /// Bind positional values to `columns`; `None` entries are skipped.
    pub fn from_values<I>(columns: Arc<ColumnSet>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<CellValue>>,
    {
        let mut row = Self::new(columns);
        for (i, value) in values.into_iter().enumerate() {
            if let Some(v) = value {
                row.set_index(i, v);
            }
        }
        row
    }

    pub fn columns(&self) -> &Arc<ColumnSet> {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CellValue> {
        self.values.get_mut(name)
    }

    /// Positional lookup through the bound column set.
    pub fn get_index(&self, index: usize) -> Option<&CellValue> {
        self.columns.get(index).and_then(|name| self.values.get(name))
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl ToCell) -> Option<CellValue> {
        self.values.insert(name.into(), value.to_cell())
    }

    /// Positional store; returns `false` when `index` is past the last column.
    pub fn set_index(&mut self, index: usize, value: impl ToCell) -> bool {
        let Some(name) = self.columns.get(index) else {
            return false;
        };
        self.values.insert(name.to_string(), value.to_cell());
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<CellValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of stored cells (not the number of columns).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored cells in column order, followed by any values stored under
    /// names the column set does not declare.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> + '_ {
        let declared = self
            .columns
            .iter()
            .filter_map(|name| self.values.get_key_value(name))
            .map(|(k, v)| (k.as_str(), v));
        let extra = self
            .values
            .iter()
            .filter(|(k, _)| !self.columns.contains(k))
            .map(|(k, v)| (k.as_str(), v));
        declared.chain(extra)
    }

    /// Positional snapshot of the row: one entry per column.
    pub fn to_values(&self) -> Vec<Option<CellValue>> {
        (0..self.columns.len())
            .map(|i| self.get_index(i).cloned())
            .collect()
    }

    pub fn with_style(mut self, style: RowStyle) -> Self {
        self.style = style;
        self
    }

    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    pub fn foreground(mut self, color: Color) -> Self {
        self.style.foreground = Some(color);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.style.background = Some(color);
        self
    }

    pub(crate) fn is_bound_to(&self, columns: &Arc<ColumnSet>) -> bool {
        Arc::ptr_eq(&self.columns, columns) || *self.columns == **columns
    }
}

impl PartialEq for Row {
    /// Rows are equal when they carry the same columns, cells and style.
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.values == other.values && self.style == other.style
    }
}
