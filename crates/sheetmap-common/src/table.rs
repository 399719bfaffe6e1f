use std::ops::Index;
use std::sync::Arc;

use crate::{ColumnError, ColumnSet, Row};

/// The canonical in-memory sheet snapshot: header labels, rows and an
/// optional name.
///
/// Rows may be sparse. When written, row `i` contributes its value at
/// position `k` (resolved through the row's own column set) for table column
/// `k`, so projected rows may be keyed by field name while the header shows
/// labels. [`Table::push`] only takes rows bound to the table's columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: Option<String>,
    pub columns: Arc<ColumnSet>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: impl Into<Arc<ColumnSet>>) -> Self {
        Self {
            name: None,
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// A new row bound to the table's columns (not yet added).
    pub fn new_row(&self) -> Row {
        Row::new(self.columns.clone())
    }

    /// Append `row`, rejecting one bound to other columns (even the same
    /// names in another order).
    pub fn push(&mut self, row: Row) -> Result<(), ColumnError> {
        check_binding(&self.columns, &row)?;
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows read from (or destined for) one sheet, all bound to the same
/// [`ColumnSet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowCollection {
    columns: Arc<ColumnSet>,
    rows: Vec<Row>,
}

impl RowCollection {
    pub fn new(columns: impl Into<Arc<ColumnSet>>) -> Self {
        Self {
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    /// Adopt `rows`, rejecting any that are bound to other columns.
    pub fn from_rows(
        columns: impl Into<Arc<ColumnSet>>,
        rows: Vec<Row>,
    ) -> Result<Self, ColumnError> {
        let columns = columns.into();
        for row in &rows {
            check_binding(&columns, row)?;
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &Arc<ColumnSet> {
        &self.columns
    }

    pub fn new_row(&self) -> Row {
        Row::new(self.columns.clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    /// Replace the row at `index`, returning the previous one.
    ///
    /// # Panics
    /// If `index` is out of bounds, like slice indexing.
    pub fn set(&mut self, index: usize, row: Row) -> Result<Row, ColumnError> {
        check_binding(&self.columns, &row)?;
        Ok(std::mem::replace(&mut self.rows[index], row))
    }

    pub fn push(&mut self, row: Row) -> Result<(), ColumnError> {
        check_binding(&self.columns, &row)?;
        self.rows.push(row);
        Ok(())
    }

    /// # Panics
    /// If `index > len`, like [`Vec::insert`].
    pub fn insert(&mut self, index: usize, row: Row) -> Result<(), ColumnError> {
        check_binding(&self.columns, &row)?;
        self.rows.insert(index, row);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Remove the first row equal to `row`.
    pub fn remove(&mut self, row: &Row) -> bool {
        match self.index_of(row) {
            Some(i) => {
                self.rows.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, row: &Row) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.index_of(row).is_some()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Clone the rows into `dest` starting at `offset`.
    ///
    /// # Panics
    /// If `dest` is too short, like [`slice::clone_from_slice`].
    pub fn copy_to(&self, dest: &mut [Row], offset: usize) {
        dest[offset..offset + self.rows.len()].clone_from_slice(&self.rows);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Row> {
        self.rows.iter_mut()
    }

    pub fn to_table(&self) -> Table {
        self.clone().into_table()
    }

    pub fn into_table(self) -> Table {
        Table {
            name: None,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

fn check_binding(columns: &Arc<ColumnSet>, row: &Row) -> Result<(), ColumnError> {
    if row.is_bound_to(columns) {
        Ok(())
    } else {
        Err(ColumnError::Mismatch {
            expected: columns.to_vec(),
            found: row.columns().to_vec(),
        })
    }
}

impl Index<usize> for RowCollection {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a RowCollection {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for RowCollection {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl From<RowCollection> for Table {
    fn from(rows: RowCollection) -> Self {
        rows.into_table()
    }
}
