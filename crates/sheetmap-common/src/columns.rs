use std::ops::Index;

use rustc_hash::FxHashMap;

use crate::ColumnError;

/// Ordered column names of one table.
///
/// Order is meaningful: it defines the position ↔ name mapping for every row
/// bound to this set. A `ColumnSet` built from a raw header row may still
/// violate the column invariants; [`ColumnSet::validate`] reports every
/// violation and is run once, right after header extraction.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    names: Vec<String>,
    // first occurrence of each name
    positions: FxHashMap<String, usize>,
}

impl ColumnSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions = FxHashMap::default();
        positions.reserve(names.len());
        for (i, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(i);
        }
        Self { names, positions }
    }

    /// Build from raw header cells; absent cells become empty names so that
    /// validation can report their positions.
    pub fn from_header<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self::new(cells.into_iter().map(Option::unwrap_or_default))
    }

    /// Build and validate in one step.
    pub fn validated<I, S>(names: I) -> Result<Self, ColumnError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = Self::new(names);
        set.validate()?;
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }

    /// Runs [`validate_not_empty`](Self::validate_not_empty) then
    /// [`validate_unique`](Self::validate_unique).
    pub fn validate(&self) -> Result<(), ColumnError> {
        self.validate_not_empty()?;
        self.validate_unique()
    }

    pub fn validate_not_empty(&self) -> Result<(), ColumnError> {
        let positions: Vec<usize> = self
            .names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.trim().is_empty())
            .map(|(i, _)| i + 1)
            .collect();
        if positions.is_empty() {
            Ok(())
        } else {
            Err(ColumnError::EmptyNames { positions })
        }
    }

    pub fn validate_unique(&self) -> Result<(), ColumnError> {
        if self.positions.len() == self.names.len() {
            return Ok(());
        }
        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        for name in &self.names {
            *counts.entry(name.as_str()).or_default() += 1;
        }
        let names: Vec<String> = self
            .names
            .iter()
            .enumerate()
            .filter(|(i, name)| counts[name.as_str()] > 1 && self.positions[name.as_str()] == *i)
            .map(|(_, name)| name.clone())
            .collect();
        Err(ColumnError::DuplicateNames { names })
    }
}

impl PartialEq for ColumnSet {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for ColumnSet {}

impl Index<usize> for ColumnSet {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.names[index]
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}
