//! Sorted, array-backed conditions table.

use detid::DetectorId;

use crate::error::{TableError, TableResult};
use crate::value::CellValue;

/// Mask that keeps every identifier bit.
pub const FULL_MASK: u32 = u32::MAX;

/// A homogeneous table mapping masked detector identifiers to fixed-width
/// rows.
///
/// Keys are kept strictly increasing and unique; row `i` belongs to key `i`.
/// Values are stored unrolled, `column_count` per row. Lookups are binary
/// searches over the keys; insertion shifts later rows and is O(n).
#[derive(Debug, Clone, PartialEq)]
pub struct Table<V> {
    name: String,
    columns: Vec<String>,
    id_mask: u32,
    keys: Vec<DetectorId>,
    values: Vec<V>,
}

/// Table of 32-bit integers.
pub type IntegerTable = Table<i32>;

/// Table of double-precision floats.
pub type DoubleTable = Table<f64>;

impl<V: CellValue> Table<V> {
    /// Creates an empty table with the given columns.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            id_mask: FULL_MASK,
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the name of column `index`.
    pub fn column_name(&self, index: usize) -> TableResult<&str> {
        self.columns
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| self.no_such_column(index.to_string()))
    }

    /// Returns the index of a column.
    #[must_use]
    pub fn column_index(&self, name: &str, case_insensitive: bool) -> Option<usize> {
        self.columns.iter().position(|column| {
            if case_insensitive {
                column.eq_ignore_ascii_case(name)
            } else {
                column == name
            }
        })
    }

    /// Returns the identifier mask.
    #[must_use]
    pub const fn id_mask(&self) -> u32 {
        self.id_mask
    }

    /// Sets the identifier mask and clears the table, since existing keys
    /// were masked with the old value.
    pub fn set_id_mask(&mut self, mask: u32) {
        self.id_mask = mask;
        self.clear();
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Removes every row; name, columns and mask are kept.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Returns the row index of an identifier, if present.
    #[must_use]
    pub fn find(&self, id: impl Into<DetectorId>) -> Option<usize> {
        self.search(id.into()).ok()
    }

    /// Returns where an identifier's row is or would be inserted.
    #[must_use]
    pub fn find_insertion_point(&self, id: impl Into<DetectorId>) -> usize {
        match self.search(id.into()) {
            Ok(index) | Err(index) => index,
        }
    }

    /// Returns the value of one cell.
    pub fn get(&self, id: impl Into<DetectorId>, column: usize) -> TableResult<V> {
        let id = id.into();
        if column >= self.column_count() {
            return Err(self.no_such_column(column.to_string()));
        }
        let row = self.search(id).map_err(|_| self.no_such_id(id))?;
        Ok(self.values[row * self.column_count() + column])
    }

    /// Returns the value of one cell, looking the column up by name
    /// (case-insensitive).
    ///
    /// Callers on a hot path should resolve the column once with
    /// [`column_index`](Self::column_index) and use [`get`](Self::get).
    pub fn get_by_name(&self, id: impl Into<DetectorId>, column: &str) -> TableResult<V> {
        let index = self
            .column_index(column, true)
            .ok_or_else(|| self.no_such_column(column.to_string()))?;
        self.get(id, index)
    }

    /// Inserts a row for a new identifier at its sorted position.
    pub fn add(&mut self, id: impl Into<DetectorId>, row: &[V]) -> TableResult<()> {
        let columns = self.column_count();
        if row.len() != columns {
            return Err(TableError::ColumnCountMismatchOnInsert {
                table: self.name.clone(),
                expected: columns,
                actual: row.len(),
            });
        }
        let key = id.into().masked(self.id_mask);
        match self.keys.binary_search(&key) {
            Ok(_) => Err(TableError::DuplicateId {
                table: self.name.clone(),
                id: key,
            }),
            Err(index) => {
                self.keys.insert(index, key);
                let at = index * columns;
                self.values.splice(at..at, row.iter().copied());
                Ok(())
            }
        }
    }

    /// Returns the identifier and values of row `index`.
    pub fn row(&self, index: usize) -> TableResult<(DetectorId, &[V])> {
        if index >= self.row_count() {
            return Err(TableError::IndexOutOfRange {
                index,
                len: self.row_count(),
            });
        }
        Ok(self.row_at(index))
    }

    /// Returns the values stored for an identifier.
    pub fn row_for(&self, id: impl Into<DetectorId>) -> TableResult<&[V]> {
        let id = id.into();
        let index = self.search(id).map_err(|_| self.no_such_id(id))?;
        Ok(self.row_at(index).1)
    }

    /// Iterates over rows in ascending identifier order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (DetectorId, &[V])> + '_ {
        (0..self.row_count()).map(|index| self.row_at(index))
    }

    /// Returns the stored (masked) identifiers in ascending order.
    #[must_use]
    pub fn keys(&self) -> &[DetectorId] {
        &self.keys
    }

    fn row_at(&self, index: usize) -> (DetectorId, &[V]) {
        let columns = self.column_count();
        let start = index * columns;
        (self.keys[index], &self.values[start..start + columns])
    }

    fn search(&self, id: DetectorId) -> Result<usize, usize> {
        self.keys.binary_search(&id.masked(self.id_mask))
    }

    fn no_such_id(&self, id: DetectorId) -> TableError {
        TableError::NoSuchId {
            table: self.name.clone(),
            id,
        }
    }

    fn no_such_column(&self, column: String) -> TableError {
        TableError::NoSuchColumn {
            table: self.name.clone(),
            column,
        }
    }
}
