//! Condition definitions and their materialized tables.

use std::io::{self, BufRead, Write};

use detid::{DetectorId, InterpreterRegistry};
use table::{
    decode, decode_with_registry, encode, CellValue, DoubleTable, IntegerTable, Table,
    TableResult, ValueKind, FULL_MASK,
};

/// Shape of a named condition: its columns, value kind and identifier mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDef {
    name: String,
    columns: Vec<String>,
    kind: ValueKind,
    id_mask: u32,
}

impl ConditionDef {
    /// Creates a definition with the full identifier mask.
    pub fn new<I, S>(name: impl Into<String>, kind: ValueKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            kind,
            id_mask: FULL_MASK,
        }
    }

    /// Sets the identifier mask applied by tables loaded from files.
    #[must_use]
    pub const fn with_id_mask(mut self, id_mask: u32) -> Self {
        self.id_mask = id_mask;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub const fn id_mask(&self) -> u32 {
        self.id_mask
    }

    /// Builds an empty table of the right kind, columns and mask.
    #[must_use]
    pub fn empty_table(&self) -> ConditionTable {
        match self.kind {
            ValueKind::Integer => ConditionTable::Integer(self.table(self.id_mask)),
            ValueKind::Double => ConditionTable::Double(self.table(self.id_mask)),
        }
    }

    /// Builds the one-row table every identifier resolves to.
    pub(crate) fn single_row<V: CellValue>(&self, row: &[V]) -> TableResult<Table<V>> {
        let mut table = self.table(0);
        table.add(DetectorId::NULL, row)?;
        Ok(table)
    }

    fn table<V: CellValue>(&self, id_mask: u32) -> Table<V> {
        let mut table = Table::new(self.name.as_str(), self.columns.iter().cloned());
        table.set_id_mask(id_mask);
        table
    }
}

/// A resolved conditions table of either value kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTable {
    Integer(IntegerTable),
    Double(DoubleTable),
}

impl ConditionTable {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Integer(table) => table.name(),
            Self::Double(table) => table.name(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Integer(table) => table.columns(),
            Self::Double(table) => table.columns(),
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            Self::Integer(table) => table.row_count(),
            Self::Double(table) => table.row_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<&IntegerTable> {
        match self {
            Self::Integer(table) => Some(table),
            Self::Double(_) => None,
        }
    }

    #[must_use]
    pub const fn as_double(&self) -> Option<&DoubleTable> {
        match self {
            Self::Double(table) => Some(table),
            Self::Integer(_) => None,
        }
    }

    /// Returns one cell widened to `f64`, looking the column up by name.
    pub fn value_f64(&self, id: DetectorId, column: &str) -> TableResult<f64> {
        match self {
            Self::Integer(table) => table.get_by_name(id, column).map(f64::from),
            Self::Double(table) => table.get_by_name(id, column),
        }
    }

    /// Writes the table in the tabular text format.
    pub fn encode<W: Write + ?Sized>(
        &self,
        out: &mut W,
        expand: Option<&InterpreterRegistry>,
    ) -> io::Result<()> {
        match self {
            Self::Integer(table) => encode(table, out, expand),
            Self::Double(table) => encode(table, out, expand),
        }
    }

    /// Replaces the rows with those decoded from `reader`.
    pub fn decode_from<R: BufRead>(
        &mut self,
        reader: R,
        registry: Option<&InterpreterRegistry>,
    ) -> TableResult<()> {
        match self {
            Self::Integer(table) => decode_into(table, reader, registry),
            Self::Double(table) => decode_into(table, reader, registry),
        }
    }
}

fn decode_into<V: CellValue, R: BufRead>(
    table: &mut Table<V>,
    reader: R,
    registry: Option<&InterpreterRegistry>,
) -> TableResult<()> {
    match registry {
        Some(registry) => decode_with_registry(table, reader, registry),
        None => decode(table, reader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_table_matches_definition() {
        let def = ConditionDef::new("gain", ValueKind::Double, ["gain", "pedestal"])
            .with_id_mask(0xFFFF_0000);
        let table = def.empty_table();
        assert_eq!(table.kind(), ValueKind::Double);
        assert_eq!(table.name(), "gain");
        assert_eq!(table.columns(), ["gain", "pedestal"]);
        assert_eq!(table.as_double().unwrap().id_mask(), 0xFFFF_0000);
        assert!(table.is_empty());
    }

    #[test]
    fn single_row_answers_every_id() {
        let def = ConditionDef::new("thresholds", ValueKind::Integer, ["A", "B", "C"]);
        let table = def.single_row(&[10, 45, 129]).unwrap();
        assert_eq!(table.id_mask(), 0);
        assert_eq!(table.get_by_name(292u32, "A").unwrap(), 10);
        assert_eq!(table.get_by_name(82910u32, "C").unwrap(), 129);
    }

    #[test]
    fn single_row_checks_width() {
        let def = ConditionDef::new("thresholds", ValueKind::Integer, ["A", "B"]);
        assert!(def.single_row(&[1]).is_err());
    }

    #[test]
    fn decode_and_encode_through_enum() {
        let def = ConditionDef::new("T", ValueKind::Integer, ["A"]);
        let mut table = def.empty_table();
        table.decode_from(Cursor::new("Id,A\n0x10,4\n"), None).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.value_f64(DetectorId::new(0x10), "a").unwrap(), 4.0);

        let mut out = Vec::new();
        table.encode(&mut out, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"Id\",\"A\"\n0x00000010,4\n");
    }

    #[test]
    fn typed_views() {
        let def = ConditionDef::new("T", ValueKind::Integer, ["A"]);
        let table = def.empty_table();
        assert!(table.as_integer().is_some());
        assert!(table.as_double().is_none());
    }
}
