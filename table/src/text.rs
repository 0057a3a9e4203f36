//! Tabular text codec.
//!
//! Encoded form:
//!
//! ```text
//! "Id",id:"subdetector",id:"layer",...,"A","Q","V"
//! 0x1402100a,5,1,1,10,20,5,100
//! ```
//!
//! The `id:` columns are present only when expansion is requested. The
//! decoder accepts any text in the [`RowReader`] dialect whose header names
//! an `Id` column (or, given a registry, the expanded identifier fields) and
//! every column of the target table.

use std::io::{BufRead, Write};

use detid::{with_tag, DetectorId, FieldLayout, InterpreterRegistry, SUBDETECTOR_MASK};

use crate::error::{TableError, TableResult};
use crate::reader::RowReader;
use crate::table::Table;
use crate::value::{parse_id, CellValue};

/// Name of the identifier column.
pub const ID_COLUMN: &str = "Id";

/// Prefix marking expanded identifier field columns.
pub const FIELD_PREFIX: &str = "id:";

const TAG_FIELD: &str = "subdetector";

/// Writes a table as text.
///
/// With a registry, the fields of the first row's layout are written after
/// the identifier; every row is unpacked with that same layout so the output
/// stays rectangular.
pub fn encode<V, W>(
    table: &Table<V>,
    out: &mut W,
    expand: Option<&InterpreterRegistry>,
) -> std::io::Result<()>
where
    V: CellValue,
    W: Write + ?Sized,
{
    let layout = match (expand, table.keys().first()) {
        (Some(registry), Some(first)) => Some(registry.lookup(*first)),
        _ => None,
    };

    write!(out, "\"{ID_COLUMN}\"")?;
    for field in layout.iter().flat_map(|layout| layout.fields()) {
        write!(out, ",{FIELD_PREFIX}\"{}\"", field.name())?;
    }
    for column in table.columns() {
        write!(out, ",\"{column}\"")?;
    }
    writeln!(out)?;

    for (id, row) in table.iter() {
        write!(out, "{id}")?;
        if let Some(layout) = layout {
            for value in layout.unpack(id).values() {
                write!(out, ",{value}")?;
            }
        }
        for value in row {
            write!(out, ",{value}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes a table as text into a `String`.
#[must_use]
pub fn encode_to_string<V: CellValue>(
    table: &Table<V>,
    expand: Option<&InterpreterRegistry>,
) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = encode(table, &mut out, expand);
    String::from_utf8_lossy(&out).into_owned()
}

/// Replaces the contents of `table` with rows read from text.
///
/// The header must contain an `Id` column; rows whose identifier is zero are
/// skipped.
pub fn decode<V, R>(table: &mut Table<V>, reader: R) -> TableResult<()>
where
    V: CellValue,
    R: BufRead,
{
    decode_rows(table, reader, None)
}

/// Like [`decode`], but when the header has no `Id` column the identifier is
/// packed from the expanded field columns using `registry`.
pub fn decode_with_registry<V, R>(
    table: &mut Table<V>,
    reader: R,
    registry: &InterpreterRegistry,
) -> TableResult<()>
where
    V: CellValue,
    R: BufRead,
{
    decode_rows(table, reader, Some(registry))
}

enum IdSource<'r> {
    Column(usize),
    Fields {
        tag_column: usize,
        registry: &'r InterpreterRegistry,
    },
}

fn decode_rows<V, R>(
    table: &mut Table<V>,
    reader: R,
    registry: Option<&InterpreterRegistry>,
) -> TableResult<()>
where
    V: CellValue,
    R: BufRead,
{
    table.clear();
    let mut rows = RowReader::new(reader)?;

    let id_source = match (rows.column_index_exact(ID_COLUMN), registry) {
        (Some(index), _) => IdSource::Column(index),
        (None, Some(registry)) => {
            let tag_column = field_column(&rows, TAG_FIELD)
                .ok_or(TableError::MissingIdentifierColumn)?;
            IdSource::Fields {
                tag_column,
                registry,
            }
        }
        (None, None) => return Err(TableError::MissingIdentifierColumn),
    };

    let value_columns = table
        .columns()
        .iter()
        .map(|name| {
            rows.column_index_exact(name)
                .ok_or_else(|| TableError::MissingColumn {
                    column: name.clone(),
                })
        })
        .collect::<TableResult<Vec<_>>>()?;

    let mut values = Vec::with_capacity(value_columns.len());
    while rows.next_row()? {
        let line = rows.line();
        let id = match &id_source {
            IdSource::Column(index) => parse_number(&rows, *index, parse_id)?,
            IdSource::Fields {
                tag_column,
                registry,
            } => pack_fields(&rows, *tag_column, registry)?,
        };
        if id == 0 {
            continue;
        }

        values.clear();
        for &index in &value_columns {
            values.push(parse_number(&rows, index, V::parse_cell)?);
        }
        table
            .add(DetectorId::new(id), &values)
            .map_err(|source| TableError::Line {
                line,
                source: Box::new(source),
            })?;
    }
    Ok(())
}

fn field_column<R: BufRead>(rows: &RowReader<R>, name: &str) -> Option<usize> {
    rows.column_index_exact(name)
        .or_else(|| rows.column_index_exact(&format!("{FIELD_PREFIX}{name}")))
}

fn parse_number<R, T>(
    rows: &RowReader<R>,
    index: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> TableResult<T>
where
    R: BufRead,
{
    let text = rows.field(index)?;
    parse(text).ok_or_else(|| TableError::InvalidNumber {
        line: rows.line(),
        column: rows.columns()[index].clone(),
        text: text.to_string(),
    })
}

/// Packs the current row's identifier from its field columns. Returns zero
/// for a zero subdetector so the row is skipped like a zero `Id`.
fn pack_fields<R: BufRead>(
    rows: &RowReader<R>,
    tag_column: usize,
    registry: &InterpreterRegistry,
) -> TableResult<u32> {
    let tag = parse_number(rows, tag_column, parse_id)?;
    if tag == 0 {
        return Ok(0);
    }
    let unknown = || TableError::UnknownIdentifierLayout {
        line: rows.line(),
        subdetector: tag,
    };
    let tag = u8::try_from(tag)
        .ok()
        .filter(|tag| u32::from(*tag) <= SUBDETECTOR_MASK)
        .ok_or_else(unknown)?;

    let candidates = registry
        .layouts_for_tag(tag)
        .chain(std::iter::once((None, registry.generic())));
    for (signature, layout) in candidates {
        if let Some(columns) = layout_columns(rows, layout) {
            let mut fields = Vec::with_capacity(columns.len());
            for index in columns {
                fields.push(parse_number(rows, index, parse_id)?);
            }
            let id = layout.pack_ordered(&fields).raw() | signature.map_or(0, |sig| sig.value);
            return Ok(with_tag(DetectorId::new(id), tag).raw());
        }
    }
    Err(unknown())
}

/// Header positions of every field of `layout`, or `None` if any is absent.
fn layout_columns<R: BufRead>(rows: &RowReader<R>, layout: &FieldLayout) -> Option<Vec<usize>> {
    layout
        .fields()
        .iter()
        .map(|field| field_column(rows, field.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{DoubleTable, IntegerTable};
    use std::io::Cursor;

    fn one_row() -> IntegerTable {
        let mut table = IntegerTable::new("ITable", ["A", "Q", "V"]);
        table.add(DetectorId::ecal(1, 1, 10), &[20, 5, 100]).unwrap();
        table
    }

    #[test]
    fn encode_plain() {
        let text = encode_to_string(&one_row(), None);
        assert_eq!(text, "\"Id\",\"A\",\"Q\",\"V\"\n0x1402100a,20,5,100\n");
    }

    #[test]
    fn encode_expanded() {
        let registry = InterpreterRegistry::with_standard_layouts().unwrap();
        let text = encode_to_string(&one_row(), Some(&registry));
        assert_eq!(
            text,
            "\"Id\",id:\"subdetector\",id:\"layer\",id:\"module\",id:\"cell\",\"A\",\"Q\",\"V\"\n\
             0x1402100a,5,1,1,10,20,5,100\n"
        );
    }

    #[test]
    fn decode_plain() {
        let mut table = IntegerTable::new("ITable", ["A", "Q", "V"]);
        decode(
            &mut table,
            Cursor::new("\"Id\",\"A\",\"Q\",\"V\"\n0x1402100a,20,5,100\n"),
        )
        .unwrap();
        assert_eq!(table, one_row());
    }

    #[test]
    fn decode_reorders_columns() {
        let mut table = IntegerTable::new("ITable", ["A", "Q", "V"]);
        decode(&mut table, Cursor::new("V,Id,Q,A\n100,0x1402100a,5,20\n")).unwrap();
        assert_eq!(table, one_row());
    }

    #[test]
    fn decode_skips_zero_id() {
        let mut table = IntegerTable::new("T", ["A"]);
        decode(&mut table, Cursor::new("Id,A\n0,junk\n0x0,7\n5,1\n")).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(5u32, 0).unwrap(), 1);
    }

    #[test]
    fn decode_clears_first() {
        let mut table = one_row();
        decode(&mut table, Cursor::new("Id,A,Q,V\n")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn decode_missing_column_reads_no_rows() {
        let mut table = IntegerTable::new("T", ["A", "B"]);
        let err = decode(&mut table, Cursor::new("Id,A\n1,2\n")).unwrap_err();
        assert_eq!(
            err,
            TableError::MissingColumn {
                column: "B".to_string()
            }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn decode_bad_value() {
        let mut table = DoubleTable::new("T", ["gain"]);
        let err = decode(&mut table, Cursor::new("Id,gain\n1,1.5\n2,abc\n")).unwrap_err();
        assert_eq!(
            err,
            TableError::InvalidNumber {
                line: 3,
                column: "gain".to_string(),
                text: "abc".to_string()
            }
        );
    }

    #[test]
    fn decode_subdetector_without_registry() {
        let mut table = IntegerTable::new("T", ["A"]);
        let err = decode(&mut table, Cursor::new("subdetector,layer,A\n5,1,2\n")).unwrap_err();
        assert_eq!(err, TableError::MissingIdentifierColumn);
    }

    #[test]
    fn decode_from_fields() {
        let registry = InterpreterRegistry::with_standard_layouts().unwrap();
        let mut table = IntegerTable::new("T", ["A"]);
        let text = "id:subdetector,id:layer,id:module,id:cell,A\n\
                    5,1,1,10,3\n\
                    0,0,0,0,9\n";
        decode_with_registry(&mut table, Cursor::new(text), &registry).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(DetectorId::ecal(1, 1, 10), 0).unwrap(), 3);
    }

    #[test]
    fn decode_trigger_cells_use_signature() {
        let registry = InterpreterRegistry::with_standard_layouts().unwrap();
        let mut table = IntegerTable::new("T", ["A"]);
        let text = "subdetector,layer,module,triggercell,A\n5,2,3,4,1\n";
        decode_with_registry(&mut table, Cursor::new(text), &registry).unwrap();
        assert_eq!(table.keys(), [DetectorId::ecal_trigger(2, 3, 4)]);
    }

    #[test]
    fn decode_falls_back_to_generic_fields() {
        let registry = InterpreterRegistry::with_standard_layouts().unwrap();
        let mut table = IntegerTable::new("T", ["A"]);
        let text = "subdetector,payload,A\n9,0x10,1\n";
        decode_with_registry(&mut table, Cursor::new(text), &registry).unwrap();
        assert_eq!(table.keys(), [DetectorId::from_parts(9, 0x10)]);
    }

    #[test]
    fn decode_unknown_layout() {
        let registry = InterpreterRegistry::with_standard_layouts().unwrap();
        let mut table = IntegerTable::new("T", ["A"]);
        let text = "subdetector,bogus,A\n6,1,1\n";
        let err = decode_with_registry(&mut table, Cursor::new(text), &registry).unwrap_err();
        assert_eq!(
            err,
            TableError::UnknownIdentifierLayout {
                line: 2,
                subdetector: 6
            }
        );
    }

    #[test]
    fn id_column_wins_over_fields() {
        let registry = InterpreterRegistry::with_standard_layouts().unwrap();
        let text = encode_to_string(&one_row(), Some(&registry));
        let mut table = IntegerTable::new("ITable", ["A", "Q", "V"]);
        decode_with_registry(&mut table, Cursor::new(text), &registry).unwrap();
        assert_eq!(table, one_row());
    }
}
