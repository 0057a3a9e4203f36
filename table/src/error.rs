//! Error types for tables and the tabular text codec.

use std::fmt;
use std::io;

use detid::DetectorId;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur when populating, querying, or decoding a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Inserted row has the wrong number of values.
    ColumnCountMismatchOnInsert {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// The (masked) identifier already has a row.
    DuplicateId { table: String, id: DetectorId },

    /// The (masked) identifier has no row.
    NoSuchId { table: String, id: DetectorId },

    /// Column index or name does not exist.
    NoSuchColumn { table: String, column: String },

    /// Row index past the end of the table.
    IndexOutOfRange { index: usize, len: usize },

    /// The text stream had no header line.
    MissingHeader,

    /// The header has neither an `Id` nor a `subdetector` column.
    MissingIdentifierColumn,

    /// A requested column is absent from the header.
    MissingColumn { column: String },

    /// A data line has a different field count than the header.
    ColumnCountMismatch {
        expected: usize,
        actual: usize,
        line: usize,
    },

    /// A field could not be parsed as a number.
    InvalidNumber {
        line: usize,
        column: String,
        text: String,
    },

    /// No registered layout matches the identifier field columns.
    UnknownIdentifierLayout { line: usize, subdetector: u32 },

    /// A table error raised while inserting the row on `line`.
    Line { line: usize, source: Box<TableError> },

    /// Electronics identifier already mapped.
    DuplicateMapping { electronics: DetectorId },

    /// Identifier not present in an electronics map.
    NoSuchMapping { id: DetectorId },

    /// Reading the underlying stream failed.
    Io { kind: io::ErrorKind, message: String },
}

impl TableError {
    /// Returns the innermost error, looking through line context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Line { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnCountMismatchOnInsert {
                table,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{table}: attempted to insert a row with {actual} columns into a table with {expected} columns"
                )
            }
            Self::DuplicateId { table, id } => {
                write!(f, "attempted to add condition in {table} for existing id {id}")
            }
            Self::NoSuchId { table, id } => write!(f, "{table}: no such id {id}"),
            Self::NoSuchColumn { table, column } => {
                write!(f, "{table}: no such column {column}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "row {index} out of range (table has {len} rows)")
            }
            Self::MissingHeader => write!(f, "text table has no valid header"),
            Self::MissingIdentifierColumn => {
                write!(f, "malformed table with no Id or subdetector column")
            }
            Self::MissingColumn { column } => {
                write!(f, "missing column '{column}' in table load")
            }
            Self::ColumnCountMismatch {
                expected,
                actual,
                line,
            } => {
                write!(
                    f,
                    "mismatched number of columns ({actual}!={expected}) on line {line}"
                )
            }
            Self::InvalidNumber { line, column, text } => {
                write!(f, "invalid number '{text}' in column '{column}' on line {line}")
            }
            Self::UnknownIdentifierLayout { line, subdetector } => {
                write!(
                    f,
                    "no identifier layout for subdetector {subdetector} matches the header (line {line})"
                )
            }
            Self::Line { line, source } => write!(f, "line {line}: {source}"),
            Self::DuplicateMapping { electronics } => {
                write!(f, "electronics id {electronics} is already mapped")
            }
            Self::NoSuchMapping { id } => write!(f, "no mapping for id {id}"),
            Self::Io { kind, message } => write!(f, "i/o error ({kind:?}): {message}"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Line { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for TableError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
