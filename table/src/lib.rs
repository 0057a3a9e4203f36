//! Conditions tables keyed by detector identifier.
//!
//! A [`Table`] maps masked [`DetectorId`](detid::DetectorId)s to fixed-width
//! rows of integers or doubles, kept sorted for binary-search lookup. The
//! text codec ([`encode`], [`decode`]) reads and writes tables in a
//! comment-aware CSV dialect, optionally expanding identifiers into their
//! named fields.
//!
//! # Features
//!
//! - Sorted, unrolled storage with O(log n) lookup
//! - Per-table identifier masks (a zero mask gives a single shared row)
//! - Strict header validation with line-numbered errors
//! - A generic [`RowReader`] for other files in the same dialect
//! - An [`ElectronicsMap`] for channel mappings
//!
//! # Design Principles
//!
//! - **No silent defaults** - Missing ids, columns, and unparsable values
//!   are errors.
//! - **Deterministic** - Rows always iterate in ascending key order, so
//!   encoding is reproducible.

mod emap;
mod error;
mod reader;
mod table;
mod text;
mod value;

pub use emap::ElectronicsMap;
pub use error::{TableError, TableResult};
pub use reader::{split_fields, RowReader};
pub use table::{DoubleTable, IntegerTable, Table, FULL_MASK};
pub use text::{decode, decode_with_registry, encode, encode_to_string, FIELD_PREFIX, ID_COLUMN};
pub use value::{parse_id, CellValue, UnknownValueKind, ValueKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = IntegerTable::new("t", ["a"]);
        let _ = DoubleTable::new("t", ["a"]);
        let _ = ElectronicsMap::new(false);
        let _ = split_fields("a,b");
        let _ = ValueKind::Integer;
        let _: TableResult<()> = Ok(());
        assert_eq!(ID_COLUMN, "Id");
        assert_eq!(FULL_MASK, u32::MAX);
    }

    #[test]
    fn value_kinds_match_aliases() {
        assert_eq!(<i32 as CellValue>::KIND, ValueKind::Integer);
        assert_eq!(<f64 as CellValue>::KIND, ValueKind::Double);
    }
}
