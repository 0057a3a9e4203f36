//! Electronics-id to detector-id mapping.

use std::io::BufRead;

use detid::DetectorId;

use crate::error::{TableError, TableResult};
use crate::reader::RowReader;
use crate::value::parse_id;

/// Bidirectional map between electronics identifiers and detector
/// identifiers.
///
/// Forward lookups (`get`) binary-search a vector sorted by electronics id.
/// Reverse lookups (`electronics_for`) binary-search a second vector sorted
/// by detector id when the map was built `with_reverse_index`; otherwise
/// they scan every entry, O(n) per call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElectronicsMap {
    forward: Vec<(DetectorId, DetectorId)>,
    reverse: Option<Vec<(DetectorId, DetectorId)>>,
}

impl ElectronicsMap {
    /// Creates an empty map, optionally maintaining a reverse index.
    #[must_use]
    pub fn new(with_reverse_index: bool) -> Self {
        Self {
            forward: Vec::new(),
            reverse: with_reverse_index.then(Vec::new),
        }
    }

    /// Returns `true` if reverse lookups use an index.
    #[must_use]
    pub const fn has_reverse_index(&self) -> bool {
        self.reverse.is_some()
    }

    /// Returns the number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Removes every mapping.
    pub fn clear(&mut self) {
        self.forward.clear();
        if let Some(reverse) = &mut self.reverse {
            reverse.clear();
        }
    }

    /// Adds a mapping. Each electronics id may be mapped once; a detector id
    /// may be reached from several electronics ids.
    pub fn insert(
        &mut self,
        electronics: impl Into<DetectorId>,
        detector: impl Into<DetectorId>,
    ) -> TableResult<()> {
        let (electronics, detector) = (electronics.into(), detector.into());
        let index = match self.search(electronics) {
            Ok(_) => return Err(TableError::DuplicateMapping { electronics }),
            Err(index) => index,
        };
        self.forward.insert(index, (electronics, detector));
        if let Some(reverse) = &mut self.reverse {
            let entry = (detector, electronics);
            let at = reverse.binary_search(&entry).unwrap_or_else(|at| at);
            reverse.insert(at, entry);
        }
        Ok(())
    }

    /// Returns `true` if the electronics id is mapped.
    #[must_use]
    pub fn exists(&self, electronics: impl Into<DetectorId>) -> bool {
        self.search(electronics.into()).is_ok()
    }

    /// Returns the detector id for an electronics id.
    pub fn get(&self, electronics: impl Into<DetectorId>) -> TableResult<DetectorId> {
        let electronics = electronics.into();
        self.search(electronics)
            .map(|index| self.forward[index].1)
            .map_err(|_| TableError::NoSuchMapping { id: electronics })
    }

    /// Returns an electronics id mapped to a detector id. When several map
    /// to it, the indexed lookup returns the lowest and the scan the first
    /// in electronics order; both are the same entry.
    pub fn electronics_for(&self, detector: impl Into<DetectorId>) -> TableResult<DetectorId> {
        let detector = detector.into();
        let found = match &self.reverse {
            Some(reverse) => {
                let at = reverse.partition_point(|(did, _)| *did < detector);
                reverse
                    .get(at)
                    .filter(|(did, _)| *did == detector)
                    .map(|(_, eid)| *eid)
            }
            None => self
                .forward
                .iter()
                .find(|(_, did)| *did == detector)
                .map(|(eid, _)| *eid),
        };
        found.ok_or(TableError::NoSuchMapping { id: detector })
    }

    /// Iterates over `(electronics, detector)` pairs in electronics order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (DetectorId, DetectorId)> + '_ {
        self.forward.iter().copied()
    }

    /// Adds every row of `rows`, reading the two identifiers from the named
    /// columns. Returns the number of mappings added.
    pub fn load_csv<R: BufRead>(
        &mut self,
        rows: &mut RowReader<R>,
        electronics_column: &str,
        detector_column: &str,
    ) -> TableResult<usize> {
        rows.require_columns(&[electronics_column, detector_column])?;
        let mut added = 0;
        while rows.next_row()? {
            let electronics = read_id(rows, electronics_column)?;
            let detector = read_id(rows, detector_column)?;
            self.insert(electronics, detector)
                .map_err(|source| TableError::Line {
                    line: rows.line(),
                    source: Box::new(source),
                })?;
            added += 1;
        }
        Ok(added)
    }

    fn search(&self, electronics: DetectorId) -> Result<usize, usize> {
        self.forward
            .binary_search_by_key(&electronics, |(eid, _)| *eid)
    }
}

fn read_id<R: BufRead>(rows: &RowReader<R>, column: &str) -> TableResult<DetectorId> {
    let text = rows.get(column)?;
    parse_id(text)
        .map(DetectorId::new)
        .ok_or_else(|| TableError::InvalidNumber {
            line: rows.line(),
            column: column.to_string(),
            text: text.to_string(),
        })
}
