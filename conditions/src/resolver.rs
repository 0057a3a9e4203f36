//! Run-dependent resolution of named conditions.

use std::fmt;
use std::io::BufRead;

use detid::InterpreterRegistry;
use table::{DoubleTable, IntegerTable, RowReader, TableError, ValueKind};
use tracing::{debug, warn};

use crate::condition::{ConditionDef, ConditionTable};
use crate::error::{ConditionsError, ConditionsResult};
use crate::expand::ResolverOptions;
use crate::source::{InlineValues, LocalFetcher, Location, Source, SourceFetcher};
use crate::window::{RunContext, RunType, ValidityWindow};

/// Column names of an entries index.
pub const INDEX_COLUMNS: [&str; 4] = ["FIRST_RUN", "LAST_RUN", "RUNTYPE", "URL"];

/// Load state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Not loaded yet.
    Unresolved,
    /// Loaded and cached.
    Resolved,
    /// The last attempt, made for `run`, failed.
    Failed { run: u32 },
}

/// One validity window of a condition and the source valid within it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    window: ValidityWindow,
    source: Source,
    table: Option<ConditionTable>,
    failure: Option<(u32, ConditionsError)>,
}

impl Entry {
    const fn new(window: ValidityWindow, source: Source) -> Self {
        Self {
            window,
            source,
            table: None,
            failure: None,
        }
    }

    #[must_use]
    pub const fn window(&self) -> &ValidityWindow {
        &self.window
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// Returns the cached table, if the entry has been resolved.
    #[must_use]
    pub const fn table(&self) -> Option<&ConditionTable> {
        self.table.as_ref()
    }

    /// Returns the error of the last failed attempt.
    #[must_use]
    pub fn failure(&self) -> Option<&ConditionsError> {
        self.failure.as_ref().map(|(_, error)| error)
    }

    #[must_use]
    pub fn status(&self) -> EntryStatus {
        match (&self.table, &self.failure) {
            (Some(_), _) => EntryStatus::Resolved,
            (None, Some((run, _))) => EntryStatus::Failed { run: *run },
            (None, None) => EntryStatus::Unresolved,
        }
    }
}

#[derive(Debug)]
struct Condition {
    def: ConditionDef,
    entries: Vec<Entry>,
}

/// Maps `(condition name, run)` to a conditions table.
///
/// Each condition has an ordered list of entries whose windows never
/// overlap. Resolving finds the entry whose window contains the run, loads
/// its source once, and caches the table on the entry; later runs matching
/// the same entry reuse it. A failed load is remembered for the run that
/// caused it and retried when a different run asks.
///
/// The resolver is not shared between threads; give each processing stream
/// its own.
pub struct ConditionsResolver {
    options: ResolverOptions,
    registry: Option<InterpreterRegistry>,
    fetcher: Box<dyn SourceFetcher>,
    conditions: Vec<Condition>,
}

impl fmt::Debug for ConditionsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionsResolver")
            .field("options", &self.options)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

impl Default for ConditionsResolver {
    fn default() -> Self {
        Self::new(ResolverOptions::default())
    }
}

impl ConditionsResolver {
    /// Creates a resolver that reads local files.
    #[must_use]
    pub fn new(options: ResolverOptions) -> Self {
        Self::with_fetcher(options, LocalFetcher)
    }

    /// Creates a resolver that opens sources through `fetcher`.
    pub fn with_fetcher(options: ResolverOptions, fetcher: impl SourceFetcher + 'static) -> Self {
        Self {
            options,
            registry: None,
            fetcher: Box::new(fetcher),
            conditions: Vec::new(),
        }
    }

    /// Lets files identify rows by expanded identifier fields instead of an
    /// `Id` column.
    #[must_use]
    pub fn with_registry(mut self, registry: InterpreterRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    #[must_use]
    pub const fn registry(&self) -> Option<&InterpreterRegistry> {
        self.registry.as_ref()
    }

    /// Adds a condition with no entries.
    pub fn define(&mut self, def: ConditionDef) -> ConditionsResult<()> {
        if self.position(def.name()).is_some() {
            return Err(ConditionsError::DuplicateCondition {
                name: def.name().to_string(),
            });
        }
        self.conditions.push(Condition {
            def,
            entries: Vec::new(),
        });
        Ok(())
    }

    /// Appends an entry to a condition. Fails if `window` overlaps a window
    /// already registered for it.
    pub fn register(
        &mut self,
        name: &str,
        window: ValidityWindow,
        source: Source,
    ) -> ConditionsResult<()> {
        let condition = self.condition_mut(name)?;
        check_overlap(name, &condition.entries, &window)?;
        debug!(condition = name, %window, %source, "registered conditions entry");
        condition.entries.push(Entry::new(window, source));
        Ok(())
    }

    /// Registers every row of an entries index (`FIRST_RUN`, `LAST_RUN`,
    /// `RUNTYPE`, `URL`). Returns the number of entries added.
    ///
    /// The whole index is read and checked before anything is registered;
    /// on error the condition keeps exactly the entries it had.
    pub fn load_index<R: BufRead>(&mut self, name: &str, reader: R) -> ConditionsResult<usize> {
        let index_error = |source: TableError| ConditionsError::Index {
            name: name.to_string(),
            source,
        };
        let existing = &self.condition(name)?.entries;
        let mut rows = RowReader::new(reader).map_err(index_error)?;
        rows.require_columns(&INDEX_COLUMNS).map_err(index_error)?;

        let mut pending: Vec<Entry> = Vec::new();
        while rows.next_row().map_err(index_error)? {
            let first_run = rows.get_integer("FIRST_RUN").map_err(index_error)?;
            let last_run = rows.get_integer("LAST_RUN").map_err(index_error)?;
            let run_type = RunType::from_index_label(rows.get("RUNTYPE").map_err(index_error)?);
            let url = rows.get("URL").map_err(index_error)?.to_string();
            let window = ValidityWindow::from_signed(first_run, last_run, run_type)?;
            check_overlap(name, existing, &window)?;
            check_overlap(name, &pending, &window)?;
            pending.push(Entry::new(window, Source::Location(url)));
        }

        let added = pending.len();
        let condition = self.condition_mut(name)?;
        for entry in &pending {
            debug!(
                condition = name,
                window = %entry.window,
                source = %entry.source,
                "registered conditions entry"
            );
        }
        condition.entries.extend(pending);
        Ok(added)
    }

    /// Expands and opens `location`, then loads it as an entries index.
    pub fn load_index_from(&mut self, name: &str, location: &str) -> ConditionsResult<usize> {
        let location = Location::resolve(location, &self.options)?;
        let reader = self.fetcher.open(&location)?;
        debug!(condition = name, %location, "loading conditions index");
        self.load_index(name, reader)
    }

    /// Returns the table of the entry whose window contains `context`,
    /// loading it on first use.
    pub fn resolve(&mut self, name: &str, context: RunContext) -> ConditionsResult<&ConditionTable> {
        let options = &self.options;
        let registry = self.registry.as_ref();
        let fetcher = &*self.fetcher;
        let condition = self
            .conditions
            .iter_mut()
            .find(|condition| condition.def.name() == name)
            .ok_or_else(|| unknown(name))?;
        let index = matching_entry(&condition.entries, name, context)?;
        let entry = &mut condition.entries[index];

        let table = match entry.table.take() {
            Some(table) => {
                debug!(condition = name, window = %entry.window, "conditions cache hit");
                table
            }
            None => {
                if let Some((run, error)) = &entry.failure {
                    if *run == context.run {
                        debug!(condition = name, run, "returning cached conditions failure");
                        return Err(error.clone());
                    }
                }
                debug!(
                    condition = name,
                    run = context.run,
                    window = %entry.window,
                    source = %entry.source,
                    "matched conditions entry"
                );
                match materialize(&condition.def, &entry.source, options, registry, fetcher) {
                    Ok(table) => {
                        debug!(
                            condition = name,
                            rows = table.row_count(),
                            source = %entry.source,
                            "materialized conditions table"
                        );
                        entry.failure = None;
                        table
                    }
                    Err(error) => {
                        warn!(condition = name, run = context.run, %error, "conditions resolution failed");
                        entry.failure = Some((context.run, error.clone()));
                        return Err(error);
                    }
                }
            }
        };
        Ok(&*entry.table.insert(table))
    }

    /// Resolves a condition defined with integer values.
    pub fn resolve_integer(
        &mut self,
        name: &str,
        context: RunContext,
    ) -> ConditionsResult<&IntegerTable> {
        self.expect_kind(name, ValueKind::Integer)?;
        let table = self.resolve(name, context)?;
        table
            .as_integer()
            .ok_or_else(|| wrong_kind(name, ValueKind::Integer, table.kind()))
    }

    /// Resolves a condition defined with double values.
    pub fn resolve_double(
        &mut self,
        name: &str,
        context: RunContext,
    ) -> ConditionsResult<&DoubleTable> {
        self.expect_kind(name, ValueKind::Double)?;
        let table = self.resolve(name, context)?;
        table
            .as_double()
            .ok_or_else(|| wrong_kind(name, ValueKind::Double, table.kind()))
    }

    /// Returns the window that would serve `context`, without loading it.
    pub fn resolved_window(
        &self,
        name: &str,
        context: RunContext,
    ) -> ConditionsResult<ValidityWindow> {
        let condition = self.condition(name)?;
        let index = matching_entry(&condition.entries, name, context)?;
        Ok(condition.entries[index].window)
    }

    /// Returns `true` if the entry serving `context` already holds a table.
    #[must_use]
    pub fn is_resolved(&self, name: &str, context: RunContext) -> bool {
        self.condition(name)
            .ok()
            .and_then(|condition| {
                condition
                    .entries
                    .iter()
                    .find(|entry| entry.window.contains_context(context))
            })
            .is_some_and(|entry| entry.table.is_some())
    }

    /// Iterates over condition definitions in definition order.
    pub fn conditions(&self) -> impl Iterator<Item = &ConditionDef> + '_ {
        self.conditions.iter().map(|condition| &condition.def)
    }

    /// Returns the definition of a condition.
    pub fn definition(&self, name: &str) -> ConditionsResult<&ConditionDef> {
        self.condition(name).map(|condition| &condition.def)
    }

    /// Returns a condition's entries in registration order.
    pub fn entries(&self, name: &str) -> ConditionsResult<&[Entry]> {
        self.condition(name).map(|condition| condition.entries.as_slice())
    }

    /// Returns the load state of one entry.
    pub fn state(&self, name: &str, index: usize) -> ConditionsResult<EntryStatus> {
        self.entries(name)?
            .get(index)
            .map(Entry::status)
            .ok_or_else(|| ConditionsError::NoSuchEntry {
                name: name.to_string(),
                index,
            })
    }

    fn expect_kind(&self, name: &str, expected: ValueKind) -> ConditionsResult<()> {
        let actual = self.definition(name)?.kind();
        if actual == expected {
            Ok(())
        } else {
            Err(wrong_kind(name, expected, actual))
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.conditions
            .iter()
            .position(|condition| condition.def.name() == name)
    }

    fn condition(&self, name: &str) -> ConditionsResult<&Condition> {
        self.position(name)
            .map(|index| &self.conditions[index])
            .ok_or_else(|| unknown(name))
    }

    fn condition_mut(&mut self, name: &str) -> ConditionsResult<&mut Condition> {
        let index = self.position(name).ok_or_else(|| unknown(name))?;
        Ok(&mut self.conditions[index])
    }
}

fn matching_entry(entries: &[Entry], name: &str, context: RunContext) -> ConditionsResult<usize> {
    entries
        .iter()
        .position(|entry| entry.window.contains_context(context))
        .ok_or_else(|| ConditionsError::NoMatchingWindow {
            name: name.to_string(),
            run: context.run,
            simulated: context.is_simulated,
        })
}

fn materialize(
    def: &ConditionDef,
    source: &Source,
    options: &ResolverOptions,
    registry: Option<&InterpreterRegistry>,
    fetcher: &dyn SourceFetcher,
) -> ConditionsResult<ConditionTable> {
    match source {
        Source::Inline(values) => inline_table(def, values),
        Source::Location(raw) => {
            let location = Location::resolve(raw, options)?;
            let reader = fetcher.open(&location)?;
            let mut table = def.empty_table();
            table
                .decode_from(reader, registry)
                .map_err(|source| ConditionsError::Table {
                    name: def.name().to_string(),
                    location: location.to_string(),
                    source,
                })?;
            Ok(table)
        }
    }
}

fn check_overlap(name: &str, entries: &[Entry], window: &ValidityWindow) -> ConditionsResult<()> {
    match entries.iter().find(|entry| entry.window.overlaps(window)) {
        Some(existing) => Err(ConditionsError::OverlappingValidityWindow {
            name: name.to_string(),
            existing: existing.window,
            new: *window,
        }),
        None => Ok(()),
    }
}

fn inline_table(def: &ConditionDef, values: &InlineValues) -> ConditionsResult<ConditionTable> {
    let table_error = |source: TableError| ConditionsError::Table {
        name: def.name().to_string(),
        location: "inline".to_string(),
        source,
    };
    match (def.kind(), values) {
        (ValueKind::Integer, InlineValues::Integer(row)) => def
            .single_row(row)
            .map(ConditionTable::Integer)
            .map_err(table_error),
        (ValueKind::Double, InlineValues::Double(row)) => def
            .single_row(row)
            .map(ConditionTable::Double)
            .map_err(table_error),
        (expected, values) => Err(wrong_kind(def.name(), expected, values.kind())),
    }
}

fn unknown(name: &str) -> ConditionsError {
    ConditionsError::UnknownCondition {
        name: name.to_string(),
    }
}

fn wrong_kind(name: &str, expected: ValueKind, actual: ValueKind) -> ConditionsError {
    ConditionsError::WrongTableKind {
        name: name.to_string(),
        expected,
        actual,
    }
}
