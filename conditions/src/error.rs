//! Error types for conditions resolution.

use std::fmt;
use std::io;

use table::{TableError, ValueKind};

use crate::window::ValidityWindow;

/// Result type for conditions operations.
pub type ConditionsResult<T> = Result<T, ConditionsError>;

/// Failure to open a source's byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Opening or reading a local file failed.
    Io {
        location: String,
        kind: io::ErrorKind,
        message: String,
    },

    /// The fetcher has no transport for network locations.
    NetworkUnsupported { location: String },

    /// A custom fetcher failed.
    Fetch { location: String, message: String },
}

impl SourceError {
    /// Builds an `Io` error from an `io::Error`.
    #[must_use]
    pub fn io(location: impl Into<String>, err: &io::Error) -> Self {
        Self::Io {
            location: location.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Returns the location that failed.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Io { location, .. }
            | Self::NetworkUnsupported { location }
            | Self::Fetch { location, .. } => location,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                location, message, ..
            } => write!(f, "unable to open '{location}': {message}"),
            Self::NetworkUnsupported { location } => {
                write!(f, "no network transport available for '{location}'")
            }
            Self::Fetch { location, message } => {
                write!(f, "fetching '{location}' failed: {message}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Errors raised while configuring or resolving conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionsError {
    /// A window's first run is after its last run.
    InvalidWindow { first_run: u32, last_run: u32 },

    /// A run bound is neither a run number nor `-1` (unbounded).
    InvalidRunNumber { value: i64 },

    /// No condition with this name has been defined.
    UnknownCondition { name: String },

    /// A condition with this name is already defined.
    DuplicateCondition { name: String },

    /// Entry index past the end of a condition's entries.
    NoSuchEntry { name: String, index: usize },

    /// The new window overlaps one already registered for the condition.
    OverlappingValidityWindow {
        name: String,
        existing: ValidityWindow,
        new: ValidityWindow,
    },

    /// No registered window contains the run.
    NoMatchingWindow {
        name: String,
        run: u32,
        simulated: bool,
    },

    /// The condition holds a different value kind than requested.
    WrongTableKind {
        name: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A `${NAME}` reference could not be resolved.
    UnresolvedVariable { variable: String },

    /// The location names a scheme no fetcher understands.
    UnsupportedScheme { location: String },

    /// Opening a source failed.
    Source(SourceError),

    /// Decoding or populating a condition's table failed.
    Table {
        name: String,
        location: String,
        source: TableError,
    },

    /// Reading a condition's index of entries failed.
    Index { name: String, source: TableError },

    /// A configuration document is inconsistent.
    InvalidConfig { message: String },
}

impl fmt::Display for ConditionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWindow {
                first_run,
                last_run,
            } => {
                write!(
                    f,
                    "invalid validity window: first run {first_run} is after last run {last_run}"
                )
            }
            Self::InvalidRunNumber { value } => {
                write!(f, "invalid run bound {value} (use -1 for unbounded)")
            }
            Self::UnknownCondition { name } => write!(f, "unknown condition '{name}'"),
            Self::DuplicateCondition { name } => {
                write!(f, "condition '{name}' is already defined")
            }
            Self::NoSuchEntry { name, index } => {
                write!(f, "condition '{name}' has no entry {index}")
            }
            Self::OverlappingValidityWindow {
                name,
                existing,
                new,
            } => {
                write!(
                    f,
                    "window {new} for '{name}' overlaps registered window {existing}"
                )
            }
            Self::NoMatchingWindow {
                name,
                run,
                simulated,
            } => {
                let category = if *simulated { "simulation" } else { "data" };
                write!(f, "no window for '{name}' covers {category} run {run}")
            }
            Self::WrongTableKind {
                name,
                expected,
                actual,
            } => {
                write!(f, "condition '{name}' holds {actual} values, not {expected}")
            }
            Self::UnresolvedVariable { variable } => {
                write!(f, "unresolved variable '${{{variable}}}'")
            }
            Self::UnsupportedScheme { location } => {
                write!(f, "unsupported scheme in location '{location}'")
            }
            Self::Source(err) => write!(f, "{err}"),
            Self::Table {
                name,
                location,
                source,
            } => write!(f, "loading '{name}' from '{location}': {source}"),
            Self::Index { name, source } => {
                write!(f, "reading entries for '{name}': {source}")
            }
            Self::InvalidConfig { message } => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for ConditionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Table { source, .. } | Self::Index { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SourceError> for ConditionsError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}
