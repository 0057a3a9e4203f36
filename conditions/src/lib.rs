//! Run-dependent conditions: validity windows, sources, and a caching
//! resolver.
//!
//! A condition is a named [`ConditionDef`] (columns, value kind, identifier
//! mask) with an ordered list of entries, each pairing a
//! [`ValidityWindow`] with a [`Source`]. [`ConditionsResolver::resolve`]
//! picks the entry whose window contains the run, loads its table once,
//! and serves it from the cache afterwards.
//!
//! # Features
//!
//! - Overlapping windows are rejected when registered
//! - `${NAME}` expansion with reserved `CONDITIONS_TAG` / `CONDITIONS_BASEURL`
//! - Pluggable transport through [`SourceFetcher`]
//! - Entries indexes (`FIRST_RUN,LAST_RUN,RUNTYPE,URL`)
//! - JSON configuration behind the `serde` feature
//!
//! # Design Principles
//!
//! - **Explicit ownership** - Each processing stream owns its resolver; there
//!   is no global cache.
//! - **Loud configuration errors** - Overlaps, missing columns and unresolved
//!   variables fail instead of defaulting.
//!
//! # Example
//!
//! ```
//! use conditions::{
//!     ConditionDef, ConditionsResolver, InlineValues, RunContext, Source, ValidityWindow,
//! };
//! use table::ValueKind;
//!
//! let mut resolver = ConditionsResolver::default();
//! resolver
//!     .define(ConditionDef::new("thresholds", ValueKind::Integer, ["adc"]))
//!     .unwrap();
//! resolver
//!     .register(
//!         "thresholds",
//!         ValidityWindow::unbounded(),
//!         Source::Inline(InlineValues::Integer(vec![12])),
//!     )
//!     .unwrap();
//! let table = resolver
//!     .resolve_integer("thresholds", RunContext::data(1))
//!     .unwrap();
//! assert_eq!(table.get(0x1402_100au32, 0).unwrap(), 12);
//! ```

mod condition;
#[cfg(feature = "serde")]
mod config;
mod error;
mod expand;
mod resolver;
mod source;
mod window;

pub use condition::{ConditionDef, ConditionTable};
#[cfg(feature = "serde")]
pub use config::{ConditionsConfig, EntryConfig, ProviderConfig};
pub use error::{ConditionsError, ConditionsResult, SourceError};
pub use expand::{expand_with, ExpansionPolicy, ResolverOptions, BASE_URL_VARIABLE, TAG_VARIABLE};
pub use resolver::{ConditionsResolver, Entry, EntryStatus, INDEX_COLUMNS};
pub use source::{InlineValues, LocalFetcher, Location, Source, SourceFetcher};
pub use window::{RunContext, RunType, ValidityWindow};
