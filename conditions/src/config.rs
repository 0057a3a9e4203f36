//! JSON-friendly description of a whole resolver.

use serde::{Deserialize, Serialize};
use table::ValueKind;

use crate::condition::ConditionDef;
use crate::error::{ConditionsError, ConditionsResult};
use crate::expand::{ExpansionPolicy, ResolverOptions};
use crate::resolver::ConditionsResolver;
use crate::source::{InlineValues, LocalFetcher, Source, SourceFetcher};
use crate::window::{RunType, ValidityWindow};

/// Resolver options plus every provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionsConfig {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub expansion: ExpansionPolicy,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// One named condition and its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub columns: Vec<String>,
    /// `int`, `integer`, `double` or `float`.
    pub data_type: String,
    #[serde(default)]
    pub id_mask: Option<u32>,
    #[serde(default)]
    pub entries: Vec<EntryConfig>,
    /// An entries index, loaded after `entries`.
    #[serde(default)]
    pub entries_url: Option<String>,
}

/// One validity window and its source. Exactly one of `url` and `values`
/// must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryConfig {
    #[serde(default = "unbounded")]
    pub first_run: i64,
    #[serde(default = "unbounded")]
    pub last_run: i64,
    #[serde(default)]
    pub run_type: RunType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<f64>>,
}

const fn unbounded() -> i64 {
    -1
}

impl ConditionsConfig {
    /// Returns the resolver options part.
    #[must_use]
    pub fn options(&self) -> ResolverOptions {
        ResolverOptions {
            tag: self.tag.clone(),
            base_url: self.base_url.clone(),
            expansion: self.expansion,
        }
    }
}

impl ProviderConfig {
    fn definition(&self) -> ConditionsResult<ConditionDef> {
        let kind: ValueKind = self.data_type.parse().map_err(|err| invalid(&self.name, err))?;
        let def = ConditionDef::new(self.name.as_str(), kind, self.columns.iter().cloned());
        Ok(match self.id_mask {
            Some(mask) => def.with_id_mask(mask),
            None => def,
        })
    }
}

impl EntryConfig {
    fn window(&self) -> ConditionsResult<ValidityWindow> {
        ValidityWindow::from_signed(self.first_run, self.last_run, self.run_type)
    }

    fn source(&self, provider: &str, kind: ValueKind) -> ConditionsResult<Source> {
        match (&self.url, &self.values) {
            (Some(url), None) => Ok(Source::Location(url.clone())),
            (None, Some(values)) => inline_values(provider, kind, values).map(Source::Inline),
            _ => Err(invalid(provider, "each entry needs exactly one of 'url' and 'values'")),
        }
    }
}

fn inline_values(provider: &str, kind: ValueKind, values: &[f64]) -> ConditionsResult<InlineValues> {
    match kind {
        ValueKind::Double => Ok(InlineValues::Double(values.to_vec())),
        ValueKind::Integer => values
            .iter()
            .map(|value| {
                integer_value(*value).ok_or_else(|| {
                    invalid(provider, format!("{value} is not a 32-bit integer"))
                })
            })
            .collect::<ConditionsResult<Vec<_>>>()
            .map(InlineValues::Integer),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: f64) -> Option<i32> {
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    (in_range && value.fract() == 0.0).then(|| value as i32)
}

fn invalid(provider: &str, message: impl std::fmt::Display) -> ConditionsError {
    ConditionsError::InvalidConfig {
        message: format!("provider '{provider}': {message}"),
    }
}

impl ConditionsResolver {
    /// Builds a resolver that reads local files from a configuration.
    pub fn from_config(config: &ConditionsConfig) -> ConditionsResult<Self> {
        Self::from_config_with_fetcher(config, LocalFetcher)
    }

    /// Builds a resolver from a configuration, opening sources and entries
    /// indexes through `fetcher`.
    pub fn from_config_with_fetcher(
        config: &ConditionsConfig,
        fetcher: impl SourceFetcher + 'static,
    ) -> ConditionsResult<Self> {
        let mut resolver = Self::with_fetcher(config.options(), fetcher);
        for provider in &config.providers {
            let def = provider.definition()?;
            let kind = def.kind();
            resolver.define(def)?;
            for entry in &provider.entries {
                resolver.register(
                    &provider.name,
                    entry.window()?,
                    entry.source(&provider.name, kind)?,
                )?;
            }
            if let Some(url) = &provider.entries_url {
                resolver.load_index_from(&provider.name, url)?;
            }
        }
        Ok(resolver)
    }
}
