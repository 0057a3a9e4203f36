//! `${NAME}` expansion in source locations.

use tracing::warn;

use crate::error::{ConditionsError, ConditionsResult};

/// Reserved variable naming the active conditions tag.
pub const TAG_VARIABLE: &str = "CONDITIONS_TAG";

/// Reserved variable naming the configured base URL.
pub const BASE_URL_VARIABLE: &str = "CONDITIONS_BASEURL";

/// What to do with a `${NAME}` that has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExpansionPolicy {
    /// Fail with `UnresolvedVariable`.
    #[default]
    Strict,
    /// Substitute empty text and log a warning.
    Permissive,
}

/// Settings shared by every condition of a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolverOptions {
    /// Value of `${CONDITIONS_TAG}`.
    pub tag: String,
    /// Value of `${CONDITIONS_BASEURL}`, and the prefix for locations that
    /// carry no scheme.
    pub base_url: Option<String>,
    pub expansion: ExpansionPolicy,
}

impl ResolverOptions {
    /// Looks up a variable: reserved names first, then the environment.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<String> {
        match name {
            TAG_VARIABLE => Some(self.tag.clone()),
            BASE_URL_VARIABLE => self.base_url.clone(),
            _ => std::env::var(name).ok(),
        }
    }

    /// Expands every `${NAME}` in `text` using [`variable`](Self::variable).
    pub fn expand(&self, text: &str) -> ConditionsResult<String> {
        expand_with(text, self.expansion, |name| self.variable(name))
    }
}

/// Expands every `${NAME}` in `text` with values from `lookup`.
///
/// An opening `${` with no closing brace is copied through unchanged.
pub fn expand_with<F>(text: &str, policy: ExpansionPolicy, lookup: F) -> ConditionsResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + len];
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => match policy {
                ExpansionPolicy::Strict => {
                    return Err(ConditionsError::UnresolvedVariable {
                        variable: name.to_string(),
                    });
                }
                ExpansionPolicy::Permissive => {
                    warn!(variable = name, text, "unresolved variable expanded to empty text");
                }
            },
        }
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);
    Ok(out)
}
