//! Where a condition's table comes from.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use table::ValueKind;

use crate::error::{ConditionsError, ConditionsResult, SourceError};
use crate::expand::ResolverOptions;

/// Values given directly in the configuration, in column order.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineValues {
    /// Values for an integer condition.
    Integer(Vec<i32>),
    /// Values for a double condition.
    Double(Vec<f64>),
}

impl InlineValues {
    /// Returns the value kind.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
        }
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(values) => values.len(),
            Self::Double(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The data behind one resolver entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A single row applying to every identifier.
    Inline(InlineValues),
    /// A file path or URL, possibly containing `${NAME}` references.
    Location(String),
}

impl Source {
    /// Creates a location source.
    pub fn location(text: impl Into<String>) -> Self {
        Self::Location(text.into())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(values) => write!(f, "inline ({} values)", values.len()),
            Self::Location(location) => f.write_str(location),
        }
    }
}

/// An expanded, classified location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    File(PathBuf),
    Network(String),
}

impl Location {
    /// Classifies expanded text: `file://` or no scheme is a file,
    /// `http://` and `https://` are network locations.
    pub fn parse(text: &str) -> ConditionsResult<Self> {
        if let Some(path) = text.strip_prefix("file://") {
            return Ok(Self::File(PathBuf::from(path)));
        }
        if text.starts_with("http://") || text.starts_with("https://") {
            return Ok(Self::Network(text.to_string()));
        }
        if text.contains("://") {
            return Err(ConditionsError::UnsupportedScheme {
                location: text.to_string(),
            });
        }
        Ok(Self::File(PathBuf::from(text)))
    }

    /// Expands `raw`, prefixes the base URL when the result has no scheme,
    /// and classifies it.
    pub fn resolve(raw: &str, options: &ResolverOptions) -> ConditionsResult<Self> {
        let mut text = options.expand(raw)?;
        if let Some(base) = options.base_url.as_deref() {
            if !text.contains("://") {
                text.insert_str(0, base);
            }
        }
        Self::parse(&text)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Network(url) => f.write_str(url),
        }
    }
}

/// Opens locations as line streams.
///
/// The resolver calls `open` at most once per entry unless the previous
/// attempt failed and the run changed.
pub trait SourceFetcher {
    /// Opens the text stream behind an expanded, classified location.
    fn open(&self, location: &Location) -> Result<Box<dyn BufRead>, SourceError>;
}

/// Opens local files; network locations fail with
/// [`SourceError::NetworkUnsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl SourceFetcher for LocalFetcher {
    fn open(&self, location: &Location) -> Result<Box<dyn BufRead>, SourceError> {
        match location {
            Location::File(path) => {
                let file = File::open(path)
                    .map_err(|err| SourceError::io(location.to_string(), &err))?;
                Ok(Box::new(BufReader::new(file)))
            }
            Location::Network(url) => Err(SourceError::NetworkUnsupported {
                location: url.clone(),
            }),
        }
    }
}

impl<T: SourceFetcher + ?Sized> SourceFetcher for &T {
    fn open(&self, location: &Location) -> Result<Box<dyn BufRead>, SourceError> {
        (**self).open(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::ExpansionPolicy;
    use std::io::Write;

    #[test]
    fn classify_locations() {
        assert_eq!(
            Location::parse("file:///data/gains.csv").unwrap(),
            Location::File(PathBuf::from("/data/gains.csv"))
        );
        assert_eq!(
            Location::parse("gains.csv").unwrap(),
            Location::File(PathBuf::from("gains.csv"))
        );
        assert_eq!(
            Location::parse("https://host/gains.csv").unwrap(),
            Location::Network("https://host/gains.csv".to_string())
        );
        assert!(matches!(
            Location::parse("ftp://host/gains.csv"),
            Err(ConditionsError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn base_url_prefix_only_without_scheme() {
        let options = ResolverOptions {
            tag: "v1".to_string(),
            base_url: Some("https://host/conditions/".to_string()),
            expansion: ExpansionPolicy::Strict,
        };
        assert_eq!(
            Location::resolve("${CONDITIONS_TAG}/ecal.csv", &options).unwrap(),
            Location::Network("https://host/conditions/v1/ecal.csv".to_string())
        );
        assert_eq!(
            Location::resolve("file:///x.csv", &options).unwrap(),
            Location::File(PathBuf::from("/x.csv"))
        );
    }

    #[test]
    fn no_base_url_keeps_relative_path() {
        let options = ResolverOptions::default();
        assert_eq!(
            Location::resolve("tables/ecal.csv", &options).unwrap(),
            Location::File(PathBuf::from("tables/ecal.csv"))
        );
    }

    #[test]
    fn local_fetcher_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Id,A").unwrap();
        let location = Location::File(file.path().to_path_buf());
        let mut reader = LocalFetcher.open(&location).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "Id,A\n");
    }

    #[test]
    fn local_fetcher_errors() {
        let missing = Location::File(PathBuf::from("/nonexistent/condb/gains.csv"));
        let Err(err) = LocalFetcher.open(&missing) else {
            panic!("missing file opened");
        };
        assert!(matches!(
            err,
            SourceError::Io {
                kind: std::io::ErrorKind::NotFound,
                ..
            }
        ));
        let network = Location::Network("https://host/x.csv".to_string());
        let Err(err) = LocalFetcher.open(&network) else {
            panic!("network location opened");
        };
        assert_eq!(err.location(), "https://host/x.csv");
    }

    #[test]
    fn inline_values() {
        let values = InlineValues::Double(vec![1.0, 2.0]);
        assert_eq!(values.kind(), ValueKind::Double);
        assert_eq!(values.len(), 2);
        assert_eq!(Source::Inline(values).to_string(), "inline (2 values)");
    }
}
