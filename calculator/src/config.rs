//! Calculator configuration.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use ratebook_fx::{FeedSource, JsonFileFeed, ReferenceFeed};
use thiserror::Error;
use tracing::debug;

/// Properties key holding the admission permit count.
pub const PERMITS_KEY: &str = "converterPermits";
/// Properties key holding the direct feed path.
pub const FEED_PATH_KEY: &str = "directFeedPath";

/// Environment variable overriding the permit count.
pub const PERMITS_ENV: &str = "RATEBOOK_CONVERTER_PERMITS";
/// Environment variable overriding the feed path.
pub const FEED_PATH_ENV: &str = "RATEBOOK_FEED_PATH";

/// Configuration faults. All of these stop the calculator before it reads input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Properties file could not be read.
    #[error("Cannot read properties file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A properties line has no `=` or `:` separator.
    #[error("Malformed properties line {line}: {text}")]
    MalformedLine { line: usize, text: String },

    /// No permit count configured anywhere.
    #[error("{} is not configured", PERMITS_KEY)]
    MissingPermits,

    /// Permit count is not a positive integer.
    #[error("{} must be a positive integer, got {0:?}", PERMITS_KEY)]
    InvalidPermits(String),
}

/// Main calculator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// Permit count as configured, validated by [`CalculatorConfig::permits`].
    pub converter_permits: Option<String>,
    /// Direct feed file. The bundled reference feed is used when unset.
    pub feed_path: Option<PathBuf>,
}

impl CalculatorConfig {
    /// Load configuration from a properties file.
    pub fn from_properties(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_properties(&text)
    }

    /// Parse `key=value` lines. `#` and `!` start comment lines.
    pub fn parse_properties(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some(split) = line.find(|c: char| c == '=' || c == ':') else {
                return Err(ConfigError::MalformedLine {
                    line: index + 1,
                    text: raw.to_string(),
                });
            };
            let key = line[..split].trim();
            let value = line[split + 1..].trim();

            match key {
                PERMITS_KEY => config.converter_permits = Some(value.to_string()),
                FEED_PATH_KEY if !value.is_empty() => config.feed_path = Some(value.into()),
                _ => debug!(key, "Ignoring unknown property"),
            }
        }

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an environment lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(permits) = lookup(PERMITS_ENV) {
            self.converter_permits = Some(permits);
        }

        if let Some(path) = lookup(FEED_PATH_ENV) {
            self.feed_path = Some(path.into());
        }

        self
    }

    /// The admission permit count.
    pub fn permits(&self) -> Result<NonZeroUsize, ConfigError> {
        let raw = self
            .converter_permits
            .as_deref()
            .ok_or(ConfigError::MissingPermits)?;

        raw.trim()
            .parse::<NonZeroUsize>()
            .map_err(|_| ConfigError::InvalidPermits(raw.to_string()))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.permits().map(|_| ())
    }

    /// Source of the direct feed.
    pub fn feed_source(&self) -> Box<dyn FeedSource> {
        match &self.feed_path {
            Some(path) => Box::new(JsonFileFeed::new(path)),
            None => Box::new(ReferenceFeed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_properties() {
        let config = CalculatorConfig::parse_properties(
            "# permits\nconverterPermits = 4\n\n! feed\ndirectFeedPath: feeds/direct.json\nother=1\n",
        )
        .unwrap();

        assert_eq!(config.permits().unwrap().get(), 4);
        assert_eq!(config.feed_path, Some(PathBuf::from("feeds/direct.json")));
    }

    #[test]
    fn test_missing_permits() {
        let config = CalculatorConfig::parse_properties("directFeedPath=a.json").unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::MissingPermits)));
    }

    #[test]
    fn test_invalid_permits() {
        for value in ["four", "0", "-2", "1.5", ""] {
            let config =
                CalculatorConfig::parse_properties(&format!("converterPermits={}", value)).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidPermits(_))),
                "accepted {:?}",
                value
            );
        }
    }

    #[test]
    fn test_malformed_line() {
        let err = CalculatorConfig::parse_properties("converterPermits=2\njunk\n").unwrap_err();

        assert!(matches!(err, ConfigError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(PERMITS_ENV, "8"), (FEED_PATH_ENV, "/tmp/feed.json")]);
        let config = CalculatorConfig::parse_properties("converterPermits=2")
            .unwrap()
            .with_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.permits().unwrap().get(), 8);
        assert_eq!(config.feed_path, Some(PathBuf::from("/tmp/feed.json")));
    }

    #[test]
    fn test_from_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "converterPermits=3").unwrap();

        let config = CalculatorConfig::from_properties(file.path()).unwrap();
        assert_eq!(config.permits().unwrap().get(), 3);
        assert_eq!(config.feed_source().name(), "REFERENCE");
    }

    #[test]
    fn test_unreadable_properties_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = CalculatorConfig::from_properties(&dir.path().join("app.properties")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
