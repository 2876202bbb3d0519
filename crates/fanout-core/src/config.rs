//! Config - TOML から読める Dispatcher 設定
//!
//! ```toml
//! [dispatcher]
//! max_concurrency = 4
//! ```
//!
//! `[dispatcher]` ヘッダなしのフラットな形式も受け付けます。

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Cap on concurrently running tasks. `None` runs every task at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

/// File layout with a `[dispatcher]` table.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    dispatcher: DispatcherConfig,
}

impl DispatcherConfig {
    /// Unbounded fan-out.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// Parse from a TOML string, with or without a `[dispatcher]` header.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = input.parse()?;
        let config = if table.contains_key("dispatcher") {
            toml::from_str::<ConfigFile>(input)?.dispatcher
        } else {
            toml::from_str::<DispatcherConfig>(input)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_input_is_unbounded() {
        let config = DispatcherConfig::from_toml_str("").unwrap();
        assert_eq!(config, DispatcherConfig::unbounded());
        assert_eq!(config.max_concurrency, None);
    }

    #[test]
    fn parses_dispatcher_table() {
        let config = DispatcherConfig::from_toml_str("[dispatcher]\nmax_concurrency = 4\n").unwrap();
        assert_eq!(config.max_concurrency, Some(4));
    }

    #[test]
    fn parses_bare_table() {
        let config = DispatcherConfig::from_toml_str("max_concurrency = 2").unwrap();
        assert_eq!(config.max_concurrency, Some(2));
    }

    #[test]
    fn rejects_zero_limit() {
        let err = DispatcherConfig::from_toml_str("max_concurrency = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = DispatcherConfig::from_toml_str("workers = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatcher]\nmax_concurrency = 8").unwrap();

        let config = DispatcherConfig::load(file.path()).unwrap();
        assert_eq!(config, DispatcherConfig::default().with_max_concurrency(8));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = DispatcherConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
