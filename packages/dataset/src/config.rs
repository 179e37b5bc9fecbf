//! Loader configuration.
//!
//! The default configuration is a TOML file baked into the binary at compile
//! time via [`include_str!`]. Custom configurations use the same schema and
//! can be parsed from a string or read from disk.

use std::path::Path;

use serde::Deserialize;

use crate::LoadError;

/// Default configuration, embedded at compile time.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Everything the loader needs to know about the input's layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoaderConfig {
    /// Field delimiter. Must be a single ASCII character.
    pub delimiter: String,
    /// Header names of the required columns.
    pub columns: ColumnNames,
    /// Timestamp detection and parsing rules.
    pub timestamp: TimestampConfig,
}

/// Header names of the four required columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnNames {
    /// Crime category column.
    pub category: String,
    /// Police district column.
    pub district: String,
    /// X coordinate column.
    pub x: String,
    /// Y coordinate column.
    pub y: String,
}

impl ColumnNames {
    /// Returns the required headers in validation order.
    #[must_use]
    pub fn required(&self) -> [&str; 4] {
        [&self.category, &self.district, &self.x, &self.y]
    }
}

/// How the timestamp column is found and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimestampConfig {
    /// Candidate header names, searched in order.
    pub aliases: Vec<String>,
    /// `chrono` format strings for values with a time component.
    pub datetime_formats: Vec<String>,
    /// `chrono` format strings for date-only values (midnight is assumed).
    pub date_formats: Vec<String>,
}

impl TimestampConfig {
    /// Returns the first alias present in `headers`.
    #[must_use]
    pub fn detect<'a>(&'a self, headers: &[String]) -> Option<&'a str> {
        self.aliases
            .iter()
            .find(|alias| headers.iter().any(|h| h == *alias))
            .map(String::as_str)
    }
}

impl LoaderConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] if the TOML is malformed or the
    /// configuration is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, LoadError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| LoadError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, or
    /// [`LoadError::Config`] if it is not a valid configuration.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded loader config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Returns the delimiter as the byte the CSV reader expects.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees a single ASCII byte
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.delimiter.len() != 1 || !self.delimiter.is_ascii() {
            return Err(LoadError::Config {
                message: format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                ),
            });
        }

        if let Some(empty) = self.columns.required().iter().find(|c| c.is_empty()) {
            return Err(LoadError::Config {
                message: format!("required column names must be non-empty, got '{empty}'"),
            });
        }

        if self.timestamp.datetime_formats.is_empty() && self.timestamp.date_formats.is_empty() {
            return Err(LoadError::Config {
                message: "at least one timestamp format is required".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for LoaderConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since the file ships with the crate).
    fn default() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse default.toml: {e}"))
    }
}
