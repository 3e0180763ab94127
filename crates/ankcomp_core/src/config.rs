//! Engine configuration for metadata key names.
//!
//! # Responsibility
//! - Hold the header and footer key names recognized by the parsers.
//! - Load optional overrides from a TOML file.
//!
//! # Invariants
//! - Every key is a non-empty `\w+` word, so it can be spliced into footer
//!   patterns without escaping.
//! - A config value is passed explicitly to each parser; there is no
//!   process-wide settings object.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Recognized metadata key names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Header key declaring the collection (deck) name.
    pub collection_key: String,
    /// Header key declaring document-level tags.
    pub header_tags_key: String,
    /// Footer key carrying the note identifier, e.g. `[^id]: AbC1234XYZ`.
    pub id_key: String,
    /// Repeatable footer key carrying one tag.
    pub tag_key: String,
    /// Repeatable footer key carrying one source reference.
    pub source_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collection_key: "deck".to_string(),
            header_tags_key: "tags".to_string(),
            id_key: "id".to_string(),
            tag_key: "tag".to_string(),
            source_key: "source".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document; omitted keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates that every key name is a usable word.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("collection_key", &self.collection_key),
            ("header_tags_key", &self.header_tags_key),
            ("id_key", &self.id_key),
            ("tag_key", &self.tag_key),
            ("source_key", &self.source_key),
        ] {
            if !is_word(value) {
                return Err(ConfigError::InvalidKey {
                    field,
                    value: value.clone(),
                });
            }
        }

        let footer = [&self.id_key, &self.tag_key, &self.source_key];
        for (i, left) in footer.iter().enumerate() {
            if footer[i + 1..].contains(left) {
                return Err(ConfigError::DuplicateFooterKey((*left).clone()));
            }
        }
        Ok(())
    }
}

/// Reads and validates a TOML config file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    EngineConfig::from_toml_str(&raw)
}

fn is_word(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
}

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidKey {
        field: &'static str,
        value: String,
    },
    DuplicateFooterKey(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidKey { field, value } => {
                write!(f, "config key `{field}` must be a word, got `{value}`")
            }
            Self::DuplicateFooterKey(key) => {
                write!(f, "footer key `{key}` is assigned to more than one role")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidKey { .. } | Self::DuplicateFooterKey(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("id_key = \"guid\"\n").unwrap();
        assert_eq!(config.id_key, "guid");
        assert_eq!(config.tag_key, "tag");
        assert_eq!(config.collection_key, "deck");
    }

    #[test]
    fn rejects_non_word_keys() {
        let err = EngineConfig::from_toml_str("tag_key = \"a b\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { field: "tag_key", .. }));
    }

    #[test]
    fn rejects_shared_footer_keys() {
        let err = EngineConfig::from_toml_str("tag_key = \"id\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFooterKey(ref key) if key == "id"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = EngineConfig::from_toml_str("bogus = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
