//! histmap configuration management
//!
//! Handles configuration from environment variables and TOML files with
//! documented defaults for every pipeline component.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Gazetteer source file locations
    pub gazetteer: GazetteerSourcesConfig,

    /// Text chunking
    pub chunker: ChunkerConfig,

    /// Entity recognition
    pub recognizer: RecognizerConfig,

    /// Gazetteer resolution cascade
    pub resolver: ResolverConfig,

    /// Mention context windows
    pub context: ContextConfig,

    /// Batch processing
    pub batch: BatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("HISTMAP_CITIES_PATH") {
            config.gazetteer.cities_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("HISTMAP_LINKED_PLACES_PATH") {
            config.gazetteer.linked_places_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("HISTMAP_OVERRIDES_PATH") {
            config.gazetteer.overrides_path = Some(PathBuf::from(path));
        }

        if let Ok(value) = std::env::var("HISTMAP_CHUNK_BYTES") {
            config.chunker.max_chunk_bytes = parse_env("HISTMAP_CHUNK_BYTES", value)?;
        }

        if let Ok(value) = std::env::var("HISTMAP_FUZZY_THRESHOLD") {
            config.resolver.fuzzy_threshold = parse_env("HISTMAP_FUZZY_THRESHOLD", value)?;
        }
        if let Ok(value) = std::env::var("HISTMAP_ALIAS_CONFIDENCE") {
            config.resolver.alias_confidence = parse_env("HISTMAP_ALIAS_CONFIDENCE", value)?;
        }

        if let Ok(value) = std::env::var("HISTMAP_CONTEXT_WINDOW") {
            config.context.window_bytes = parse_env("HISTMAP_CONTEXT_WINDOW", value)?;
        }

        if let Ok(value) = std::env::var("HISTMAP_MAX_CONCURRENT_DOCUMENTS") {
            config.batch.max_concurrent_documents =
                parse_env("HISTMAP_MAX_CONCURRENT_DOCUMENTS", value)?;
        }
        if let Ok(value) = std::env::var("HISTMAP_DOCUMENT_TIMEOUT_SECS") {
            config.batch.document_timeout_secs =
                parse_env("HISTMAP_DOCUMENT_TIMEOUT_SECS", value)?;
        }

        if let Ok(level) = std::env::var("HISTMAP_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        if env_config.gazetteer.cities_path.is_some() {
            self.gazetteer.cities_path = env_config.gazetteer.cities_path;
        }
        if env_config.gazetteer.linked_places_path.is_some() {
            self.gazetteer.linked_places_path = env_config.gazetteer.linked_places_path;
        }
        if env_config.gazetteer.overrides_path.is_some() {
            self.gazetteer.overrides_path = env_config.gazetteer.overrides_path;
        }
        if env_config.chunker.max_chunk_bytes != ChunkerConfig::default().max_chunk_bytes {
            self.chunker.max_chunk_bytes = env_config.chunker.max_chunk_bytes;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Gazetteer raw-source file locations.
///
/// Sources are applied in field order at build time; later sources win
/// on identical normalized names.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GazetteerSourcesConfig {
    /// Bulk cities table (TSV)
    pub cities_path: Option<PathBuf>,

    /// Historical supplement (Linked Places JSON)
    pub linked_places_path: Option<PathBuf>,

    /// Regional override table (TOML)
    pub overrides_path: Option<PathBuf>,
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in bytes; boundaries move to the nearest
    /// whitespace so no word is ever split
    pub max_chunk_bytes: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 500_000,
        }
    }
}

/// Entity recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Shortest span (bytes) worth considering a place name
    pub min_span_len: usize,

    /// Longest capitalized run (words) treated as a single candidate
    pub max_span_words: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            min_span_len: 3,
            max_span_words: 4,
        }
    }
}

/// Resolution cascade configuration.
///
/// The three tiers are policy knobs, not derivable constants: exact
/// matches always score 1.0, alias matches score `alias_confidence`, and
/// fuzzy matches score similarity x `fuzzy_scale`. `validate` enforces
/// the strict exact > alias > fuzzy confidence ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Fixed confidence for alias/containment matches
    pub alias_confidence: f32,

    /// Minimum Jaro-Winkler similarity for the fuzzy tier (inclusive)
    pub fuzzy_threshold: f32,

    /// Scale applied to fuzzy similarity to produce a confidence
    pub fuzzy_scale: f32,

    /// Shortest normalized span eligible for containment matching
    pub min_containment_len: usize,

    /// Shortest normalized span eligible for fuzzy matching
    pub min_fuzzy_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            alias_confidence: 0.75,
            fuzzy_threshold: 0.85,
            fuzzy_scale: 0.70,
            min_containment_len: 3,
            min_fuzzy_len: 4,
        }
    }
}

impl ResolverConfig {
    /// Reject configurations that break the cascade's confidence ordering
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alias_confidence)
            || !(0.0..=1.0).contains(&self.fuzzy_threshold)
            || !(0.0..=1.0).contains(&self.fuzzy_scale)
        {
            return Err(ConfigError::InvalidValue {
                key: "resolver".to_string(),
                value: "confidence values must lie in [0, 1]".to_string(),
            });
        }
        if self.alias_confidence >= 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "resolver.alias_confidence".to_string(),
                value: format!("{} (must be below the exact tier's 1.0)", self.alias_confidence),
            });
        }
        if self.fuzzy_scale >= self.alias_confidence {
            return Err(ConfigError::InvalidValue {
                key: "resolver.fuzzy_scale".to_string(),
                value: format!(
                    "{} (must be below alias_confidence {})",
                    self.fuzzy_scale, self.alias_confidence
                ),
            });
        }
        Ok(())
    }
}

/// Mention context window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Bytes of surrounding text kept on each side of a span
    pub window_bytes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { window_bytes: 100 }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Documents processed concurrently (1 = sequential)
    pub max_concurrent_documents: usize,

    /// Per-document wall-clock budget before the document is abandoned
    pub document_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 1,
            document_timeout_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunker.max_chunk_bytes, 500_000);
        assert_eq!(config.context.window_bytes, 100);
        assert_eq!(config.batch.max_concurrent_documents, 1);
    }

    #[test]
    fn test_default_resolver_config_is_valid() {
        assert!(ResolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_resolver_config_rejects_inverted_tiers() {
        let config = ResolverConfig {
            fuzzy_scale: 0.9,
            alias_confidence: 0.75,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolver_config_rejects_alias_at_exact() {
        let config = ResolverConfig {
            alias_confidence: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
