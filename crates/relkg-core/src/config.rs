//! relkg Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::GenerationParams;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Generator service configuration
    pub generator: GeneratorConfig,

    /// Windowing and decoding configuration
    pub extraction: ExtractionConfig,

    /// Entity lookup configuration
    pub resolver: ResolverConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = parse_var("API_PORT", port)?;
        }

        // CORS origins from environment variable (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Generator
        if let Ok(url) = std::env::var("GENERATOR_URL") {
            config.generator.endpoint = url;
        }
        if let Ok(path) = std::env::var("TOKENIZER_PATH") {
            config.generator.tokenizer_path = PathBuf::from(path);
        }

        // Extraction
        if let Ok(length) = std::env::var("WINDOW_LENGTH") {
            config.extraction.window_length = parse_var("WINDOW_LENGTH", length)?;
        }

        // Resolver
        if let Ok(url) = std::env::var("WIKIPEDIA_API_URL") {
            config.resolver.api_url = url;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        config.extraction.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.extraction.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.server.host != defaults.server.host {
            self.server.host = env_config.server.host;
        }
        if env_config.server.port != defaults.server.port {
            self.server.port = env_config.server.port;
        }
        if !env_config.server.cors_origins.is_empty() {
            self.server.cors_origins = env_config.server.cors_origins;
        }
        if env_config.generator.endpoint != defaults.generator.endpoint {
            self.generator.endpoint = env_config.generator.endpoint;
        }
        if env_config.generator.tokenizer_path != defaults.generator.tokenizer_path {
            self.generator.tokenizer_path = env_config.generator.tokenizer_path;
        }
        if env_config.extraction.window_length != defaults.extraction.window_length {
            self.extraction.window_length = env_config.extraction.window_length;
        }
        if env_config.resolver.api_url != defaults.resolver.api_url {
            self.resolver.api_url = env_config.resolver.api_url;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Generator service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the generation service
    pub endpoint: String,

    /// Path to the tokenizer.json matching the model
    pub tokenizer_path: PathBuf,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            tokenizer_path: PathBuf::from("tokenizer.json"),
            timeout_secs: 120,
        }
    }
}

/// Marker tokens emitted by the relation-extraction model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Starts a new head entity
    pub head: String,

    /// Starts a tail entity for the current head
    pub tail: String,

    /// Starts the relation label
    pub relation: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            head: "<triplet>".to_string(),
            tail: "<subj>".to_string(),
            relation: "<obj>".to_string(),
        }
    }
}

/// Windowing and decoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Truncation limit for short text input
    pub short_text_max_tokens: usize,

    /// Maximum generated length for short text
    pub short_text_max_length: usize,

    /// Window length for long text
    pub window_length: usize,

    /// Maximum generated length per window
    pub long_text_max_length: usize,

    /// Beam width
    pub num_beams: usize,

    /// Candidates returned per window
    pub num_return_sequences: usize,

    /// Beam search length penalty
    pub length_penalty: f32,

    /// Marker tokens
    pub markers: MarkerConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            short_text_max_tokens: 512,
            short_text_max_length: 216,
            window_length: 128,
            long_text_max_length: 256,
            num_beams: 3,
            num_return_sequences: 3,
            length_penalty: 0.0,
            markers: MarkerConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_length == 0 {
            return Err(invalid("window_length", self.window_length));
        }
        if self.short_text_max_tokens == 0 {
            return Err(invalid("short_text_max_tokens", self.short_text_max_tokens));
        }
        if self.num_beams == 0 {
            return Err(invalid("num_beams", self.num_beams));
        }
        if self.num_return_sequences == 0 || self.num_return_sequences > self.num_beams {
            return Err(invalid("num_return_sequences", self.num_return_sequences));
        }
        Ok(())
    }

    /// Decoding parameters for short text input
    pub fn short_text_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.short_text_max_length,
            ..self.long_text_params()
        }
    }

    /// Decoding parameters for windowed input
    pub fn long_text_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.long_text_max_length,
            length_penalty: self.length_penalty,
            num_beams: self.num_beams,
            num_return_sequences: self.num_return_sequences,
        }
    }
}

fn invalid(key: &str, value: usize) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Entity lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// MediaWiki API endpoint
    pub api_url: String,

    /// User-Agent sent with lookups
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum memoized lookups
    pub cache_capacity: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!("relkg/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
            cache_capacity: 10_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
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
}

impl From<ConfigError> for crate::RelkgError {
    fn from(err: ConfigError) -> Self {
        crate::RelkgError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.extraction.window_length, 128);
        assert_eq!(config.extraction.markers.head, "<triplet>");
        assert!(config.extraction.validate().is_ok());
    }

    #[test]
    fn test_generation_params_per_mode() {
        let config = ExtractionConfig::default();
        let short = config.short_text_params();
        let long = config.long_text_params();

        assert_eq!(short.max_length, 216);
        assert_eq!(long.max_length, 256);
        assert_eq!(short.num_beams, 3);
        assert_eq!(long.num_return_sequences, 3);
        assert_eq!(long.length_penalty, 0.0);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = ExtractionConfig {
            window_length: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "window_length"
        ));
    }

    #[test]
    fn test_validate_rejects_more_returns_than_beams() {
        let config = ExtractionConfig {
            num_beams: 2,
            num_return_sequences: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [extraction]
            window_length = 64

            [extraction.markers]
            head = "<h>"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.extraction.window_length, 64);
        assert_eq!(config.extraction.num_beams, 3);
        assert_eq!(config.extraction.markers.head, "<h>");
        assert_eq!(config.extraction.markers.tail, "<subj>");
    }
}
