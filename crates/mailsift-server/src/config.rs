//! Configuration file parsing for the server.
//!
//! Loads the bind address, prompt template location, extraction settings
//! and completion endpoint from a TOML file.

use mailsift_extractor::ExtractorConfig;
use mailsift_llm::ChatProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A field holds an unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Markdown prompt template
    pub template_path: PathBuf,

    /// Sanitizer budget, retry budget and template section names
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Chat completions endpoint
    pub provider: ChatProviderConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and nested settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("provider.endpoint".to_string()));
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::MissingField("provider.model".to_string()));
        }
        self.extractor.validate().map_err(ConfigError::Invalid)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            template_path: PathBuf::from("prompts/mail_parser.md"),
            extractor: ExtractorConfig::default(),
            provider: ChatProviderConfig::new("http://localhost:11434/v1", "llama3"),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
        bind_address = "0.0.0.0"
        bind_port = 9000
        template_path = "/etc/mailsift/mail_parser.md"

        [extractor]
        max_chars = 4000
        max_retries = 5

        [provider]
        endpoint = "https://inference.example/v1"
        model = "cohere.command-r-plus"
        api_key = "secret"
        timeout_secs = 30

        [provider.extra_headers]
        "x-compartment-id" = "ocid1.compartment.oc1..example"
    "#;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 8000);
        assert_eq!(config.extractor, ExtractorConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_parse_toml() {
        let config: ServerConfig = toml::from_str(FULL).unwrap();
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.extractor.max_chars, 4000);
        assert_eq!(config.extractor.max_retries, 5);
        assert_eq!(config.extractor.instructions_section, "MAIL PARSER");
        assert_eq!(config.provider.model, "cohere.command-r-plus");
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(
            config.provider.extra_headers.get("x-compartment-id").unwrap(),
            "ocid1.compartment.oc1..example"
        );
    }

    #[test]
    fn test_extractor_table_is_optional() {
        let toml_str = r#"
            bind_address = "127.0.0.1"
            bind_port = 8000
            template_path = "prompts/mail_parser.md"

            [provider]
            endpoint = "http://localhost:11434/v1"
            model = "llama3"
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.extractor, ExtractorConfig::default());
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_from_file_rejects_empty_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.replace("cohere.command-r-plus", "").as_bytes())
            .unwrap();

        let result = ServerConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::MissingField(field)) if field == "provider.model"));
    }

    #[test]
    fn test_from_file_rejects_zero_retries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.replace("max_retries = 5", "max_retries = 0").as_bytes())
            .unwrap();

        let result = ServerConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ServerConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
