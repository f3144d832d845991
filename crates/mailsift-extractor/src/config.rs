//! Configuration for the Extractor

use serde::{Deserialize, Serialize};

/// Default character budget for the sanitized email
pub const DEFAULT_MAX_CHARS: usize = 2_000;

/// Default number of completion attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Character budget for the sanitized email sent to the model
    pub max_chars: usize,

    /// Maximum completion attempts before giving up
    pub max_retries: u32,

    /// Template heading holding the parsing instructions (`{email}` placeholder)
    pub instructions_section: String,

    /// Template heading holding the schema description (`{schema}` placeholder)
    pub schema_section: String,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chars == 0 {
            return Err("max_chars must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        if self.instructions_section.trim().is_empty() {
            return Err("instructions_section must not be empty".to_string());
        }
        if self.schema_section.trim().is_empty() {
            return Err("schema_section must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_retries: DEFAULT_MAX_RETRIES,
            instructions_section: "MAIL PARSER".to_string(),
            schema_section: "OUTPUT SCHEMA".to_string(),
        }
    }
}
