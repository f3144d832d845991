//! Error types for the Extractor

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or rendering the prompt template
///
/// All of these point at a deployment defect, never at the email content,
/// and are never retried.
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template file could not be read
    #[error("Failed to read prompt template '{}': {source}", path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// No heading with this title, or the section under it is empty
    #[error("Section '{0}' not found in prompt template")]
    SectionNotFound(String),

    /// A `{name}` placeholder has no substitution value
    #[error("No value supplied for placeholder '{0}'")]
    PlaceholderMissing(String),

    /// Unbalanced braces in the template text
    #[error("Malformed template: {0}")]
    MalformedTemplate(String),
}

/// Reasons a model response was rejected
///
/// These are retryable: the message text is fed back to the model.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// Response did not contain parseable JSON of the expected shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed but a record failed validation
    #[error("Schema validation failed: {0}")]
    Invalid(String),
}

/// Errors that end an extraction without a result
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Prompt template is missing or malformed
    #[error("Prompt template error: {0}")]
    Template(#[from] PromptError),

    /// Completion provider failed in a way another attempt cannot fix
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
